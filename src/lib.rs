// ABOUTME: Root module for keepalive - workspace activity keep-alive library.
// ABOUTME: Re-exports all public types from submodules.

pub mod config;
pub mod coordinator;
pub mod duration;
pub mod error;
pub mod notifier;
pub mod prelude;
pub mod reporter;

pub use error::KeepaliveError;
