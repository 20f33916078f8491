// ABOUTME: Coordinator module for keeping a remote workspace alive.
// ABOUTME: Contains the coalescing keep-alive coordinator and its state views.

mod coordinator;

pub use coordinator::{
    CoordinatorSnapshot, CoordinatorStats, KeepaliveCoordinator, VIEW_LOGS_ACTION,
    warning_message,
};
