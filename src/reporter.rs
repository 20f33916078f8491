// ABOUTME: Defines the ActivityReporter trait for pinging the remote service.
// ABOUTME: Includes a closure adapter for hosts that already have an RPC call.

use std::future::Future;

use async_trait::async_trait;

/// Tells the remote workspace-lifecycle service that the workspace is in use.
///
/// Implementations must be safe to call repeatedly. Errors should carry a
/// human-readable message; they are logged and drive the retry loop.
#[async_trait]
pub trait ActivityReporter: Send + Sync {
    /// Report activity once.
    async fn report_activity(&self) -> Result<(), anyhow::Error>;
}

/// An [`ActivityReporter`] backed by an async closure.
pub struct FnReporter<F> {
    f: F,
}

impl<F, Fut> FnReporter<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), anyhow::Error>> + Send,
{
    /// Wrap a closure returning a report future.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> ActivityReporter for FnReporter<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), anyhow::Error>> + Send,
{
    async fn report_activity(&self) -> Result<(), anyhow::Error> {
        (self.f)().await
    }
}
