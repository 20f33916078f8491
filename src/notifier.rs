// ABOUTME: Defines the Notifier trait for user-facing warnings and the log trail.
// ABOUTME: Includes TracingNotifier, a headless implementation backed by tracing.

use async_trait::async_trait;

/// The user's answer to a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningResponse {
    /// The user picked the offered action.
    ActionChosen,
    /// The warning was closed or ignored.
    Dismissed,
}

/// The UI surface the coordinator talks to.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Show a warning with one optional action and wait for the user.
    async fn warn(
        &self,
        message: &str,
        action_label: &str,
    ) -> Result<WarningResponse, anyhow::Error>;

    /// Bring the log surface into view.
    async fn reveal_logs(&self) -> Result<(), anyhow::Error>;

    /// Append a line to the diagnostic trail.
    fn log(&self, line: &str);
}

/// A notifier with no UI: warnings and log lines go to `tracing`.
///
/// Every warning is treated as dismissed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn warn(
        &self,
        message: &str,
        action_label: &str,
    ) -> Result<WarningResponse, anyhow::Error> {
        tracing::warn!(action = action_label, "{}", message);
        Ok(WarningResponse::Dismissed)
    }

    async fn reveal_logs(&self) -> Result<(), anyhow::Error> {
        tracing::info!("log surface requested");
        Ok(())
    }

    fn log(&self, line: &str) {
        tracing::info!("{}", line);
    }
}
