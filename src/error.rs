// ABOUTME: Defines all error types for the keepalive library using thiserror.
// ABOUTME: Each concern has its own error enum, unified under KeepaliveError.

/// Top-level error type for the keepalive library.
#[derive(Debug, thiserror::Error)]
pub enum KeepaliveError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),
}

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Coalesce period must be greater than zero")]
    ZeroCoalescePeriod,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from reporting activity to the remote service.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Activity report failed after {attempts} attempts: {message}")]
    Exhausted { attempts: u32, message: String },
}

/// Errors from the user-facing notifier.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Warning could not be shown: {0}")]
    Warn(#[source] anyhow::Error),

    #[error("Logs could not be revealed: {0}")]
    RevealLogs(#[source] anyhow::Error),
}
