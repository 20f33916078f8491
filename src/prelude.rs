// ABOUTME: Prelude module - convenient imports for common use cases.
// ABOUTME: Use `use keepalive::prelude::*;` to get started quickly.

pub use crate::config::{IdleTimeout, KeepaliveConfig};
pub use crate::coordinator::{CoordinatorSnapshot, CoordinatorStats, KeepaliveCoordinator};
pub use crate::duration::format_idle_duration;
pub use crate::error::{ConfigError, KeepaliveError, NotifyError, ReportError};
pub use crate::notifier::{Notifier, TracingNotifier, WarningResponse};
pub use crate::reporter::{ActivityReporter, FnReporter};
