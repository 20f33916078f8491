// ABOUTME: Activity keep-alive coordinator for a remote idle-eviction timer.
// ABOUTME: Coalesces bursty activity signals into periodic reports with bounded retry.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::KeepaliveConfig;
use crate::duration::format_idle_duration;
use crate::error::{NotifyError, ReportError};
use crate::notifier::{Notifier, WarningResponse};
use crate::reporter::ActivityReporter;

/// Label of the action offered with a failure warning.
pub const VIEW_LOGS_ACTION: &str = "View Logs";

const WARNING_BASE: &str =
    "Failed to report workspace activity. The workspace may be stopped for inactivity";

/// Build the failure warning, appending the idle timeout when one is known.
pub fn warning_message(idle_timeout_secs: Option<u64>) -> String {
    match idle_timeout_secs {
        Some(secs) if secs > 0 => {
            format!("{} after {}.", WARNING_BASE, format_idle_duration(secs))
        }
        _ => format!("{}.", WARNING_BASE),
    }
}

/// Mutable state for the coordinator, protected by a single mutex.
#[derive(Debug, Default)]
struct CoordinatorState {
    timer_armed: bool,
    pending_signal: bool,
    notifying: bool,
    stopped: bool,
}

/// Point-in-time view of the coordinator's flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorSnapshot {
    /// A coalescing window is open.
    pub timer_armed: bool,
    /// Activity arrived after the current window's report was sent.
    pub pending_signal: bool,
    /// A failure warning is currently shown.
    pub notifying: bool,
    /// `stop()` has been called.
    pub stopped: bool,
}

/// Monotonic counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Activity signals accepted.
    pub signals: u64,
    /// Windows opened, each with its own report episode.
    pub windows_opened: u64,
    /// Calls made to the reporter.
    pub attempts: u64,
    /// Episodes that ended in a successful report.
    pub successes: u64,
    /// Episodes that ran out of retries.
    pub exhausted_episodes: u64,
    /// Failure warnings actually shown.
    pub notifications_shown: u64,
}

#[derive(Default)]
struct Counters {
    signals: AtomicU64,
    windows_opened: AtomicU64,
    attempts: AtomicU64,
    successes: AtomicU64,
    exhausted_episodes: AtomicU64,
    notifications_shown: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CoordinatorStats {
        CoordinatorStats {
            signals: self.signals.load(Ordering::Relaxed),
            windows_opened: self.windows_opened.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            exhausted_episodes: self.exhausted_episodes.load(Ordering::Relaxed),
            notifications_shown: self.notifications_shown.load(Ordering::Relaxed),
        }
    }
}

struct Inner {
    config: KeepaliveConfig,
    reporter: Arc<dyn ActivityReporter>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<CoordinatorState>,
    counters: Counters,
    shutdown: watch::Sender<bool>,
}

/// Keeps a remote workspace alive while the user is active.
///
/// Activity signals are coalesced into at most one report per window:
///
/// - **Idle:** the first signal sends a report immediately and opens a window
///   of `coalesce_period`.
/// - **Window open:** further signals only mark activity as pending.
/// - **Window close:** pending activity sends one more report and reopens the
///   window; otherwise the coordinator goes idle.
///
/// A failing report is retried `max_retries` times, `retry_delay` apart. When
/// an episode runs out of retries the user is warned once; overlapping
/// exhausted episodes are suppressed until that warning is answered.
///
/// Report episodes from consecutive windows are not serialized. An episode
/// still retrying when the next window opens keeps running alongside the new
/// one.
///
/// The coordinator is cheap to clone. `signal_activity` spawns Tokio tasks
/// and must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct KeepaliveCoordinator {
    inner: Arc<Inner>,
}

impl KeepaliveCoordinator {
    /// Create an idle coordinator.
    pub fn new(
        config: KeepaliveConfig,
        reporter: Arc<dyn ActivityReporter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        debug!(?config, "KeepaliveCoordinator::new");
        Self {
            inner: Arc::new(Inner {
                config,
                reporter,
                notifier,
                state: Mutex::new(CoordinatorState::default()),
                counters: Counters::default(),
                shutdown,
            }),
        }
    }

    /// Record that the workspace is in use.
    ///
    /// Never blocks and never fails. Opens a window (and sends a report) when
    /// idle, otherwise marks activity as pending for the open window.
    pub fn signal_activity(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.stopped {
                debug!("activity signal ignored, coordinator stopped");
                return;
            }
            Counters::bump(&self.inner.counters.signals);
            if state.timer_armed {
                state.pending_signal = true;
                return;
            }
            state.timer_armed = true;
            state.pending_signal = false;
        }

        self.inner.start_episode();
        let inner = Arc::clone(&self.inner);
        self.inner.spawn_until_stopped(inner.run_window_timer());
    }

    /// Cancel the window timer, in-flight episodes and any open warning.
    ///
    /// Later signals are ignored. Calling `stop` again has no effect.
    pub fn stop(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.stopped {
                return;
            }
            *state = CoordinatorState {
                stopped: true,
                ..CoordinatorState::default()
            };
        }
        self.inner.shutdown.send_replace(true);
        info!("keep-alive coordinator stopped");
    }

    /// Current state flags.
    pub fn snapshot(&self) -> CoordinatorSnapshot {
        let state = self.inner.state.lock();
        CoordinatorSnapshot {
            timer_armed: state.timer_armed,
            pending_signal: state.pending_signal,
            notifying: state.notifying,
            stopped: state.stopped,
        }
    }

    /// Counters since construction.
    pub fn stats(&self) -> CoordinatorStats {
        self.inner.counters.snapshot()
    }

    /// The configuration this coordinator runs with.
    pub fn config(&self) -> &KeepaliveConfig {
        &self.inner.config
    }
}

impl Inner {
    /// Run `task` in the background until it finishes or `stop()` is called.
    fn spawn_until_stopped<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut shutdown = self.shutdown.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = shutdown.wait_for(|stopped| *stopped) => {}
                () = task => {}
            }
        });
    }

    /// Send one report episode in the background. Nothing waits on it.
    fn start_episode(self: &Arc<Self>) {
        Counters::bump(&self.counters.windows_opened);
        debug!("coalescing window opened");
        let inner = Arc::clone(self);
        self.spawn_until_stopped(async move { inner.run_episode().await });
    }

    /// Close windows as they expire, reopening while activity is pending.
    async fn run_window_timer(self: Arc<Self>) {
        loop {
            tokio::time::sleep(self.config.coalesce_period).await;

            let reopen = {
                let mut state = self.state.lock();
                if state.stopped {
                    return;
                }
                state.timer_armed = false;
                if state.pending_signal {
                    state.pending_signal = false;
                    state.timer_armed = true;
                }
                state.timer_armed
            };

            if !reopen {
                debug!("coalescing window closed, going idle");
                return;
            }
            debug!("coalescing window closed with pending activity");
            self.start_episode();
        }
    }

    async fn run_episode(self: Arc<Self>) {
        let Err(e) = self.send_with_retry().await else {
            return;
        };

        Counters::bump(&self.counters.exhausted_episodes);
        warn!(error = %e, "activity reporting exhausted");
        self.notifier.log(&e.to_string());
        self.notify_failure().await;
    }

    /// Report activity, retrying up to `max_retries` times.
    async fn send_with_retry(&self) -> Result<(), ReportError> {
        let mut attempts_left = self.config.max_retries;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            Counters::bump(&self.counters.attempts);

            match self.reporter.report_activity().await {
                Ok(()) => {
                    Counters::bump(&self.counters.successes);
                    debug!(attempt, "activity reported");
                    self.notifier.log("Reported workspace activity");
                    return Ok(());
                }
                Err(e) if attempts_left > 0 => {
                    warn!(attempt, attempts_left, error = %e, "activity report failed, retrying");
                    self.notifier.log(&format!(
                        "Failed to report workspace activity: {:#}. Retrying in {:?} ({} retries left)",
                        e, self.config.retry_delay, attempts_left
                    ));
                    attempts_left -= 1;
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => {
                    return Err(ReportError::Exhausted {
                        attempts: attempt,
                        message: format!("{:#}", e),
                    });
                }
            }
        }
    }

    async fn notify_failure(&self) {
        let Some(_guard) = NotifyingGuard::acquire(&self.state) else {
            debug!("failure warning already shown, suppressing");
            return;
        };

        Counters::bump(&self.counters.notifications_shown);
        if let Err(e) = self.show_warning().await {
            warn!(error = %e, "failure warning not delivered");
            self.notifier.log(&e.to_string());
        }
    }

    async fn show_warning(&self) -> Result<(), NotifyError> {
        let message = warning_message(self.config.idle_timeout.resolve());
        let response = self
            .notifier
            .warn(&message, VIEW_LOGS_ACTION)
            .await
            .map_err(NotifyError::Warn)?;

        if response == WarningResponse::ActionChosen {
            self.notifier
                .reveal_logs()
                .await
                .map_err(NotifyError::RevealLogs)?;
        }
        Ok(())
    }
}

/// Holds the `notifying` flag; clears it on drop, including on cancellation.
struct NotifyingGuard<'a> {
    state: &'a Mutex<CoordinatorState>,
}

impl<'a> NotifyingGuard<'a> {
    fn acquire(state: &'a Mutex<CoordinatorState>) -> Option<Self> {
        let mut guard = state.lock();
        if guard.notifying {
            return None;
        }
        guard.notifying = true;
        Some(Self { state })
    }
}

impl Drop for NotifyingGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().notifying = false;
    }
}
