//! Connection manager: connect, retry on failure, track driver notifications.
//!
//! A failed attempt is never reported to a caller. The manager logs it through
//! its observer, publishes `Disconnected`, sleeps for the policy delay and
//! tries again until it connects or the policy's attempt limit is reached.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::observer::{ConnectionEvent, ConnectionObserver};
use super::{ConnectionState, ConnectionStatus, DatabaseDriver, DriverEvent};
use crate::config::DEFAULT_RETRY_DELAY_MS;

/// How the delay grows between consecutive failed attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay every time
    Fixed,
    /// Delay multiplied by `factor` after each failure, capped at `max_delay`
    Exponential { factor: u32, max_delay: Duration },
}

/// When and how often to retry a failed connect attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay after the first failure
    pub delay: Duration,
    /// Total attempts allowed, `None` for unlimited
    pub max_attempts: Option<u32>,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_millis(DEFAULT_RETRY_DELAY_MS))
    }
}

impl RetryPolicy {
    /// Fixed delay, retry forever
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
            backoff: Backoff::Fixed,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Whether another attempt may follow `attempts` failed ones
    pub fn allows_retry(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts < max)
    }

    /// Delay to wait after the `failures`-th consecutive failure (1-based)
    pub fn delay_after(&self, failures: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { factor, max_delay } => {
                let multiplier = factor.saturating_pow(failures.saturating_sub(1));
                self.delay.saturating_mul(multiplier).min(max_delay)
            }
        }
    }
}

/// Applies driver notifications to the shared connection state.
///
/// Handed to drivers so their callbacks can publish state changes without a
/// reference back to the manager.
#[derive(Clone)]
pub struct ConnectionTracker {
    status: ConnectionStatus,
    observer: Arc<dyn ConnectionObserver>,
}

impl ConnectionTracker {
    pub fn new(status: ConnectionStatus, observer: Arc<dyn ConnectionObserver>) -> Self {
        Self { status, observer }
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    /// Handles one driver notification.
    ///
    /// Connect/disconnect only apply as `Disconnected` <-> `Connected`
    /// transitions and are reported when they happen. Errors never change
    /// state; they are reported while connected and only traced otherwise, so
    /// a failing server during an attempt does not flood the log.
    pub fn apply(&self, event: DriverEvent) {
        match event {
            DriverEvent::Connected => {
                if self
                    .status
                    .transition(ConnectionState::Disconnected, ConnectionState::Connected)
                {
                    self.notify(ConnectionEvent::DriverConnected);
                }
            }
            DriverEvent::Error(message) => {
                if self.status.get().is_connected() {
                    self.notify(ConnectionEvent::DriverError { message });
                } else {
                    tracing::debug!(error = %message, "Driver error while not connected");
                }
            }
            DriverEvent::Disconnected => {
                if self
                    .status
                    .transition(ConnectionState::Connected, ConnectionState::Disconnected)
                {
                    self.notify(ConnectionEvent::DriverDisconnected);
                }
            }
        }
    }

    fn publish(&self, state: ConnectionState) {
        self.status.set(state);
    }

    fn notify(&self, event: ConnectionEvent) {
        self.observer.on_event(&event);
    }
}

/// Result of a connect loop that ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected { attempts: u32 },
    GaveUp { attempts: u32 },
}

/// Owns the connect/retry loop for one logical database connection
pub struct ConnectionManager {
    tracker: ConnectionTracker,
    policy: RetryPolicy,
}

impl ConnectionManager {
    /// Creates a manager with a fresh `Disconnected` state cell
    pub fn new(policy: RetryPolicy, observer: Arc<dyn ConnectionObserver>) -> Self {
        Self {
            tracker: ConnectionTracker::new(ConnectionStatus::new(), observer),
            policy,
        }
    }

    /// Tracker to hand to the driver for its asynchronous notifications
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Read-only handle to the state cell
    pub fn status(&self) -> ConnectionStatus {
        self.tracker.status.clone()
    }

    pub fn current_state(&self) -> ConnectionState {
        self.tracker.status.get()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs the connect loop until it connects or the policy gives up.
    pub async fn connect(&self, driver: &dyn DatabaseDriver) -> ConnectOutcome {
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            self.tracker.publish(ConnectionState::Connecting);
            self.tracker
                .notify(ConnectionEvent::AttemptStarted { attempt });

            match driver.connect().await {
                Ok(()) => {
                    self.tracker.publish(ConnectionState::Connected);
                    self.tracker
                        .notify(ConnectionEvent::AttemptSucceeded { attempt });
                    return ConnectOutcome::Connected { attempts: attempt };
                }
                Err(e) => {
                    self.tracker.publish(ConnectionState::Disconnected);

                    if !self.policy.allows_retry(attempt) {
                        self.tracker.notify(ConnectionEvent::GaveUp {
                            attempts: attempt,
                            reason: e.to_string(),
                        });
                        return ConnectOutcome::GaveUp { attempts: attempt };
                    }

                    let retry_in = self.policy.delay_after(attempt);
                    self.tracker.notify(ConnectionEvent::AttemptFailed {
                        attempt,
                        reason: e.to_string(),
                        retry_in,
                    });
                    tokio::time::sleep(retry_in).await;
                }
            }
        }
    }

    /// Spawns the connect loop in the background and returns immediately.
    pub fn start(self, driver: Arc<dyn DatabaseDriver>) -> ConnectionHandle {
        let manager = Arc::new(self);
        let task = {
            let manager = Arc::clone(&manager);
            let driver = Arc::clone(&driver);
            tokio::spawn(async move {
                let outcome = manager.connect(driver.as_ref()).await;
                tracing::debug!(?outcome, "Connect loop finished");
            })
        };

        ConnectionHandle {
            manager,
            driver,
            task,
        }
    }
}

/// A running connect loop and the driver it drives
pub struct ConnectionHandle {
    manager: Arc<ConnectionManager>,
    driver: Arc<dyn DatabaseDriver>,
    task: JoinHandle<()>,
}

impl ConnectionHandle {
    pub fn status(&self) -> ConnectionStatus {
        self.manager.status()
    }

    pub fn current_state(&self) -> ConnectionState {
        self.manager.current_state()
    }

    /// Whether the connect loop has stopped (connected or gave up)
    pub fn is_settled(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels any pending attempt or retry and closes the driver.
    pub async fn shutdown(self) {
        self.task.abort();
        let _ = self.task.await;

        let tracker = &self.manager.tracker;
        tracker.publish(ConnectionState::Disconnecting);
        self.driver.close().await;
        tracker.publish(ConnectionState::Disconnected);
        tracker.notify(ConnectionEvent::Closed);
    }
}
