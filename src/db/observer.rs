//! Connection lifecycle events and their observers.

use std::time::Duration;

/// Something that happened to the database connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A connect attempt is starting
    AttemptStarted { attempt: u32 },
    /// A connect attempt succeeded
    AttemptSucceeded { attempt: u32 },
    /// A connect attempt failed; the next one fires after `retry_in`
    AttemptFailed {
        attempt: u32,
        reason: String,
        retry_in: Duration,
    },
    /// The retry policy's attempt limit was reached
    GaveUp { attempts: u32, reason: String },
    /// The driver reported that it is connected
    DriverConnected,
    /// The driver reported a runtime error
    DriverError { message: String },
    /// The driver reported that it lost the connection
    DriverDisconnected,
    /// The connection was closed on shutdown
    Closed,
}

/// Receives connection lifecycle events.
///
/// Called synchronously from the connect task and from driver callbacks, so
/// implementations must not block.
pub trait ConnectionObserver: Send + Sync + 'static {
    fn on_event(&self, event: &ConnectionEvent);
}

/// Logs every event through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ConnectionObserver for TracingObserver {
    fn on_event(&self, event: &ConnectionEvent) {
        match event {
            ConnectionEvent::AttemptStarted { attempt } => {
                tracing::debug!(attempt, "Connecting to MongoDB");
            }
            ConnectionEvent::AttemptSucceeded { attempt } => {
                tracing::info!(attempt, "MongoDB connected successfully");
            }
            ConnectionEvent::AttemptFailed {
                attempt,
                reason,
                retry_in,
            } => {
                tracing::error!(attempt, error = %reason, "MongoDB connection error");
                tracing::info!(
                    retry_in_ms = retry_in.as_millis() as u64,
                    "Retrying connection"
                );
            }
            ConnectionEvent::GaveUp { attempts, reason } => {
                tracing::error!(attempts, error = %reason, "Giving up on MongoDB connection");
            }
            ConnectionEvent::DriverConnected => {
                tracing::info!("Driver connected to database");
            }
            ConnectionEvent::DriverError { message } => {
                tracing::warn!(error = %message, "Driver connection error");
            }
            ConnectionEvent::DriverDisconnected => {
                tracing::warn!("Driver disconnected from database");
            }
            ConnectionEvent::Closed => {
                tracing::info!("Database connection closed");
            }
        }
    }
}
