//! Database connection lifecycle.
//!
//! The connection state lives in a [`ConnectionStatus`] cell that is written by
//! the [`ConnectionManager`] (connect attempts, retries, shutdown) and by
//! driver notifications routed through a [`ConnectionTracker`]. Everything else
//! only reads it.
//!
//! Drivers plug in through the [`DatabaseDriver`] trait; the MongoDB
//! implementation lives in [`mongo`].

mod manager;
pub mod mongo;
mod observer;

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

pub use manager::{
    Backoff, ConnectOutcome, ConnectionHandle, ConnectionManager, ConnectionTracker, RetryPolicy,
};
pub use observer::{ConnectionEvent, ConnectionObserver, TracingObserver};

/// Lifecycle stage of the logical database connection.
///
/// Discriminants are the ready-state codes reported by MongoDB drivers and
/// exposed verbatim by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connected = 1,
    Connecting = 2,
    Disconnecting = 3,
}

impl ConnectionState {
    /// Raw driver ready-state code
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Disconnecting => "disconnecting",
        };
        f.write_str(name)
    }
}

/// A ready-state code that does not map to any [`ConnectionState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown connection state code {0}")]
pub struct UnknownState(pub u8);

impl TryFrom<u8> for ConnectionState {
    type Error = UnknownState;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ConnectionState::Disconnected),
            1 => Ok(ConnectionState::Connected),
            2 => Ok(ConnectionState::Connecting),
            3 => Ok(ConnectionState::Disconnecting),
            other => Err(UnknownState(other)),
        }
    }
}

/// Shared, lock-free holder of the current [`ConnectionState`].
///
/// Cloning yields another handle to the same cell.
#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    code: Arc<AtomicU8>,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionStatus {
    /// Creates a cell in the `Disconnected` state
    pub fn new() -> Self {
        Self {
            code: Arc::new(AtomicU8::new(ConnectionState::Disconnected.code())),
        }
    }

    /// Last published state. Never fails; an unrecognized code reads as
    /// `Disconnected`.
    pub fn get(&self) -> ConnectionState {
        self.probe().unwrap_or(ConnectionState::Disconnected)
    }

    /// Reads the raw cell, reporting codes that do not decode
    pub fn probe(&self) -> Result<ConnectionState, UnknownState> {
        ConnectionState::try_from(self.code.load(Ordering::Acquire))
    }

    /// Publishes a new state, returning the previous one
    pub fn set(&self, state: ConnectionState) -> ConnectionState {
        let previous = self.code.swap(state.code(), Ordering::AcqRel);
        ConnectionState::try_from(previous).unwrap_or(ConnectionState::Disconnected)
    }

    /// Publishes `to` only if the cell currently holds `from`. Returns whether
    /// the state changed.
    pub fn transition(&self, from: ConnectionState, to: ConnectionState) -> bool {
        self.code
            .compare_exchange(from.code(), to.code(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[cfg(test)]
    pub(crate) fn set_raw(&self, code: u8) {
        self.code.store(code, Ordering::Release);
    }
}

/// Asynchronous notifications raised by a driver independently of connect
/// attempts.
///
/// They move the state only between `Disconnected` and `Connected`; an
/// attempt in flight (`Connecting`) or a shutdown (`Disconnecting`) is never
/// overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    Connected,
    Error(String),
    Disconnected,
}

/// Connection attempt failure
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("{0}")]
    Unavailable(String),
}

/// A database driver the connection manager can drive.
#[async_trait]
pub trait DatabaseDriver: Send + Sync + 'static {
    /// Attempts to reach the database, resolving once it answers or the
    /// driver's own timeout expires.
    async fn connect(&self) -> Result<(), DriverError>;

    /// Releases the driver's resources
    async fn close(&self);
}
