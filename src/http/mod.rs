//! HTTP server startup and shutdown.
//!
//! Binding is fail-fast: if the listening socket cannot be bound the error is
//! returned to `main` and the process exits. The server drains in-flight
//! requests on SIGTERM/SIGINT.

mod server;
mod shutdown;

pub use server::{bind, serve, start_server, ServerError};
pub use shutdown::shutdown_signal;
