//! Todo API - a minimal REST API for todo items backed by MongoDB.
//!
//! The HTTP server starts immediately while a background task connects to the
//! database, retrying on failure. `/health` reports the live connection state.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod todos;

pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
