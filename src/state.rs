//! Shared application state for request handlers.

use std::sync::Arc;

use crate::db::ConnectionStatus;
use crate::todos::TodoRepository;

/// Shared application state, cloneable across handlers.
///
/// Holds the todo repository used by the `/todos` routes and a read-only view
/// of the database connection state used by the health check.
#[derive(Clone)]
pub struct AppState {
    pub todos: Arc<dyn TodoRepository>,
    pub connection: ConnectionStatus,
}

impl AppState {
    pub fn new(todos: Arc<dyn TodoRepository>, connection: ConnectionStatus) -> Self {
        Self { todos, connection }
    }
}
