//! Todo items and their storage.
//!
//! Handlers talk to a [`TodoRepository`]; the MongoDB implementation lives in
//! [`mongo`]. Ids are opaque strings at this layer and validated by the
//! repository.

pub mod mongo;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use mongo::MongoTodoRepository;

/// A stored todo item as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub completed: bool,
}

/// Request body for creating a todo
#[derive(Debug, Clone, Deserialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// Request body for updating a todo; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoUpdate {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl TodoUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }
}

/// Storage for todo items.
///
/// `get`, `update` and `delete` return `None`/`false` for a well-formed id that
/// matches nothing, and `AppError::InvalidTodoId` for a malformed one.
#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn list(&self) -> Result<Vec<Todo>, AppError>;

    async fn create(&self, todo: NewTodo) -> Result<Todo, AppError>;

    async fn get(&self, id: &str) -> Result<Option<Todo>, AppError>;

    async fn update(&self, id: &str, update: TodoUpdate) -> Result<Option<Todo>, AppError>;

    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}
