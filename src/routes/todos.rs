//! Handlers for the `/todos` CRUD API.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;
use crate::todos::{NewTodo, Todo, TodoUpdate};

/// Body returned after a successful delete
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: &'static str,
}

/// Routes mounted under `/todos`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(remove))
}

/// List all todos
#[instrument(name = "todos.list", skip_all)]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, AppError> {
    let todos = state.todos.list().await?;
    tracing::debug!(count = todos.len(), "Listed todos");
    Ok(Json(todos))
}

/// Create a todo
#[instrument(name = "todos.create", skip_all)]
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewTodo>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let Json(new_todo) = payload?;
    let todo = state.todos.create(new_todo).await?;
    tracing::info!(id = %todo.id, "Todo created");
    Ok((StatusCode::CREATED, Json(todo)))
}

/// Fetch one todo
#[instrument(name = "todos.show", skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, AppError> {
    state
        .todos
        .get(&id)
        .await?
        .map(Json)
        .ok_or(AppError::TodoNotFound(id))
}

/// Update the fields present in the body
#[instrument(name = "todos.update", skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TodoUpdate>, JsonRejection>,
) -> Result<Json<Todo>, AppError> {
    let Json(changes) = payload?;
    state
        .todos
        .update(&id, changes)
        .await?
        .map(Json)
        .ok_or(AppError::TodoNotFound(id))
}

/// Delete one todo
#[instrument(name = "todos.delete", skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, AppError> {
    if state.todos.delete(&id).await? {
        tracing::info!(%id, "Todo deleted");
        Ok(Json(Deleted {
            message: "Todo deleted",
        }))
    } else {
        Err(AppError::TodoNotFound(id))
    }
}
