//! Root endpoint listing the API's capabilities.

use axum::Json;
use serde::Serialize;

/// Static description of the API served at `/`
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Manifest {
    pub message: &'static str,
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    pub get_todos: &'static str,
    pub create_todo: &'static str,
    pub get_todo: &'static str,
    pub update_todo: &'static str,
    pub delete_todo: &'static str,
    pub health: &'static str,
}

pub const MANIFEST: Manifest = Manifest {
    message: "Todo API is running",
    endpoints: Endpoints {
        get_todos: "GET /todos",
        create_todo: "POST /todos",
        get_todo: "GET /todos/:id",
        update_todo: "PUT /todos/:id",
        delete_todo: "DELETE /todos/:id",
        health: "GET /health",
    },
};

pub async fn index() -> Json<Manifest> {
    Json(MANIFEST)
}
