//! HTTP route handlers.
//!
//! `/` serves a static endpoint manifest, `/health` reports the database
//! connection state and `/todos` is the todo CRUD API. Every route gets
//! permissive CORS and runs inside a request span with a unique request ID.
//! `/todos` is served whatever the connection state; a database outage shows
//! up there as a 503 from the failing operation.

pub mod health;
pub mod home;
pub mod todos;

use axum::{extract::OriginalUri, middleware, routing::get, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::CACHE_CONTROL_HEALTH;
use crate::error::AppError;
use crate::middleware::request_id_layer;
use crate::state::AppState;

/// Creates the Axum router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Health check - never cached, probes must see live state
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_HEALTH),
        ));

    Router::new()
        .route("/", get(home::index))
        .merge(health_routes)
        .nest("/todos", todos::router())
        .fallback(not_found)
        .with_state(state)
        .layer(CorsLayer::permissive())
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}

async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::RouteNotFound(uri.path().to_string())
}
