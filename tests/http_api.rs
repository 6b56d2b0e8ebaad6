//! End-to-end tests against the real router served on an ephemeral port.
//!
//! The database is replaced by a driver whose reachability the test flips, so
//! the connection lifecycle can be observed through `/health` without MongoDB.
//!
//! Run with: cargo test --test http_api

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::oneshot;

use todo_api::db::{
    ConnectionManager, ConnectionStatus, DatabaseDriver, DriverError, RetryPolicy, TracingObserver,
};
use todo_api::http::{bind, serve};
use todo_api::todos::{NewTodo, Todo, TodoRepository, TodoUpdate};
use todo_api::{create_router, AppError, AppState};

const MANIFEST: &str = r#"{"message":"Todo API is running","endpoints":{"getTodos":"GET /todos","createTodo":"POST /todos","getTodo":"GET /todos/:id","updateTodo":"PUT /todos/:id","deleteTodo":"DELETE /todos/:id","health":"GET /health"}}"#;

/// Repository with nothing in it; these tests never reach the database
struct EmptyRepository;

#[async_trait]
impl TodoRepository for EmptyRepository {
    async fn list(&self) -> Result<Vec<Todo>, AppError> {
        Ok(Vec::new())
    }

    async fn create(&self, todo: NewTodo) -> Result<Todo, AppError> {
        Ok(Todo {
            id: "1".to_string(),
            title: todo.title,
            completed: todo.completed,
        })
    }

    async fn get(&self, _id: &str) -> Result<Option<Todo>, AppError> {
        Ok(None)
    }

    async fn update(&self, _id: &str, _update: TodoUpdate) -> Result<Option<Todo>, AppError> {
        Ok(None)
    }

    async fn delete(&self, _id: &str) -> Result<bool, AppError> {
        Ok(false)
    }
}

/// Driver that fails until the test marks the database reachable
#[derive(Default)]
struct SwitchableDriver {
    reachable: AtomicBool,
    attempts: AtomicUsize,
}

#[async_trait]
impl DatabaseDriver for SwitchableDriver {
    async fn connect(&self) -> Result<(), DriverError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DriverError::Unavailable("server selection timed out".to_string()))
        }
    }

    async fn close(&self) {}
}

/// Running server; dropping it stops the server
struct TestServer {
    base_url: String,
    _stop: oneshot::Sender<()>,
}

async fn spawn_server(connection: ConnectionStatus) -> TestServer {
    let state = AppState::new(Arc::new(EmptyRepository), connection);
    let app = create_router(state);

    let listener = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let signal = async {
            let _ = stopped.await;
        };
        serve(listener, app, signal).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        _stop: stop,
    }
}

async fn get_json(url: &str) -> (reqwest::StatusCode, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_health_recovers_after_database_becomes_reachable() {
    let retry_delay = Duration::from_millis(200);
    let manager = ConnectionManager::new(RetryPolicy::fixed(retry_delay), Arc::new(TracingObserver));
    let server = spawn_server(manager.status()).await;

    let driver = Arc::new(SwitchableDriver::default());
    let connection = manager.start(driver.clone());
    let health_url = format!("{}/health", server.base_url);

    let (status, body) = get_json(&health_url).await;
    assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["database"], "disconnected");

    driver.reachable.store(true, Ordering::SeqCst);
    tokio::time::sleep(retry_delay * 3).await;

    let (status, body) = get_json(&health_url).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["mongodbState"], 1);
    assert!(driver.attempts.load(Ordering::SeqCst) >= 2);

    connection.shutdown().await;

    let (status, body) = get_json(&health_url).await;
    assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["mongodbState"], 0);
}

#[tokio::test]
async fn test_health_timestamps_are_current_and_monotonic() {
    let server = spawn_server(ConnectionStatus::new()).await;
    let health_url = format!("{}/health", server.base_url);

    let mut previous: Option<DateTime<Utc>> = None;
    for _ in 0..3 {
        let (_, body) = get_json(&health_url).await;
        let timestamp = DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap())
            .unwrap()
            .with_timezone(&Utc);

        assert!((Utc::now() - timestamp).num_seconds().abs() < 5);
        if let Some(previous) = previous {
            assert!(timestamp >= previous);
        }
        previous = Some(timestamp);
    }
}

#[tokio::test]
async fn test_health_is_not_cacheable() {
    let server = spawn_server(ConnectionStatus::new()).await;

    let response = reqwest::get(format!("{}/health", server.base_url))
        .await
        .unwrap();

    assert_eq!(response.headers()["cache-control"], "no-store");
}

#[tokio::test]
async fn test_root_manifest_is_fixed_regardless_of_database_state() {
    let connection = ConnectionStatus::new();
    let server = spawn_server(connection.clone()).await;

    let first = reqwest::get(&server.base_url).await.unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::OK);
    let first = first.text().await.unwrap();

    connection.set(todo_api::db::ConnectionState::Connected);
    let second = reqwest::get(&server.base_url)
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(first, MANIFEST);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let server = spawn_server(ConnectionStatus::new()).await;

    let response = reqwest::Client::new()
        .get(&server.base_url)
        .header("Origin", "http://example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let server = spawn_server(ConnectionStatus::new()).await;

    let response = reqwest::get(&server.base_url).await.unwrap();
    let request_id = response.headers()["x-request-id"].to_str().unwrap();

    assert!(uuid::Uuid::parse_str(request_id).is_ok());
}

#[tokio::test]
async fn test_todos_are_served_while_database_disconnected() {
    let server = spawn_server(ConnectionStatus::new()).await;

    let (status, body) = get_json(&format!("{}/todos", server.base_url)).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));

    let response = reqwest::Client::new()
        .post(format!("{}/todos", server.base_url))
        .json(&serde_json::json!({ "title": "ship it" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["title"], "ship it");
    assert_eq!(created["completed"], false);
}

#[tokio::test]
async fn test_invalid_json_body_is_bad_request() {
    let server = spawn_server(ConnectionStatus::new()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/todos", server.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_unknown_todo_and_route_are_not_found() {
    let server = spawn_server(ConnectionStatus::new()).await;

    let (status, body) = get_json(&format!("{}/todos/abc", server.base_url)).await;
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Todo not found: abc");

    let (status, body) = get_json(&format!("{}/nowhere", server.base_url)).await;
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found: /nowhere");
}
