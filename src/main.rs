//! Todo API entry point.
//!
//! Initializes tracing, reads configuration from flags and environment,
//! creates the MongoDB client, starts the background connect loop, then
//! serves HTTP until a shutdown signal arrives.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_api::config::{AppConfig, LogFormat};
use todo_api::db::mongo::MongoDriver;
use todo_api::db::{ConnectionManager, TracingObserver};
use todo_api::http::start_server;
use todo_api::todos::MongoTodoRepository;
use todo_api::{create_router, AppState};

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::new(config.log_filter());

    let (text, json) = match config.log_format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::parse();
    init_tracing(&config);

    let policy = config.retry_policy();
    tracing::info!(
        retry_delay_ms = policy.delay.as_millis() as u64,
        max_attempts = ?policy.max_attempts,
        backoff = ?policy.backoff,
        "Loaded configuration"
    );

    // Connection state and its observer
    let manager = ConnectionManager::new(policy, Arc::new(TracingObserver));

    // A malformed connection string is fatal; an unreachable server is not
    let driver = MongoDriver::new(&config.database(), manager.tracker()).await?;
    let todos = MongoTodoRepository::new(&driver.database());
    let state = AppState::new(Arc::new(todos), manager.status());

    // Connect in the background so the server starts listening right away
    let connection = manager.start(Arc::new(driver));

    let app = create_router(state);
    let served = start_server(app, config.listen_addr()).await;

    connection.shutdown().await;
    served?;

    tracing::info!("Shutdown complete");
    Ok(())
}
