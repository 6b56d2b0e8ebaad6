//! HTTP server startup logic.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use super::shutdown;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind server to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Binds the listening socket and logs where the API can be reached.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    let port = listener.local_addr()?.port();
    tracing::info!(%addr, "Server running on http://localhost:{}", port);
    tracing::info!("Health check: http://localhost:{}/health", port);

    Ok(listener)
}

/// Serves `app` on `listener` until `signal` resolves, then drains open
/// connections.
pub async fn serve<F>(listener: TcpListener, app: Router, signal: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .await?;
    Ok(())
}

/// Start the HTTP server on `addr`.
///
/// This function blocks until the server shuts down on SIGTERM or Ctrl+C.
pub async fn start_server(app: Router, addr: SocketAddr) -> Result<(), ServerError> {
    let listener = bind(addr).await?;
    serve(listener, app, shutdown::shutdown_signal()).await
}
