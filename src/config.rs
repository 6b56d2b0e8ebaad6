//! Configuration loading and constants.
//!
//! Configuration comes from command-line flags with environment variable
//! fallbacks. Defaults are defined as constants below so that tests and the
//! startup logs agree on them. `AppConfig` is the root configuration struct.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::db::{Backoff, RetryPolicy};

// =============================================================================
// HTTP Server
// =============================================================================

/// Default listening port
pub const DEFAULT_PORT: u16 = 3000;

/// Default bind address (all interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Cache-Control for the health endpoint: probes must always see fresh state
pub const CACHE_CONTROL_HEALTH: &str = "no-store";

// =============================================================================
// Database Connection
// =============================================================================

/// Default MongoDB connection string
pub const DEFAULT_MONGO_URI: &str = "mongodb://mongodb-service:27017/todoapp";

/// Database used when the connection string does not name one
pub const DEFAULT_DATABASE_NAME: &str = "todoapp";

/// Collection holding todo documents
pub const TODO_COLLECTION: &str = "todos";

/// Server selection timeout in milliseconds
pub const DEFAULT_SERVER_SELECTION_TIMEOUT_MS: u64 = 5000;

/// Socket idle timeout in milliseconds
pub const DEFAULT_SOCKET_TIMEOUT_MS: u64 = 45000;

/// Delay in milliseconds before retrying a failed connection attempt
pub const DEFAULT_RETRY_DELAY_MS: u64 = 3000;

/// Upper bound on the delay between attempts when backing off exponentially
pub const MAX_RETRY_DELAY_MS: u64 = 30_000;

// =============================================================================
// Logging
// =============================================================================

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "todo_api=debug,tower_http=info";

/// Todo API: a minimal REST API for todo items backed by MongoDB
#[derive(Parser, Debug, Clone)]
#[command(name = "todo-api", version, about)]
pub struct AppConfig {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind to
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: IpAddr,

    /// MongoDB connection string
    #[arg(long, env = "MONGO_URI", default_value = DEFAULT_MONGO_URI)]
    pub mongo_uri: String,

    /// How long the driver waits for a suitable server before failing an attempt
    #[arg(
        long,
        env = "MONGO_SERVER_SELECTION_TIMEOUT_MS",
        default_value_t = DEFAULT_SERVER_SELECTION_TIMEOUT_MS
    )]
    pub server_selection_timeout_ms: u64,

    /// How long a pooled connection may sit idle before it is closed
    #[arg(long, env = "MONGO_SOCKET_TIMEOUT_MS", default_value_t = DEFAULT_SOCKET_TIMEOUT_MS)]
    pub socket_timeout_ms: u64,

    /// Delay between connection attempts
    #[arg(long, env = "MONGO_RETRY_DELAY_MS", default_value_t = DEFAULT_RETRY_DELAY_MS)]
    pub retry_delay_ms: u64,

    /// Give up after this many failed attempts (unset: retry forever)
    #[arg(long, env = "MONGO_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Delay growth between attempts
    #[arg(long, env = "MONGO_RETRY_BACKOFF", value_enum, default_value_t = BackoffKind::Fixed)]
    pub retry_backoff: BackoffKind,

    /// Log level filter (e.g., "todo_api=debug,tower_http=info")
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Selectable retry delay growth
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackoffKind {
    Fixed,
    Exponential,
}

/// Log output format: human-readable text or structured JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Settings handed to the database driver
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub uri: String,
    pub server_selection_timeout: Duration,
    pub socket_timeout: Duration,
}

impl AppConfig {
    /// Address the HTTP server binds to
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            uri: self.mongo_uri.clone(),
            server_selection_timeout: Duration::from_millis(self.server_selection_timeout_ms),
            socket_timeout: Duration::from_millis(self.socket_timeout_ms),
        }
    }

    /// Retry policy for the connection manager
    pub fn retry_policy(&self) -> RetryPolicy {
        let backoff = match self.retry_backoff {
            BackoffKind::Fixed => Backoff::Fixed,
            BackoffKind::Exponential => Backoff::Exponential {
                factor: 2,
                max_delay: Duration::from_millis(MAX_RETRY_DELAY_MS),
            },
        };

        RetryPolicy {
            delay: Duration::from_millis(self.retry_delay_ms),
            // The first attempt is not a retry
            max_attempts: self.max_retries.map(|n| n.saturating_add(1)),
            backoff,
        }
    }

    /// Effective log filter with priority: CLI > RUST_LOG > default
    pub fn log_filter(&self) -> String {
        self.log_level
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Variables that feed `AppConfig` fallbacks
    const CONFIG_ENV: &[&str] = &[
        "PORT",
        "HOST",
        "MONGO_URI",
        "MONGO_SERVER_SELECTION_TIMEOUT_MS",
        "MONGO_SOCKET_TIMEOUT_MS",
        "MONGO_RETRY_DELAY_MS",
        "MONGO_MAX_RETRIES",
        "MONGO_RETRY_BACKOFF",
        "LOG_FORMAT",
    ];

    /// Parses `args` with the environment fallbacks cleared so only flags and
    /// built-in defaults apply.
    fn parse(args: &[&str]) -> AppConfig {
        for name in CONFIG_ENV {
            std::env::remove_var(name);
        }
        let mut argv = vec!["todo-api"];
        argv.extend_from_slice(args);
        AppConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = parse(&[
            "--port",
            "8080",
            "--host",
            "127.0.0.1",
            "--mongo-uri",
            "mongodb://localhost:27017/other",
        ]);

        assert_eq!(config.listen_addr(), "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.database().uri, "mongodb://localhost:27017/other");
    }

    #[test]
    fn test_defaults_without_flags_or_env() {
        let config = parse(&[]);

        assert_eq!(config.listen_addr(), "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.database().uri, DEFAULT_MONGO_URI);
        assert_eq!(
            config.database().server_selection_timeout,
            Duration::from_millis(DEFAULT_SERVER_SELECTION_TIMEOUT_MS)
        );
        assert_eq!(
            config.database().socket_timeout,
            Duration::from_millis(DEFAULT_SOCKET_TIMEOUT_MS)
        );
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_default_retry_policy_is_fixed_and_unbounded() {
        let config = parse(&[]);
        let policy = config.retry_policy();

        assert_eq!(policy.delay, Duration::from_millis(DEFAULT_RETRY_DELAY_MS));
        assert_eq!(policy.max_attempts, None);
        assert_eq!(policy.backoff, Backoff::Fixed);
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let config = parse(&["--retry-backoff", "exponential", "--max-retries", "5"]);
        let policy = config.retry_policy();

        assert_eq!(policy.max_attempts, Some(6));
        assert_eq!(
            policy.backoff,
            Backoff::Exponential {
                factor: 2,
                max_delay: Duration::from_millis(MAX_RETRY_DELAY_MS),
            }
        );
    }

    #[test]
    fn test_database_timeouts_from_flags() {
        let config = parse(&[
            "--server-selection-timeout-ms",
            "100",
            "--socket-timeout-ms",
            "200",
        ]);
        let db = config.database();

        assert_eq!(db.server_selection_timeout, Duration::from_millis(100));
        assert_eq!(db.socket_timeout, Duration::from_millis(200));
    }

    #[test]
    fn test_log_flag_wins() {
        let config = parse(&["--log-level", "todo_api=trace"]);
        assert_eq!(config.log_filter(), "todo_api=trace");
    }
}
