//! MongoDB driver for the connection manager.
//!
//! The client is created once at startup; creating it does not touch the
//! network. A connect attempt is a `ping` against the `admin` database, which
//! fails after the configured server selection timeout when no server answers.
//!
//! Server monitor heartbeats are bridged into [`DriverEvent`]s so the shared
//! state keeps following the server after the first successful connect.

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::event::sdam::SdamEvent;
use mongodb::event::EventHandler;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

use super::{ConnectionTracker, DatabaseDriver, DriverError, DriverEvent};
use crate::config::{DatabaseConfig, DEFAULT_DATABASE_NAME};

/// MongoDB client plus the database named by the connection string
pub struct MongoDriver {
    client: Client,
    database: Database,
}

impl MongoDriver {
    /// Parses the connection string and builds a client whose monitoring
    /// events are forwarded to `tracker`.
    ///
    /// Fails only for a malformed connection string (or an SRV record that
    /// cannot be resolved); an unreachable server is not an error here.
    pub async fn new(config: &DatabaseConfig, tracker: ConnectionTracker) -> Result<Self, DriverError> {
        let mut options = ClientOptions::parse(config.uri.as_str()).await?;
        options.server_selection_timeout = Some(config.server_selection_timeout);
        options.max_idle_time = Some(config.socket_timeout);
        options.sdam_event_handler = Some(EventHandler::callback(move |event: SdamEvent| {
            for driver_event in translate(MonitorSignal::from(&event)) {
                tracker.apply(driver_event);
            }
        }));

        let database_name = options
            .default_database
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string());

        tracing::info!(
            hosts = ?options.hosts,
            database = %database_name,
            server_selection_timeout_ms = config.server_selection_timeout.as_millis() as u64,
            "Configured MongoDB client"
        );

        let client = Client::with_options(options)?;
        let database = client.database(&database_name);

        Ok(Self { client, database })
    }

    /// Handle to the application database
    pub fn database(&self) -> Database {
        self.database.clone()
    }
}

/// The parts of a monitoring event the connection state cares about
#[derive(Debug, Clone, PartialEq, Eq)]
enum MonitorSignal {
    HeartbeatSucceeded,
    HeartbeatFailed(String),
    TopologyClosed,
    Other,
}

impl From<&SdamEvent> for MonitorSignal {
    fn from(event: &SdamEvent) -> Self {
        match event {
            SdamEvent::ServerHeartbeatSucceeded(_) => Self::HeartbeatSucceeded,
            SdamEvent::ServerHeartbeatFailed(failed) => {
                Self::HeartbeatFailed(failed.failure.to_string())
            }
            SdamEvent::TopologyClosed(_) => Self::TopologyClosed,
            _ => Self::Other,
        }
    }
}

/// Maps monitoring signals to driver notifications
fn translate(signal: MonitorSignal) -> Vec<DriverEvent> {
    match signal {
        MonitorSignal::HeartbeatSucceeded => vec![DriverEvent::Connected],
        MonitorSignal::HeartbeatFailed(failure) => {
            vec![DriverEvent::Error(failure), DriverEvent::Disconnected]
        }
        MonitorSignal::TopologyClosed => vec![DriverEvent::Disconnected],
        MonitorSignal::Other => Vec::new(),
    }
}

#[async_trait]
impl DatabaseDriver for MongoDriver {
    async fn connect(&self) -> Result<(), DriverError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
    }
}
