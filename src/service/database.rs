use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::IdentityClient;

/// Database credentials kept in the secret service, never in config files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

/// Example consumer: a service that connects to its database with
/// credentials fetched through the identity client. Demonstrates the
/// outward contract — callers only ever see `get_secret`.
pub struct DatabaseService {
    client: Arc<IdentityClient>,
    connected: Option<DatabaseConfig>,
}

impl DatabaseService {
    pub fn new(client: Arc<IdentityClient>) -> Self {
        Self {
            client,
            connected: None,
        }
    }

    /// Fetch database credentials and establish a (simulated) connection.
    pub async fn connect(&mut self, secret_name: &str) -> Result<()> {
        let raw = self
            .client
            .get_secret(secret_name)
            .await
            .context("retrieving database configuration")?;

        let config: DatabaseConfig =
            serde_json::from_str(&raw).context("parsing database configuration")?;

        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "database connection established"
        );

        self.connected = Some(config);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connected.is_some()
    }

    /// Execute a query against the (simulated) connection.
    pub fn query(&self, query: &str) -> Result<QueryResult> {
        let config = self
            .connected
            .as_ref()
            .context("not connected to database")?;

        info!(database = %config.database, %query, "executing query");

        Ok(QueryResult {
            status: "success".to_string(),
            rows: 42,
            query: query.to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub status: String,
    pub rows: u64,
    pub query: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_parsing() {
        let raw = r#"{
            "host": "db.internal",
            "port": 5432,
            "database": "appdb",
            "username": "app",
            "password": "from-secret-service"
        }"#;

        let config: DatabaseConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 5432);
        assert_eq!(config.database, "appdb");
    }

    #[test]
    fn test_database_config_rejects_partial_payload() {
        let raw = r#"{"host": "db.internal"}"#;
        let result: std::result::Result<DatabaseConfig, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }
}
