//! API configuration module.
//!
//! Sources, later wins: built-in defaults, then an optional TOML file (path in
//! `STAYHUB_CONFIG`, `stayhub.toml` otherwise), then `STAYHUB_*` environment
//! variables.

use std::net::SocketAddr;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use stayhub_db::DbConfig;

/// Signing secret used when none is configured. Fine for a laptop, never for
/// a deployment.
pub const DEV_JWT_SECRET: &str = "stayhub-dev-secret-change-in-production";

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// SQLite database file
    pub database_path: String,

    pub db_max_connections: u32,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT lifetime in seconds (one shift by default)
    pub jwt_lifetime_secs: i64,

    /// Upper bound on a single manager transaction
    pub transaction_timeout_secs: u64,

    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl ApiConfig {
    /// Load configuration, reading the file named by `STAYHUB_CONFIG` if set.
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("STAYHUB_CONFIG").unwrap_or_else(|_| "stayhub".to_string());
        Self::from_sources(Some(&file))
    }

    /// Load configuration from defaults, an optional file and the environment.
    pub fn from_sources(file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("bind_addr", "0.0.0.0:8080")?
            .set_default("database_path", "./data/stayhub.db")?
            .set_default("db_max_connections", 5_i64)?
            .set_default("jwt_secret", DEV_JWT_SECRET)?
            .set_default("jwt_lifetime_secs", 28_800_i64)?
            .set_default("transaction_timeout_secs", 10_i64)?
            .set_default("default_page_size", 20_i64)?
            .set_default("max_page_size", 100_i64)?;

        if let Some(path) = file {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        let config: ApiConfig = builder
            .add_source(Environment::with_prefix("STAYHUB").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue("bind_addr".to_string()))?;

        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("jwt_lifetime_secs".to_string()));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("db_max_connections".to_string()));
        }
        if self.default_page_size < 1 || self.default_page_size > self.max_page_size {
            return Err(ConfigError::InvalidValue("default_page_size".to_string()));
        }
        Ok(())
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.db_max_connections)
            .transaction_timeout(Duration::from_secs(self.transaction_timeout_secs))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_sources(None).unwrap();

        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.max_page_size, 100);
        assert!(config.jwt_lifetime_secs > 0);
        assert!(config.bind_addr.parse::<SocketAddr>().is_ok());
    }

    #[test]
    fn test_invalid_page_sizes_rejected() {
        let mut config = ApiConfig::from_sources(None).unwrap();
        config.default_page_size = 500;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        config.default_page_size = 20;
        config.jwt_secret = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::MissingRequired(_))));
    }

    #[test]
    fn test_db_config_carries_pool_settings() {
        let mut config = ApiConfig::from_sources(None).unwrap();
        config.db_max_connections = 9;
        config.transaction_timeout_secs = 3;

        let db = config.db_config();
        assert_eq!(db.max_connections, 9);
        assert_eq!(db.transaction_timeout, Duration::from_secs(3));
    }
}
