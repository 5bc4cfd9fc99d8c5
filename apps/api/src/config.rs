//! API configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `scoop.toml` in the working directory, then `SCOOP_*` environment
//! variables (`SCOOP_PORT=9000`, `SCOOP_JWT_SECRET=...`).

use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use scoop_db::DbConfig;

const DEV_SECRET: &str = "scoop-dev-secret-change-in-production";

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    pub max_connections: u32,

    /// Lock wait before a write fails with `STORAGE_BUSY`
    pub busy_timeout_secs: u64,

    /// HS256 secret shared with the identity provider
    pub jwt_secret: String,

    /// Lifetime of tokens minted by `issue-token`
    pub token_lifetime_secs: i64,
}

impl ApiConfig {
    /// Load configuration from defaults, `scoop.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("scoop")
    }

    /// Same as [`ApiConfig::load`] with a different file stem.
    pub fn load_from(file_stem: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("port", 8080)?
            .set_default("database_path", "./scoop.db")?
            .set_default("max_connections", 8)?
            .set_default("busy_timeout_secs", 5)?
            .set_default("jwt_secret", DEV_SECRET)?
            .set_default("token_lifetime_secs", 8 * 3600)?
            .add_source(File::with_name(file_stem).required(false))
            .add_source(Environment::with_prefix("SCOOP"))
            .build()?;

        let config: ApiConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("port".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.token_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("token_lifetime_secs".to_string()));
        }
        Ok(())
    }

    /// True while the built-in development secret is in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_SECRET
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_secs(self.busy_timeout_secs))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),
}
