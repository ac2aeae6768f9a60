use std::time::Duration;

use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::{
    constants::DEFAULT_ACCOUNT_HEADER,
    error::{CoreError, CoreResult},
};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub authorization: AuthorizationConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Identity handed over by the upstream authenticator.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Request header holding the authenticated account id.
    pub account_header: String,
}

impl AuthConfig {
    /// ## Summary
    /// Checks that `account_header` is usable as an HTTP header name.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` if the name is empty or contains
    /// characters outside `[A-Za-z0-9_-]`.
    pub fn validate(&self) -> CoreResult<()> {
        let valid = !self.account_header.is_empty()
            && self
                .account_header
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if valid {
            Ok(())
        } else {
            Err(CoreError::InvalidConfiguration(format!(
                "auth.account_header '{}' is not a valid header name",
                self.account_header
            )))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationConfig {
    /// Insert a privilege row for every privilege-guarded action at startup.
    pub seed_privileges: bool,
    /// Load the account privilege cache before accepting requests.
    pub refresh_on_start: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
    /// Longest a caller waits for a pooled connection before giving up.
    pub connect_timeout_secs: u64,
}

impl DatabaseConfig {
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// ## Summary
    /// Checks the pool limits.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` if the pool would hold no connections or
    /// callers would never wait for one.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_connections == 0 {
            return Err(CoreError::InvalidConfiguration(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(CoreError::InvalidConfiguration(
                "database.connect_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub serve_origin: Option<String>,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the server address as a string in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// ## Summary
    /// Returns the server origin URL.
    #[must_use]
    pub fn origin(&self) -> String {
        if let Some(origin) = &self.serve_origin {
            origin.clone()
        } else {
            format!("http://{}", self.bind_addr())
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from defaults, `PRAETOR__*` environment variables and an
    /// optional `config.toml`. Environment variables take precedence over the file.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails,
    /// or if the pool limits or the account header name are invalid.
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8698)?
            .set_default("database.max_connections", 4)?
            .set_default("database.connect_timeout_secs", 5)?
            .set_default("logging.level", "debug")?
            .set_default("auth.account_header", DEFAULT_ACCOUNT_HEADER)?
            .set_default("authorization.seed_privileges", true)?
            .set_default("authorization.refresh_on_start", true)?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env file
            .add_source(
                config::Environment::with_prefix("PRAETOR")
                    .prefix_separator("__")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        settings.database.validate()?;
        settings.auth.validate()?;

        Ok(settings)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
