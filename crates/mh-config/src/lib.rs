//! # mh-config
//!
//! Layered settings: built-in defaults, then `MININGHUB__*` environment
//! variables, then the bare `ADMIN_EVENT_CODE` variable for the admin code.

use config::{Config, ConfigError, Environment};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

const ENV_PREFIX: &str = "MININGHUB";
const ADMIN_CODE_VAR: &str = "ADMIN_EVENT_CODE";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub admin: AdminSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// sqlx connection URL, e.g. `sqlite:mininghub.db` or `sqlite::memory:`
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminSettings {
    /// Shared code required to create events. Redacted in `Debug` output.
    pub event_code: Option<SecretString>,
}

/// Loads `.env` from the working directory into the process environment.
/// Call before the logger is initialized so `RUST_LOG` can live there too.
/// Returns a warning to log once logging is up, if the file was unreadable.
pub fn load_env_file() -> Option<String> {
    match dotenvy::dotenv() {
        Ok(_) => None,
        Err(e) if e.not_found() => None,
        Err(e) => Some(format!("ignoring unreadable .env file: {e}")),
    }
}

impl Settings {
    /// Reads the process environment on top of the defaults.
    pub fn load() -> Result<Self, SettingsError> {
        let admin_code = std::env::var(ADMIN_CODE_VAR).ok();
        Self::build(env_source(), admin_code)
    }

    fn build(env: Environment, admin_code: Option<String>) -> Result<Self, SettingsError> {
        let settings = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite:mininghub.db")?
            .add_source(env)
            .set_override_option("admin.event_code", admin_code)?
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true)
}
