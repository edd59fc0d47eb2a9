//! Process settings from the environment (`.env` honoured).

use crate::error::ConfigError;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/resources";
pub const DEFAULT_RESOURCES_DIR: &str = "resources";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_API_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub resources_dir: PathBuf,
    /// Major version used in every route and link (`/v{api_version}/...`).
    pub api_version: u32,
    pub bind_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: DEFAULT_DATABASE_URL.into(),
            resources_dir: PathBuf::from(DEFAULT_RESOURCES_DIR),
            api_version: DEFAULT_API_VERSION,
            bind_addr: DEFAULT_BIND_ADDR.into(),
        }
    }
}

impl Settings {
    /// Load `.env` if present, then read `DATABASE_URL`, `RESOURCES_DIR`, `API_VERSION` and
    /// `BIND_ADDR`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let api_version = match lookup("API_VERSION") {
            Some(v) => parse_version(&v)?,
            None => defaults.api_version,
        };
        Ok(Settings {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            resources_dir: lookup("RESOURCES_DIR").map(PathBuf::from).unwrap_or(defaults.resources_dir),
            api_version,
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
        })
    }
}

/// Accepts `3` or `v3`.
pub fn parse_version(s: &str) -> Result<u32, ConfigError> {
    let s = s.trim();
    let digits = s.strip_prefix('v').or_else(|| s.strip_prefix('V')).unwrap_or(s);
    match digits.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Validation(format!("API_VERSION must be a positive integer, got '{}'", s))),
    }
}
