use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::ledger::DEFAULT_BUSY_RETRIES;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Development,
    Production,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// File name under `data_dir`, or `:memory:`.
    pub url: String,
    pub data_dir: PathBuf,
    pub busy_timeout_ms: u64,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Extra attempts for a booking transaction that still hits a locked database.
    pub busy_retries: u32,
}

impl DatabaseSettings {
    pub fn in_memory() -> Self {
        Self {
            url: ":memory:".to_string(),
            ..Self::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "booking.db".to_string(),
            data_dir: PathBuf::from(".local"),
            busy_timeout_ms: 10_000,
            max_connections: 8,
            acquire_timeout_secs: 30,
            busy_retries: DEFAULT_BUSY_RETRIES,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub env: RunMode,
    pub host: IpAddr,
    pub port: u16,
    pub debug: bool,
    pub enable_swagger: bool,
    pub shutdown_timeout_secs: u64,
    pub database: DatabaseSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            env: RunMode::Development,
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            debug: false,
            enable_swagger: true,
            shutdown_timeout_secs: 10,
            database: DatabaseSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            // APP_PORT=9000, APP_DATABASE__URL=prod.db
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    const VARS: [&str; 4] = ["APP_ENV", "APP_PORT", "APP_HOST", "APP_DATABASE__URL"];

    fn clear_vars() {
        for var in VARS {
            // SAFETY: tests touching the environment are serialized.
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_vars();
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.env, RunMode::Development);
        assert_eq!(settings.database.busy_timeout_ms, 10_000);
        assert_eq!(settings.database.data_dir, PathBuf::from(".local"));
    }

    #[test]
    #[serial]
    fn test_env_defaults_match_struct_defaults() {
        clear_vars();
        let loaded = Settings::from_env().unwrap();
        let defaults = Settings::default();

        assert_eq!(loaded.host, defaults.host);
        assert_eq!(loaded.shutdown_timeout_secs, defaults.shutdown_timeout_secs);
        assert_eq!(loaded.database.url, defaults.database.url);
        assert_eq!(loaded.database.max_connections, defaults.database.max_connections);
        assert_eq!(loaded.database.acquire_timeout_secs, defaults.database.acquire_timeout_secs);
        assert_eq!(loaded.database.busy_retries, DEFAULT_BUSY_RETRIES);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_vars();
        unsafe {
            std::env::set_var("APP_ENV", "production");
            std::env::set_var("APP_PORT", "9090");
            std::env::set_var("APP_DATABASE__URL", "other.db");
        }
        let settings = Settings::from_env().unwrap();
        clear_vars();

        assert_eq!(settings.env, RunMode::Production);
        assert_eq!(settings.port, 9090);
        assert_eq!(settings.database.url, "other.db");
    }

    #[test]
    #[serial]
    fn test_rejects_unknown_env() {
        clear_vars();
        unsafe { std::env::set_var("APP_ENV", "staging") };
        let result = Settings::from_env();
        clear_vars();

        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_rejects_invalid_host() {
        clear_vars();
        unsafe { std::env::set_var("APP_HOST", "not-an-ip") };
        let result = Settings::from_env();
        clear_vars();

        assert!(result.is_err());
    }
}
