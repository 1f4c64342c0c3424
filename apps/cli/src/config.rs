//! # CLI Configuration
//!
//! Settings for the `obrador` binary.
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! defaults ──► obrador.toml ──► OBRADOR_* env ──► command-line flags
//!                                                   (--db, --user, --customers)
//! ```
//!
//! ## Default Location
//! - **Linux**: `~/.config/obrador/obrador.toml`
//! - **macOS**: `~/Library/Application Support/com.obrador.obrador/obrador.toml`
//! - **Windows**: `%APPDATA%\obrador\obrador\config\obrador.toml`
//!
//! ## Example
//! ```toml
//! [database]
//! path = "/var/lib/obrador/obrador.db"
//! max_connections = 8
//!
//! [logging]
//! filter = "info,obrador=debug,sqlx=warn"
//!
//! [actor]
//! user_id = 12
//! customer_ids = [1, 2]
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use obrador_db::DbConfig;

pub const DEFAULT_LOG_FILTER: &str = "info,obrador=debug,sqlx=warn";

const CONFIG_FILE: &str = "obrador.toml";
const DATABASE_FILE: &str = "obrador.db";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file path.
    pub path: PathBuf,
    pub max_connections: u32,
    /// Seconds a movement waits for the SQLite write lock.
    pub busy_timeout_secs: u64,
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: 5,
            busy_timeout_secs: 5,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive; `RUST_LOG` still wins when set.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Identity used when the command line does not supply one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorSettings {
    pub user_id: Option<i64>,
    pub customer_ids: Vec<i64>,
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub actor: ActorSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// An explicit `config_path` must exist; the default path is optional.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let explicit = config_path.is_some();
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if explicit || path.exists() => {
                let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                Self::from_toml(&contents)?
            }
            _ => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `OBRADOR_*` overrides read through `lookup`.
    ///
    /// Unparseable numbers are ignored and keep the previous value.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("OBRADOR_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("OBRADOR_MAX_CONNECTIONS") {
            if let Ok(max) = max.parse::<u32>() {
                self.database.max_connections = max;
            }
        }

        if let Some(filter) = lookup("OBRADOR_LOG") {
            self.logging.filter = filter;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.busy_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "database.busy_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.filter must not be empty".into()));
        }

        Ok(())
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_secs(self.database.busy_timeout_secs))
            .run_migrations(self.database.run_migrations)
    }

    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "obrador", "obrador")
}

fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            path = "/tmp/site.db"

            [actor]
            customer_ids = [3, 4]
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/tmp/site.db"));
        assert_eq!(config.database.max_connections, 5);
        assert!(config.database.run_migrations);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
        assert_eq!(config.actor.user_id, None);
        assert_eq!(config.actor.customer_ids, vec![3, 4]);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("OBRADOR_DATABASE_PATH", "/data/obrador.db"),
            ("OBRADOR_MAX_CONNECTIONS", "12"),
            ("OBRADOR_LOG", "warn"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/data/obrador.db"));
        assert_eq!(config.database.max_connections, 12);
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn test_bad_number_override_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| (key == "OBRADOR_MAX_CONNECTIONS").then(|| "many".to_string()));
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        config.database.max_connections = 1;
        config.database.busy_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.database.busy_timeout_secs = 1;
        config.database.path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_file() {
        assert!(matches!(
            AppConfig::from_toml("[database]\nmax_connections = \"eight\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_toml_round_trip_sections() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[logging]"));
    }
}
