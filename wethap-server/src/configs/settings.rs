use std::env;
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::configs::normalize_path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    /// Path prefix every route is nested under, e.g. `/wethap`.
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub migration_path: Option<String>,
    pub clean_start: bool,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    /// Local times of day, `HH:MM`, at which readings are requested.
    pub fire_times: Vec<String>,
    pub utc_offset_hours: i8,
    /// Wake-ups later than this past their target are treated as missed.
    pub max_lateness_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub handshake_timeout_secs: u64,
    pub keep_alive_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weather {
    pub url: Option<String>,
    /// JSON pointer to the weather description inside the response body.
    pub pointer: String,
    pub fallback: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    pub database: Database,
    pub schedule: Schedule,
    pub connection: Connection,
    pub weather: Weather,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let mut settings: Settings = Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("WETHAP").separator("__"))
            .build()?
            .try_deserialize()?;

        if let Some(migrate) = &settings.database.migration_path {
            if Path::new(migrate).is_dir() {
                let migrate_path = normalize_path(migrate)
                    .map_err(|e| ConfigError::Message(e.to_string()))?
                    .to_string_lossy()
                    .to_string();

                settings.database.migration_path = Some(migrate_path);
            } else {
                tracing::warn!(path = %migrate, "migration path is not a directory, skipping migrations");
                settings.database.migration_path = None;
            }
        }

        Ok(settings)
    }

    /// Route prefix without a trailing slash; empty means the root.
    pub fn route_prefix(&self) -> String {
        let trimmed = self.server.prefix.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_prefix(prefix: &str) -> Settings {
        Settings {
            server: Server {
                host: "127.0.0.1".into(),
                port: 0,
                prefix: prefix.into(),
            },
            logger: Logger {
                level: "debug".into(),
            },
            database: Database {
                migration_path: None,
                clean_start: true,
                url: "sqlite::memory:".into(),
            },
            schedule: Schedule {
                fire_times: vec!["09:25".into()],
                utc_offset_hours: 9,
                max_lateness_secs: 60,
            },
            connection: Connection {
                handshake_timeout_secs: 10,
                keep_alive_secs: 30,
            },
            weather: Weather {
                url: None,
                pointer: "/weather".into(),
                fallback: "unknown".into(),
                timeout_secs: 5,
            },
        }
    }

    #[test]
    fn test_route_prefix_normalization() {
        assert_eq!(settings_with_prefix("").route_prefix(), "");
        assert_eq!(settings_with_prefix("/").route_prefix(), "");
        assert_eq!(settings_with_prefix("wethap").route_prefix(), "/wethap");
        assert_eq!(settings_with_prefix("/wethap/").route_prefix(), "/wethap");
    }
}
