use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub definitions: DefinitionsConfig,
    #[serde(default)]
    pub manager: ManagerConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("rivulet.db")
}

/// Definition store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefinitionsConfig {
    /// Directory holding `<name>/<rev>.json` definition files
    #[serde(default = "default_definitions_dir")]
    pub dir: PathBuf,
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        Self {
            dir: default_definitions_dir(),
        }
    }
}

fn default_definitions_dir() -> PathBuf {
    PathBuf::from("data/definitions")
}

/// Pipeline manager configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManagerConfig {
    /// How long a graceful stop may drain before the engine is killed
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,
    /// Lifecycle history entries retained per pipeline revision
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Error records / messages retained per stage instance
    #[serde(default = "default_error_capacity")]
    pub error_capacity: usize,
    /// Backoff before retrying a failed store write once
    #[serde(default = "default_persist_retry_backoff")]
    pub persist_retry_backoff_ms: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            stop_timeout_secs: default_stop_timeout(),
            history_limit: default_history_limit(),
            error_capacity: default_error_capacity(),
            persist_retry_backoff_ms: default_persist_retry_backoff(),
        }
    }
}

fn default_stop_timeout() -> u64 {
    30
}

fn default_history_limit() -> usize {
    100
}

fn default_error_capacity() -> usize {
    100
}

fn default_persist_retry_backoff() -> u64 {
    200
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "rivulet.db");
        assert_eq!(config.definitions.dir.to_str().unwrap(), "data/definitions");
        assert_eq!(config.manager.stop_timeout_secs, 30);
        assert_eq!(config.manager.history_limit, 100);
        assert_eq!(config.manager.error_capacity, 100);
        assert_eq!(config.manager.persist_retry_backoff_ms, 200);
    }

    #[test]
    fn test_deserialize_overrides() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
path = "/data/rivulet.sqlite"

[manager]
stop_timeout_secs = 5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(
            config.database.path.to_str().unwrap(),
            "/data/rivulet.sqlite"
        );
        assert_eq!(config.manager.stop_timeout_secs, 5);
        // untouched sections keep defaults
        assert_eq!(config.manager.history_limit, 100);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let back: Config = toml::from_str(&toml).unwrap();
        assert_eq!(back.server.port, config.server.port);
        assert_eq!(back.manager.error_capacity, config.manager.error_capacity);
    }
}
