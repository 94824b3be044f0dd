//! Application configuration.

use crate::error::{AppError, AppResult};
use monitor_feed::FeederConfig;
use monitor_gateway::GatewayConfig;
use monitor_ws::ConnectionConfig;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "MONITOR_CONFIG";

/// Config file used when neither the CLI nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP gateway port.
    #[serde(default = "default_listener_port")]
    pub listener_port: u16,
    /// HTTP gateway bind address.
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,
    /// Observer write/read deadline in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Observer WebSocket URL.
    #[serde(default = "default_observer_url")]
    pub observer_url: String,
    /// Chain whose blocks are requested.
    #[serde(default = "default_chain_id")]
    pub chain_id: String,
    /// Poll tick in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// How long start-up waits for the first exchange rates.
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
}

fn default_listener_port() -> u16 {
    8080
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_observer_url() -> String {
    monitor_ws::DEFAULT_OBSERVER_URL.to_string()
}

fn default_chain_id() -> String {
    monitor_core::DEFAULT_CHAIN_ID.to_string()
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_ready_timeout_secs() -> u64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listener_port: default_listener_port(),
            bind_address: default_bind_address(),
            request_timeout_secs: default_request_timeout_secs(),
            observer_url: default_observer_url(),
            chain_id: default_chain_id(),
            poll_interval_ms: default_poll_interval_ms(),
            ready_timeout_secs: default_ready_timeout_secs(),
        }
    }
}

/// Values given on the command line; each one replaces the file value.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub listener_port: Option<u16>,
    pub request_timeout_seconds: Option<u64>,
    pub observer_url: Option<String>,
}

impl AppConfig {
    /// Load from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse TOML text.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load using the path resolution order: CLI path, then
    /// `MONITOR_CONFIG`, then `config/default.toml` if present, else defaults.
    pub fn load(cli_path: Option<String>) -> AppResult<Self> {
        let env_path = std::env::var(CONFIG_ENV_VAR).ok();
        match resolve_config_path(cli_path, env_path, Path::new(DEFAULT_CONFIG_PATH)) {
            Some(path) => {
                info!(config_path = %path.display(), "Loading configuration");
                Self::from_file(path)
            }
            None => {
                info!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(port) = overrides.listener_port {
            self.listener_port = port;
        }
        if let Some(secs) = overrides.request_timeout_seconds {
            self.request_timeout_secs = secs;
        }
        if let Some(url) = &overrides.observer_url {
            self.observer_url = url.clone();
        }
    }

    /// Reject values the feeder cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(AppError::Config(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.observer_url.is_empty() {
            return Err(AppError::Config("observer_url is empty".to_string()));
        }
        if self.chain_id.is_empty() {
            return Err(AppError::Config("chain_id is empty".to_string()));
        }
        Ok(())
    }

    pub fn feeder_config(&self) -> FeederConfig {
        FeederConfig {
            connection: ConnectionConfig {
                url: self.observer_url.clone(),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                ..ConnectionConfig::default()
            },
            chain_id: self.chain_id.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            ready_timeout: Duration::from_secs(self.ready_timeout_secs),
        }
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            bind_address: self.bind_address,
            port: self.listener_port,
        }
    }
}

/// Pick the config file: CLI path > env path > `fallback` if it exists.
pub fn resolve_config_path(
    cli_path: Option<String>,
    env_path: Option<String>,
    fallback: &Path,
) -> Option<PathBuf> {
    cli_path
        .or(env_path)
        .map(PathBuf::from)
        .or_else(|| fallback.exists().then(|| fallback.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.listener_port, 8080);
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.observer_url, "wss://observer.terra.dev");
        assert_eq!(config.chain_id, "columbus-4");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let config = AppConfig::from_toml(
            r#"
            listener_port = 9000
            chain_id = "bombay-12"
            "#,
        )
        .unwrap();
        assert_eq!(config.listener_port, 9000);
        assert_eq!(config.chain_id, "bombay-12");
        assert_eq!(config.poll_interval_ms, 100);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = AppConfig::from_toml("listener_port = \"eighty\"");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let mut config =
            AppConfig::from_toml("listener_port = 9000\nrequest_timeout_secs = 3").unwrap();
        config.apply_overrides(&CliOverrides {
            listener_port: Some(7000),
            request_timeout_seconds: None,
            observer_url: Some("ws://127.0.0.1:1".to_string()),
        });
        assert_eq!(config.listener_port, 7000);
        assert_eq!(config.request_timeout_secs, 3);
        assert_eq!(config.observer_url, "ws://127.0.0.1:1");
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = AppConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_derived_configs() {
        let config = AppConfig {
            listener_port: 9100,
            request_timeout_secs: 4,
            poll_interval_ms: 250,
            ..Default::default()
        };
        let feeder = config.feeder_config();
        assert_eq!(feeder.connection.request_timeout, Duration::from_secs(4));
        assert_eq!(feeder.poll_interval, Duration::from_millis(250));
        assert_eq!(feeder.chain_id, "columbus-4");
        assert_eq!(config.gateway_config().socket_addr().port(), 9100);
    }

    #[test]
    fn test_config_path_resolution() {
        let missing = Path::new("/nonexistent/monitor.toml");
        assert_eq!(
            resolve_config_path(Some("a.toml".into()), Some("b.toml".into()), missing),
            Some(PathBuf::from("a.toml"))
        );
        assert_eq!(
            resolve_config_path(None, Some("b.toml".into()), missing),
            Some(PathBuf::from("b.toml"))
        );
        assert_eq!(resolve_config_path(None, None, missing), None);

        let here = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        assert_eq!(resolve_config_path(None, None, &here), Some(here.clone()));
    }

    #[test]
    fn test_shipped_default_file_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
        let config = AppConfig::from_file(path).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.chain_id, "columbus-4");
    }
}
