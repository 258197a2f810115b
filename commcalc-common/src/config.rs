//! Configuration loading
//!
//! A single TOML file, located in priority order:
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`COMMCALC_CONFIG`)
//! 3. Platform config directory (`<config_dir>/commcalc/config.toml`)
//! 4. Compiled defaults
//!
//! A missing or unreadable file is never fatal: a warning is logged and the
//! compiled defaults are used.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::report::pipeline::PipelineConfig;
use crate::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "COMMCALC_CONFIG";

/// Default dashboard port
pub const DEFAULT_PORT: u16 = 5790;

/// Complete configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub calculator: CalculatorConfig,
}

/// HTTP listener
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Dashboard password gate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// SHA-256 hex of the dashboard password; empty disables the gate
    #[serde(default)]
    pub password_sha256: String,
}

/// Flat commission calculator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculatorConfig {
    /// Regex selecting the employee whose GP is summed from an upload
    #[serde(default)]
    pub employee_pattern: Option<String>,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }
}

/// Read and parse a config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;
    TomlConfig::from_toml_str(&text)
}

/// Platform default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("commcalc").join("config.toml"))
}

/// Locate the config file
///
/// CLI and environment paths are returned even when they do not exist, so the
/// loader can warn about them. The platform default is only returned when
/// present.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|p| p.exists())
}

/// Resolve, read and parse the config, falling back to defaults
pub fn load_or_default(cli_arg: Option<&Path>) -> TomlConfig {
    let Some(path) = resolve_config_path(cli_arg) else {
        info!("No config file found, using defaults");
        return TomlConfig::default();
    };

    match load_toml_config(&path) {
        Ok(config) => {
            info!("Loaded configuration from {:?}", path);
            config
        }
        Err(e) => {
            warn!("{}; using defaults", e);
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::scoring::TierFloor;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.logging.level, "info");
        assert!(config.auth.password_sha256.is_empty());
        assert!(config.pipeline.normalize_fractional_percents);
    }

    #[test]
    fn test_partial_sections() {
        let config = TomlConfig::from_toml_str(
            r#"
            [server]
            port = 8080

            [pipeline]
            tier_floor = "zero"
            excluded_employees = ["Josh Ordonez"]

            [calculator]
            employee_pattern = '\b(Josue|Josh) Ordonez\b'
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.pipeline.tier_floor, TierFloor::Zero);
        assert_eq!(config.pipeline.excluded_employees, vec!["Josh Ordonez"]);
        assert_eq!(
            config.calculator.employee_pattern.as_deref(),
            Some(r"\b(Josue|Josh) Ordonez\b")
        );
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[server\nport = 1").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_enum_value_is_config_error() {
        let err = TomlConfig::from_toml_str("[pipeline]\nvariant = \"huge\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
