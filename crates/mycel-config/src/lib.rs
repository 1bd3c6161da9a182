//! Configuration parsing and validation for the Mycel client
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Server endpoints and the identifying network interface
//! - Retry and heartbeat timing
//! - Budget defaults for terminals the directory leaves unconfigured
//!
//! Every key is optional; a missing file yields the built-in defaults.

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub ws_url: Option<String>,
    pub interface: Option<String>,
    pub hardware_id: Option<String>,
}

impl Overrides {
    fn apply(&self, raw: &mut RawConfig) {
        let pairs = [
            (&self.api_url, &mut raw.server.api_url),
            (&self.ws_url, &mut raw.server.ws_url),
            (&self.interface, &mut raw.client.interface),
            (&self.hardware_id, &mut raw.client.hardware_id),
        ];
        for (value, slot) in pairs {
            if value.is_some() {
                *slot = value.clone();
            }
        }
    }
}

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<ClientConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load configuration, falling back to defaults when the file does not exist
pub fn load_config_or_default(path: impl AsRef<Path>) -> ConfigResult<ClientConfig> {
    load_config_with(path, &Overrides::default())
}

/// Load configuration (or defaults) and apply command-line overrides before
/// validation
pub fn load_config_with(path: impl AsRef<Path>, overrides: &Overrides) -> ConfigResult<ClientConfig> {
    let path = path.as_ref();
    let mut raw = if path.exists() {
        parse_raw(&std::fs::read_to_string(path)?)?
    } else {
        tracing::info!(path = %path.display(), "No config file, using defaults");
        RawConfig::default()
    };
    overrides.apply(&mut raw);
    finish(raw)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<ClientConfig> {
    finish(parse_raw(content)?)
}

fn parse_raw(content: &str) -> ConfigResult<RawConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }
    Ok(raw)
}

fn finish(raw: RawConfig) -> ConfigResult<ClientConfig> {
    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(ClientConfig::from_raw(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_minimal_config() {
        let config = parse_config("config_version = 1").unwrap();
        assert_eq!(config.server.api_url, DEFAULT_API_URL);
        assert_eq!(config.budget.default_short_time_limit, 15);
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_values() {
        let result = parse_config(
            r#"
            config_version = 1
            [budget]
            baseline_minutes = -1
            "#,
        );
        assert!(matches!(result, Err(ConfigError::ValidationFailed { errors }) if errors.len() == 1));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_or_default(dir.path().join("client.toml")).unwrap();
        assert_eq!(config.identity.interface, DEFAULT_INTERFACE);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            config_version = 1
            [client]
            interface = "enp1s0"
            "#
        )
        .unwrap();

        let config = load_config_or_default(file.path()).unwrap();
        assert_eq!(config.identity.interface, "enp1s0");
    }

    #[test]
    fn overrides_win_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            config_version = 1
            [server]
            api_url = "http://file:9000"
            ws_url = "ws://file:9001"
            "#
        )
        .unwrap();

        let overrides = Overrides {
            api_url: Some("http://cli:9000/".into()),
            hardware_id: Some("08:00:27:aa:bb:cc".into()),
            ..Default::default()
        };
        let config = load_config_with(file.path(), &overrides).unwrap();
        assert_eq!(config.server.api_url, "http://cli:9000");
        assert_eq!(config.server.ws_url, "ws://file:9001");
        assert_eq!(config.identity.hardware_id.as_deref(), Some("08:00:27:aa:bb:cc"));
    }

    #[test]
    fn overrides_are_validated() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            ws_url: Some("http://not-a-socket".into()),
            ..Default::default()
        };
        let result = load_config_with(dir.path().join("client.toml"), &overrides);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
    }

    #[test]
    fn example_config_matches_defaults() {
        let config = parse_config(include_str!("../../../config.example.toml")).unwrap();
        let defaults = ClientConfig::default();
        assert_eq!(config.server.api_url, defaults.server.api_url);
        assert_eq!(config.timing.heartbeat_interval, defaults.timing.heartbeat_interval);
        assert_eq!(config.budget.baseline_minutes, defaults.budget.baseline_minutes);
        assert_eq!(config.warning_minutes, defaults.warning_minutes);
    }
}
