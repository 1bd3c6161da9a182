//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Mycel server endpoints
    #[serde(default)]
    pub server: RawServerConfig,

    /// Local machine identity
    #[serde(default)]
    pub client: RawClientConfig,

    /// Retry and heartbeat timing
    #[serde(default)]
    pub timing: RawTimingConfig,

    /// Budget defaults used when the directory leaves a limit unset
    #[serde(default)]
    pub budget: RawBudgetConfig,

    /// Session display settings
    #[serde(default)]
    pub session: RawSessionConfig,
}

impl Default for RawConfig {
    /// An empty file: every key at its default
    fn default() -> Self {
        Self {
            config_version: crate::CURRENT_CONFIG_VERSION,
            server: RawServerConfig::default(),
            client: RawClientConfig::default(),
            timing: RawTimingConfig::default(),
            budget: RawBudgetConfig::default(),
            session: RawSessionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServerConfig {
    /// HTTP API base (default: http://mycel:9000)
    pub api_url: Option<String>,

    /// Live-channel base (default: ws://mycel:9001)
    pub ws_url: Option<String>,

    /// Timeout for single HTTP requests
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawClientConfig {
    /// Network interface whose MAC address identifies this machine
    pub interface: Option<String>,

    /// Explicit hardware id; skips reading the interface address
    pub hardware_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTimingConfig {
    /// Delay between attempts of the unbounded retry loops
    pub retry_delay_ms: Option<u64>,

    /// Keep-alive interval
    pub heartbeat_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawBudgetConfig {
    /// Systemwide daily allowance the terminal's time limit is measured against
    pub baseline_minutes: Option<i64>,

    /// Terminal time limit when the directory has none
    pub default_time_limit: Option<i64>,

    /// Short-time ceiling when the directory has none
    pub default_shorttime_limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSessionConfig {
    /// Remaining minutes at which the low-time warning is shown
    pub warning_minutes: Option<i64>,
}
