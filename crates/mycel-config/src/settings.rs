//! Validated client configuration

use crate::schema::{RawBudgetConfig, RawConfig};
use mycel_util::RetryPolicy;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://mycel:9000";
pub const DEFAULT_WS_URL: &str = "ws://mycel:9001";
pub const DEFAULT_INTERFACE: &str = "eth0";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Systemwide daily allowance. A terminal configured above or below it skews
/// every patron's grant by the difference.
pub const DEFAULT_BASELINE_MINUTES: i64 = 60;
pub const DEFAULT_TIME_LIMIT: i64 = 60;
pub const DEFAULT_SHORT_TIME_LIMIT: i64 = 15;
pub const DEFAULT_WARNING_MINUTES: i64 = 5;

/// Validated configuration ready for use by the client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub identity: IdentityConfig,
    pub timing: TimingConfig,
    pub budget: BudgetLimits,
    pub warning_minutes: i64,
}

impl ClientConfig {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            server: ServerConfig {
                api_url: raw
                    .server
                    .api_url
                    .map(|u| u.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_API_URL.into()),
                ws_url: raw
                    .server
                    .ws_url
                    .map(|u| u.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_WS_URL.into()),
                request_timeout: raw
                    .server
                    .request_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            },
            identity: IdentityConfig {
                interface: raw
                    .client
                    .interface
                    .unwrap_or_else(|| DEFAULT_INTERFACE.into()),
                hardware_id: raw.client.hardware_id,
            },
            timing: TimingConfig {
                retry: raw
                    .timing
                    .retry_delay_ms
                    .map(|ms| RetryPolicy::fixed(Duration::from_millis(ms)))
                    .unwrap_or_default(),
                heartbeat_interval: raw
                    .timing
                    .heartbeat_interval_secs
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL),
            },
            budget: BudgetLimits::from_raw(&raw.budget),
            warning_minutes: raw
                .session
                .warning_minutes
                .unwrap_or(DEFAULT_WARNING_MINUTES),
        }
    }

    /// Live-channel endpoint for a client id
    pub fn channel_endpoint(&self, client_id: impl std::fmt::Display) -> String {
        format!("{}/subscribe/clients/{}", self.server.ws_url, client_id)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            identity: IdentityConfig::default(),
            timing: TimingConfig::default(),
            budget: BudgetLimits::default(),
            warning_minutes: DEFAULT_WARNING_MINUTES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub api_url: String,
    pub ws_url: String,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            ws_url: DEFAULT_WS_URL.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub interface: String,
    pub hardware_id: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            interface: DEFAULT_INTERFACE.into(),
            hardware_id: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimingConfig {
    pub retry: RetryPolicy,
    pub heartbeat_interval: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

/// Minute defaults for the budget calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetLimits {
    pub baseline_minutes: i64,
    pub default_time_limit: i64,
    pub default_short_time_limit: i64,
}

impl BudgetLimits {
    fn from_raw(raw: &RawBudgetConfig) -> Self {
        Self {
            baseline_minutes: raw.baseline_minutes.unwrap_or(DEFAULT_BASELINE_MINUTES),
            default_time_limit: raw.default_time_limit.unwrap_or(DEFAULT_TIME_LIMIT),
            default_short_time_limit: raw
                .default_shorttime_limit
                .unwrap_or(DEFAULT_SHORT_TIME_LIMIT),
        }
    }
}

impl Default for BudgetLimits {
    fn default() -> Self {
        Self {
            baseline_minutes: DEFAULT_BASELINE_MINUTES,
            default_time_limit: DEFAULT_TIME_LIMIT,
            default_short_time_limit: DEFAULT_SHORT_TIME_LIMIT,
        }
    }
}
