//! Default paths for the Mycel client
//!
//! - Config: `$MYCEL_CONFIG`, `$XDG_CONFIG_HOME/mycel/client.toml`,
//!   `~/.config/mycel/client.toml`, then `/etc/mycel/client.toml`
//! - Hardware address: `/sys/class/net/<interface>/address`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const MYCEL_CONFIG_ENV: &str = "MYCEL_CONFIG";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "client.toml";

/// Application subdirectory name
const APP_DIR: &str = "mycel";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$MYCEL_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/mycel/client.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/mycel/client.toml` (if HOME is set)
/// 4. `/etc/mycel/client.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(MYCEL_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_path_without_env()
}

/// Get the config path without checking MYCEL_CONFIG.
pub fn config_path_without_env() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    system_config_path()
}

/// System-wide config location used on kiosk images
pub fn system_config_path() -> PathBuf {
    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Sysfs file holding the MAC address of a network interface
pub fn hardware_address_path(interface: &str) -> PathBuf {
    PathBuf::from("/sys/class/net").join(interface).join("address")
}
