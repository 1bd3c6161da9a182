//! Configuration validation

use crate::schema::RawConfig;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Invalid URL for {field} '{value}': {message}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        message: String,
    },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(url) = &config.server.api_url {
        if let Err(e) = check_scheme("server.api_url", url, &["http://", "https://"]) {
            errors.push(e);
        }
    }

    if let Some(url) = &config.server.ws_url {
        if let Err(e) = check_scheme("server.ws_url", url, &["ws://", "wss://"]) {
            errors.push(e);
        }
    }

    if config.server.request_timeout_secs == Some(0) {
        errors.push(ValidationError::InvalidValue {
            field: "server.request_timeout_secs",
            message: "must be at least 1".into(),
        });
    }

    if let Some(iface) = &config.client.interface {
        if iface.trim().is_empty() || iface.contains('/') {
            errors.push(ValidationError::InvalidValue {
                field: "client.interface",
                message: format!("'{}' is not an interface name", iface),
            });
        }
    }

    if let Some(hw) = &config.client.hardware_id {
        if hw.trim().is_empty() {
            errors.push(ValidationError::InvalidValue {
                field: "client.hardware_id",
                message: "cannot be empty".into(),
            });
        }
    }

    if config.timing.heartbeat_interval_secs == Some(0) {
        errors.push(ValidationError::InvalidValue {
            field: "timing.heartbeat_interval_secs",
            message: "must be at least 1".into(),
        });
    }

    let positive = [
        ("budget.baseline_minutes", config.budget.baseline_minutes),
        ("budget.default_time_limit", config.budget.default_time_limit),
        (
            "budget.default_shorttime_limit",
            config.budget.default_shorttime_limit,
        ),
    ];
    for (field, value) in positive {
        if let Some(v) = value {
            if v <= 0 {
                errors.push(ValidationError::InvalidValue {
                    field,
                    message: format!("must be positive, got {}", v),
                });
            }
        }
    }

    if let Some(w) = config.session.warning_minutes {
        if w < 0 {
            errors.push(ValidationError::InvalidValue {
                field: "session.warning_minutes",
                message: format!("cannot be negative, got {}", w),
            });
        }
    }

    errors
}

fn check_scheme(field: &'static str, value: &str, schemes: &[&str]) -> Result<(), ValidationError> {
    let Some(scheme) = schemes.iter().find(|s| value.starts_with(**s)) else {
        return Err(ValidationError::InvalidUrl {
            field,
            value: value.into(),
            message: format!("expected one of {}", schemes.join(", ")),
        });
    };

    if value.len() == scheme.len() {
        return Err(ValidationError::InvalidUrl {
            field,
            value: value.into(),
            message: "missing host".into(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(toml_str: &str) -> RawConfig {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn test_empty_config_is_valid() {
        assert!(validate_config(&raw("config_version = 1")).is_empty());
    }

    #[test]
    fn test_wrong_url_schemes() {
        let config = raw(
            r#"
            config_version = 1
            [server]
            api_url = "ws://mycel:9000"
            ws_url = "http://mycel:9001"
            "#,
        );
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ValidationError::InvalidUrl { .. })));
    }

    #[test]
    fn test_url_without_host() {
        let config = raw(
            r#"
            config_version = 1
            [server]
            api_url = "https://"
            "#,
        );
        assert_eq!(validate_config(&config).len(), 1);
    }

    #[test]
    fn test_zero_heartbeat_rejected() {
        let config = raw(
            r#"
            config_version = 1
            [timing]
            heartbeat_interval_secs = 0
            retry_delay_ms = 0
            "#,
        );
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("heartbeat_interval_secs"));
    }

    #[test]
    fn test_non_positive_budget_rejected() {
        let config = raw(
            r#"
            config_version = 1
            [budget]
            baseline_minutes = 0
            default_shorttime_limit = -5
            [session]
            warning_minutes = -1
            "#,
        );
        assert_eq!(validate_config(&config).len(), 3);
    }

    #[test]
    fn test_interface_must_be_a_name() {
        let config = raw(
            r#"
            config_version = 1
            [client]
            interface = "../eth0"
            "#,
        );
        assert_eq!(validate_config(&config).len(), 1);
    }
}
