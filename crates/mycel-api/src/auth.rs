//! Patron authentication documents

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::null_as_default;

/// Account type marking guest accounts, which are capped by the terminal's
/// own time limit rather than their quota.
pub const GUEST_ACCOUNT_TYPE: &str = "G";

/// User name reported for short-time (credential-less) sessions
pub const ANONYMOUS_USER: &str = "Anonym";

/// Credentials typed on the login screen
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response of `POST /api/users/authenticate`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub age: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub authenticated: bool,

    /// Server explanation when `authenticated` is false
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,

    /// Minutes left on the patron's quota today
    #[serde(default, deserialize_with = "null_as_default")]
    pub minutes: i64,

    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub account_type: String,
}

impl AuthResponse {
    pub fn is_guest(&self) -> bool {
        self.account_type == GUEST_ACCOUNT_TYPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_member_response() {
        let r: AuthResponse = serde_json::from_str(
            r#"{"age": 34, "authenticated": true, "message": "", "minutes": 90, "type": "V"}"#,
        )
        .unwrap();
        assert!(r.authenticated);
        assert_eq!(r.minutes, 90);
        assert!(!r.is_guest());
    }

    #[test]
    fn parse_guest_response() {
        let r: AuthResponse =
            serde_json::from_str(r#"{"authenticated": true, "minutes": 300, "type": "G"}"#).unwrap();
        assert!(r.is_guest());
        assert_eq!(r.age, 0);
    }

    #[test]
    fn parse_refusal_with_null_type() {
        let r: AuthResponse = serde_json::from_str(
            r#"{"authenticated": false, "message": "Feil PIN-kode", "type": null}"#,
        )
        .unwrap();
        assert!(!r.authenticated);
        assert_eq!(r.message, "Feil PIN-kode");
        assert_eq!(r.account_type, "");
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("n0123", "secret");
        let debug = format!("{creds:?}");
        assert!(debug.contains("n0123"));
        assert!(!debug.contains("secret"));
    }
}
