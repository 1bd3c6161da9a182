//! Live-channel frames
//!
//! Outbound: `{"action": "log-on" | "log-off", "client": <id>, "user": <name>}`
//! Inbound: `{"status": <string>, "user": {"username": <name>, "minutes": <n>}}`

use mycel_util::ClientId;
use serde::{Deserialize, Serialize};

use crate::null_as_default;

/// Status confirming a log-on intent
pub const STATUS_LOGGED_ON: &str = "logged-on";

/// Status of the periodic minute update
pub const STATUS_PING: &str = "ping";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelAction {
    LogOn,
    LogOff,
}

/// Log-on/log-off intent sent to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogOnOffMessage {
    pub action: ChannelAction,
    pub client: ClientId,
    pub user: String,
}

impl LogOnOffMessage {
    pub fn log_on(client: ClientId, user: impl Into<String>) -> Self {
        Self {
            action: ChannelAction::LogOn,
            client,
            user: user.into(),
        }
    }

    pub fn log_off(client: ClientId, user: impl Into<String>) -> Self {
        Self {
            action: ChannelAction::LogOff,
            client,
            user: user.into(),
        }
    }
}

/// Any inbound frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub user: ChannelUser,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelUser {
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,

    /// Server-side quota left, before the terminal's extra minutes
    #[serde(default, deserialize_with = "null_as_default")]
    pub minutes: i64,
}

/// Inbound frame classified by status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    LoggedOn { username: String },
    Ping { username: String, minutes: i64 },
    /// Statuses this client does not act on
    Other { status: String },
}

impl From<ChannelMessage> for ChannelEvent {
    fn from(msg: ChannelMessage) -> Self {
        match msg.status.as_str() {
            STATUS_LOGGED_ON => ChannelEvent::LoggedOn {
                username: msg.user.username,
            },
            STATUS_PING => ChannelEvent::Ping {
                username: msg.user.username,
                minutes: msg.user.minutes,
            },
            _ => ChannelEvent::Other { status: msg.status },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_on_frame_shape() {
        let json = serde_json::to_value(LogOnOffMessage::log_on(ClientId::new(7), "n0123")).unwrap();
        assert_eq!(json, serde_json::json!({"action": "log-on", "client": 7, "user": "n0123"}));
    }

    #[test]
    fn log_off_frame_shape() {
        let json = serde_json::to_value(LogOnOffMessage::log_off(ClientId::new(7), "Anonym")).unwrap();
        assert_eq!(json["action"], "log-off");
    }

    #[test]
    fn classify_ping() {
        let msg: ChannelMessage = serde_json::from_str(
            r#"{"status": "ping", "user": {"username": "n0123", "minutes": 42}}"#,
        )
        .unwrap();
        assert_eq!(
            ChannelEvent::from(msg),
            ChannelEvent::Ping {
                username: "n0123".into(),
                minutes: 42
            }
        );
    }

    #[test]
    fn classify_logged_on_without_user() {
        let msg: ChannelMessage = serde_json::from_str(r#"{"status": "logged-on"}"#).unwrap();
        assert!(matches!(ChannelEvent::from(msg), ChannelEvent::LoggedOn { .. }));
    }

    #[test]
    fn unknown_status_is_other() {
        let msg: ChannelMessage =
            serde_json::from_str(r#"{"status": "logged-off", "user": null}"#).unwrap();
        assert_eq!(
            ChannelEvent::from(msg),
            ChannelEvent::Other {
                status: "logged-off".into()
            }
        );
    }
}
