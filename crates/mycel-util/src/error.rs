//! Error types for the Mycel client

use thiserror::Error;

use crate::HardwareId;

/// Fatal outcomes of a client run.
///
/// Everything in here stops the process before (or instead of) a session.
/// Transient faults never reach this type; they are retried where they occur.
#[derive(Debug, Error)]
pub enum MycelError {
    #[error("Client {0} is not registered in the Mycel directory")]
    NotRegistered(HardwareId),

    #[error("Malformed directory response: {0}")]
    Decode(String),

    #[error("Incomplete opening hours: {0}")]
    IncompleteSchedule(String),

    #[error("The library is closed today")]
    ClosedToday,

    #[error("Frontend error: {0}")]
    FrontendError(String),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MycelError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn schedule(msg: impl Into<String>) -> Self {
        Self::IncompleteSchedule(msg.into())
    }

    pub fn frontend(msg: impl Into<String>) -> Self {
        Self::FrontendError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Operator-facing text shown on the kiosk before the process stops
    pub fn operator_notice(&self) -> String {
        match self {
            Self::NotRegistered(hw) => format!(
                "This machine ({hw}) is not registered. Please contact library staff."
            ),
            Self::ClosedToday => "The library is closed. No sessions can be started.".into(),
            Self::IncompleteSchedule(_) | Self::Decode(_) => {
                "This machine is not configured correctly. Please contact library staff.".into()
            }
            _ => "This machine is out of order. Please contact library staff.".into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MycelError>;
