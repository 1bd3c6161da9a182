//! Live session channel for the Mycel client
//!
//! Provides:
//! - A persistent duplex connection to `{ws}/subscribe/clients/{id}`
//! - The log-on handshake and best-effort log-off
//! - Transparent redial on dial failure, end of stream or transport error
//! - A pump task turning minute pings into session signals
//!
//! Connection-level failures stay inside this crate; callers of
//! [`LiveChannel::receive`] only ever see events.

mod channel;
mod mock;
mod pump;
mod transport;

#[cfg(test)]
mod proptest_reconnect;

pub use channel::*;
pub use mock::*;
pub use pump::*;
pub use transport::*;

use thiserror::Error;

/// Channel errors
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection closed")]
    ConnectionClosed,
}

pub type ChannelResult<T> = Result<T, ChannelError>;
