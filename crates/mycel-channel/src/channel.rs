//! Live session channel

use mycel_api::{ChannelEvent, ChannelMessage, LogOnOffMessage};
use mycel_util::{ClientId, RetryPolicy};
use std::sync::Arc;

use crate::{ChannelError, ChannelResult, Connection, Transport};

/// Connection state of a [`LiveChannel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    /// Dialed and log-on sent, waiting for the server to confirm
    LoggedOn,
    Active,
}

/// Persistent log-on connection for one patron session.
///
/// Once [`connect`](Self::connect) returns, the channel stays logged on for
/// the lifetime of the value: a dropped stream is redialed and the log-on
/// handshake repeated before [`receive`](Self::receive) hands out the next
/// event.
pub struct LiveChannel {
    transport: Arc<dyn Transport>,
    endpoint: String,
    client_id: ClientId,
    user: String,
    retry: RetryPolicy,
    conn: Option<Box<dyn Connection>>,
    state: ChannelState,
    activations: u64,
}

impl LiveChannel {
    /// Dial and log on, retrying until the server confirms
    pub async fn connect(
        transport: Arc<dyn Transport>,
        endpoint: impl Into<String>,
        client_id: ClientId,
        user: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        let mut channel = Self {
            transport,
            endpoint: endpoint.into(),
            client_id,
            user: user.into(),
            retry,
            conn: None,
            state: ChannelState::Disconnected,
            activations: 0,
        };
        channel.establish().await;
        channel
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Number of successful log-on handshakes so far
    pub fn activations(&self) -> u64 {
        self.activations
    }

    /// Next event from the server.
    ///
    /// End of stream and transport errors are handled here by redialing;
    /// they never reach the caller.
    pub async fn receive(&mut self) -> ChannelEvent {
        loop {
            let Some(conn) = self.conn.as_mut() else {
                self.establish().await;
                continue;
            };

            match conn.recv_text().await {
                Ok(Some(text)) => {
                    if let Some(event) = decode(&text) {
                        return event;
                    }
                }
                Ok(None) => {
                    tracing::info!(client_id = %self.client_id, "Live channel closed by server, reconnecting");
                    self.drop_connection();
                }
                Err(e) => {
                    tracing::warn!(client_id = %self.client_id, error = %e, "Live channel failed, reconnecting");
                    self.drop_connection();
                }
            }
        }
    }

    /// Tell the server the session is over. Failures are logged and ignored.
    pub async fn send_logoff(&mut self) {
        let Some(conn) = self.conn.as_mut() else {
            tracing::debug!(client_id = %self.client_id, "No live connection, skipping log-off");
            return;
        };

        let frame = LogOnOffMessage::log_off(self.client_id, self.user.clone());
        let result = match serde_json::to_string(&frame) {
            Ok(text) => conn.send_text(text).await,
            Err(e) => Err(ChannelError::from(e)),
        };

        match result {
            Ok(()) => tracing::info!(client_id = %self.client_id, user = %self.user, "Sent log-off"),
            Err(e) => tracing::warn!(client_id = %self.client_id, error = %e, "Log-off failed"),
        }
    }

    /// Drop the current connection and log on again over a fresh one
    pub async fn reconnect(&mut self) {
        self.drop_connection();
        self.establish().await;
    }

    fn drop_connection(&mut self) {
        self.conn = None;
        self.state = ChannelState::Disconnected;
    }

    /// Redial until a log-on handshake completes
    async fn establish(&mut self) {
        let mut attempt: u32 = 0;
        loop {
            self.state = ChannelState::Connecting;
            match self.handshake().await {
                Ok(conn) => {
                    self.conn = Some(conn);
                    self.state = ChannelState::Active;
                    self.activations += 1;
                    tracing::info!(
                        client_id = %self.client_id,
                        user = %self.user,
                        activations = self.activations,
                        "Live channel active"
                    );
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        endpoint = %self.endpoint,
                        error = %e,
                        attempt,
                        "Live channel connect failed, retrying"
                    );
                    attempt = attempt.saturating_add(1);
                    self.retry.wait().await;
                }
            }
        }
    }

    async fn handshake(&mut self) -> ChannelResult<Box<dyn Connection>> {
        let mut conn = self.transport.dial(&self.endpoint).await?;

        let frame = LogOnOffMessage::log_on(self.client_id, self.user.clone());
        conn.send_text(serde_json::to_string(&frame)?).await?;
        self.state = ChannelState::LoggedOn;

        loop {
            let Some(text) = conn.recv_text().await? else {
                return Err(ChannelError::ConnectionClosed);
            };
            match decode(&text) {
                Some(ChannelEvent::LoggedOn { .. }) => return Ok(conn),
                Some(other) => {
                    tracing::debug!(event = ?other, "Ignoring frame while waiting for log-on");
                }
                None => {}
            }
        }
    }
}

/// Parse one inbound frame; malformed frames are logged and dropped
fn decode(text: &str) -> Option<ChannelEvent> {
    match serde_json::from_str::<ChannelMessage>(text) {
        Ok(msg) => Some(ChannelEvent::from(msg)),
        Err(e) => {
            tracing::debug!(error = %e, frame = %text, "Discarding malformed live-channel frame");
            None
        }
    }
}
