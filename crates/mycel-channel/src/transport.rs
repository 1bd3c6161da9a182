//! Frame transport under the live channel

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::{ChannelError, ChannelResult};

/// Opens connections to a channel endpoint
#[async_trait]
pub trait Transport: Send + Sync {
    async fn dial(&self, endpoint: &str) -> ChannelResult<Box<dyn Connection>>;
}

/// One open text-frame connection
#[async_trait]
pub trait Connection: Send {
    async fn send_text(&mut self, text: String) -> ChannelResult<()>;

    /// Next text frame, or `None` once the peer has closed the stream.
    /// Must be cancel safe.
    async fn recv_text(&mut self) -> ChannelResult<Option<String>>;
}

/// Websocket transport
#[derive(Debug, Default, Clone, Copy)]
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn dial(&self, endpoint: &str) -> ChannelResult<Box<dyn Connection>> {
        let url = Url::parse(endpoint).map_err(|e| ChannelError::Connect(e.to_string()))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ChannelError::Connect(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        tracing::debug!(url = %url, "Dialing live channel");

        let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;

        Ok(Box::new(WsConnection { stream }))
    }
}

struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send_text(&mut self, text: String) -> ChannelResult<()> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }

    async fn recv_text(&mut self) -> ChannelResult<Option<String>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.to_string())),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Ok(Some(text)),
                    Err(_) => tracing::debug!(len = bytes.len(), "Ignoring binary frame"),
                },
                Some(Ok(Message::Ping(_))) => {
                    // tungstenite queues the pong itself
                    tracing::trace!("Live channel ping");
                }
                Some(Ok(Message::Close(frame))) => {
                    if let Some(ref cf) = frame {
                        tracing::info!(code = %cf.code, reason = %cf.reason, "Live channel close frame received");
                    } else {
                        tracing::info!("Live channel close frame received (no payload)");
                    }
                    return Ok(None);
                }
                Some(Ok(_)) => {
                    // Pong, raw frames
                }
                Some(Err(e)) => return Err(ChannelError::Transport(e.to_string())),
                None => return Ok(None),
            }
        }
    }
}
