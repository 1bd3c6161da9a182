//! Session pump: turns minute pings into session signals

use mycel_api::ChannelEvent;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::LiveChannel;

/// What the pump tells the session about the patron's remaining time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// Minutes left, including the terminal's extra minutes
    Remaining(i64),
    /// Time is up; carries the (non-positive) effective minutes
    Exhausted(i64),
}

impl SessionSignal {
    /// Classify a server quota reading
    pub fn from_minutes(server_minutes: i64, extra: i64) -> Self {
        let effective = server_minutes + extra;
        if effective <= 0 {
            Self::Exhausted(effective)
        } else {
            Self::Remaining(effective)
        }
    }

    pub fn minutes(self) -> i64 {
        match self {
            Self::Remaining(m) | Self::Exhausted(m) => m,
        }
    }
}

/// Handle to a running pump task
pub struct PumpHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<LiveChannel>,
}

impl PumpHandle {
    /// Stop the pump and wait for it to send log-off.
    ///
    /// Returns the channel so the caller can inspect it; `None` if the task
    /// panicked.
    pub async fn stop(mut self) -> Option<LiveChannel> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }

        match self.task.await {
            Ok(channel) => Some(channel),
            Err(e) => {
                tracing::error!(error = %e, "Session pump task failed");
                None
            }
        }
    }
}

/// Spawn the pump on the current runtime.
///
/// `extra` is fixed for the lifetime of the session; reconnects inside the
/// channel do not touch it.
pub fn spawn_pump(
    channel: LiveChannel,
    extra: i64,
    signals: mpsc::Sender<SessionSignal>,
) -> PumpHandle {
    let (stop_tx, stop_rx) = oneshot::channel();
    let task = tokio::spawn(run_pump(channel, extra, signals, stop_rx));
    PumpHandle {
        stop: Some(stop_tx),
        task,
    }
}

async fn run_pump(
    mut channel: LiveChannel,
    extra: i64,
    signals: mpsc::Sender<SessionSignal>,
    mut stop: oneshot::Receiver<()>,
) -> LiveChannel {
    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            event = channel.receive() => {
                match event {
                    ChannelEvent::Ping { username, minutes } => {
                        let signal = SessionSignal::from_minutes(minutes, extra);
                        tracing::debug!(user = %username, server_minutes = minutes, extra, ?signal, "Minute ping");
                        if signals.send(signal).await.is_err() {
                            tracing::debug!("Session gone, stopping pump");
                            break;
                        }
                    }
                    other => {
                        tracing::debug!(event = ?other, "Ignoring live-channel event");
                    }
                }
            }
        }
    }

    channel.send_logoff().await;
    channel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockTransport;
    use mycel_api::ChannelAction;
    use mycel_util::{ClientId, RetryPolicy};
    use std::sync::Arc;

    async fn active_channel(transport: &Arc<MockTransport>) -> LiveChannel {
        LiveChannel::connect(
            transport.clone(),
            "ws://mycel:9001/subscribe/clients/1",
            ClientId::new(1),
            "n0123",
            RetryPolicy::immediate(),
        )
        .await
    }

    #[test]
    fn test_signal_classification() {
        assert_eq!(SessionSignal::from_minutes(30, 60), SessionSignal::Remaining(90));
        assert_eq!(SessionSignal::from_minutes(10, -10), SessionSignal::Exhausted(0));
        assert_eq!(SessionSignal::from_minutes(-3, 0), SessionSignal::Exhausted(-3));
        assert_eq!(SessionSignal::Exhausted(-3).minutes(), -3);
    }

    #[tokio::test]
    async fn test_pings_include_extra_minutes() {
        let transport = Arc::new(MockTransport::new());
        let peer = transport.accept();
        peer.logged_on("n0123");
        peer.ping("n0123", 45);
        peer.text(r#"{"status": "logged-off"}"#);
        peer.ping("n0123", 5);

        let (tx, mut rx) = mpsc::channel(8);
        let pump = spawn_pump(active_channel(&transport).await, -10, tx);

        assert_eq!(rx.recv().await, Some(SessionSignal::Remaining(35)));
        assert_eq!(rx.recv().await, Some(SessionSignal::Exhausted(-5)));

        pump.stop().await;
    }

    #[tokio::test]
    async fn test_extra_survives_reconnect() {
        let transport = Arc::new(MockTransport::new());
        let first = transport.accept();
        first.logged_on("n0123");
        first.ping("n0123", 20);
        first.close();
        let second = transport.accept();
        second.logged_on("n0123");
        second.ping("n0123", 19);

        let (tx, mut rx) = mpsc::channel(8);
        let pump = spawn_pump(active_channel(&transport).await, 15, tx);

        assert_eq!(rx.recv().await, Some(SessionSignal::Remaining(35)));
        assert_eq!(rx.recv().await, Some(SessionSignal::Remaining(34)));

        let channel = pump.stop().await.unwrap();
        assert_eq!(channel.activations(), 2);
    }

    #[tokio::test]
    async fn test_stop_sends_log_off() {
        let transport = Arc::new(MockTransport::new());
        let peer = transport.accept();
        peer.logged_on("n0123");

        let (tx, _rx) = mpsc::channel(8);
        let pump = spawn_pump(active_channel(&transport).await, 0, tx);
        pump.stop().await;

        assert_eq!(
            transport.sent_actions(),
            vec![ChannelAction::LogOn, ChannelAction::LogOff]
        );
    }
}
