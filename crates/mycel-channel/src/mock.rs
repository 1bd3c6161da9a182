//! Scripted transport for testing

use async_trait::async_trait;
use mycel_api::{ChannelAction, LogOnOffMessage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::{ChannelError, ChannelResult, Connection, Transport};

enum Script {
    Refuse,
    Accept(mpsc::UnboundedReceiver<Inbound>),
}

enum Inbound {
    Text(String),
    Close,
    Fail,
}

/// Transport whose dials are answered from a script.
///
/// Each [`accept`](Self::accept) queues one successful dial and returns the
/// server side of that connection. Dials beyond the script are refused.
pub struct MockTransport {
    scripts: Mutex<VecDeque<Script>>,
    sent: Arc<Mutex<Vec<String>>>,
    dials: AtomicUsize,
    fail_sends: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            sent: Arc::new(Mutex::new(Vec::new())),
            dials: AtomicUsize::new(0),
            fail_sends: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Queue a dial that succeeds
    pub fn accept(&self) -> MockPeer {
        let (tx, rx) = mpsc::unbounded_channel();
        self.scripts.lock().unwrap().push_back(Script::Accept(rx));
        MockPeer { tx }
    }

    /// Queue a dial that fails
    pub fn refuse(&self) {
        self.scripts.lock().unwrap().push_back(Script::Refuse);
    }

    /// Make every later send fail
    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    /// Every frame sent by the client, across all connections
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_messages(&self) -> Vec<LogOnOffMessage> {
        self.sent()
            .iter()
            .filter_map(|text| serde_json::from_str(text).ok())
            .collect()
    }

    pub fn sent_actions(&self) -> Vec<ChannelAction> {
        self.sent_messages().into_iter().map(|m| m.action).collect()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn dial(&self, endpoint: &str) -> ChannelResult<Box<dyn Connection>> {
        self.dials.fetch_add(1, Ordering::SeqCst);

        let script = self.scripts.lock().unwrap().pop_front();
        match script {
            Some(Script::Accept(rx)) => Ok(Box::new(MockConnection {
                rx,
                sent: self.sent.clone(),
                fail_sends: self.fail_sends.clone(),
            })),
            Some(Script::Refuse) => Err(ChannelError::Connect(format!("{endpoint} refused"))),
            None => Err(ChannelError::Connect(format!("{endpoint} unreachable"))),
        }
    }
}

struct MockConnection {
    rx: mpsc::UnboundedReceiver<Inbound>,
    sent: Arc<Mutex<Vec<String>>>,
    fail_sends: Arc<AtomicBool>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn send_text(&mut self, text: String) -> ChannelResult<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ChannelError::Transport("Mock send failure".into()));
        }
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn recv_text(&mut self) -> ChannelResult<Option<String>> {
        match self.rx.recv().await {
            Some(Inbound::Text(text)) => Ok(Some(text)),
            Some(Inbound::Close) | None => Ok(None),
            Some(Inbound::Fail) => Err(ChannelError::Transport("Mock transport failure".into())),
        }
    }
}

/// Server side of one scripted connection.
///
/// Dropping the peer ends the stream once its queued frames are read.
#[derive(Clone)]
pub struct MockPeer {
    tx: mpsc::UnboundedSender<Inbound>,
}

impl MockPeer {
    pub fn text(&self, text: impl Into<String>) {
        let _ = self.tx.send(Inbound::Text(text.into()));
    }

    pub fn logged_on(&self, username: &str) {
        self.text(
            serde_json::json!({"status": "logged-on", "user": {"username": username}}).to_string(),
        );
    }

    pub fn ping(&self, username: &str, minutes: i64) {
        self.text(
            serde_json::json!({"status": "ping", "user": {"username": username, "minutes": minutes}})
                .to_string(),
        );
    }

    /// End the stream
    pub fn close(&self) {
        let _ = self.tx.send(Inbound::Close);
    }

    /// Break the stream with a transport error
    pub fn fail(&self) {
        let _ = self.tx.send(Inbound::Fail);
    }
}
