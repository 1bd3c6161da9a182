//! Bridge between the session machine and the GTK main loop
//!
//! The machine side ([`GtkFrontend`]) publishes [`FrontendState`] through a
//! watch channel and waits on patron input; the GTK side ([`UiLink`]) renders
//! the state and feeds input back. Neither side blocks the other.

use async_trait::async_trait;
use mycel_api::Credentials;
use mycel_host_api::{Frontend, HostError, HostResult, SessionView};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, Notify};
use tracing::{debug, info};

use crate::state::{FrontendState, SharedState};

/// Create a connected frontend and UI link
pub fn frontend_pair() -> (GtkFrontend, UiLink) {
    let state = SharedState::new();
    let (credentials_tx, credentials_rx) = mpsc::unbounded_channel();
    let (start_tx, start_rx) = mpsc::unbounded_channel();
    let logout = Arc::new(Notify::new());

    let frontend = GtkFrontend {
        state: state.clone(),
        credentials: Mutex::new(credentials_rx),
        start: Mutex::new(start_rx),
        logout: logout.clone(),
    };
    let link = UiLink {
        state,
        credentials: credentials_tx,
        start: start_tx,
        logout,
    };
    (frontend, link)
}

/// Machine-facing half
pub struct GtkFrontend {
    state: SharedState,
    credentials: Mutex<mpsc::UnboundedReceiver<Credentials>>,
    start: Mutex<mpsc::UnboundedReceiver<()>>,
    logout: Arc<Notify>,
}

impl GtkFrontend {
    pub fn state(&self) -> FrontendState {
        self.state.get()
    }
}

#[async_trait]
impl Frontend for GtkFrontend {
    async fn request_credentials(&self, client_name: &str) -> HostResult<Credentials> {
        // Keep a rejection message on screen while asking again
        let message = match self.state.get() {
            FrontendState::Login { message, .. } => message,
            _ => None,
        };
        self.state.set(FrontendState::Login {
            client_name: client_name.to_string(),
            message,
        });

        let mut rx = self.credentials.lock().await;
        let credentials = rx.recv().await.ok_or(HostError::FrontendClosed)?;
        debug!(username = %credentials.username, "Credentials submitted");
        Ok(credentials)
    }

    async fn confirm_short_time(&self, client_name: &str, minutes: i64) -> HostResult<()> {
        self.state.set(FrontendState::ShortTime {
            client_name: client_name.to_string(),
            minutes,
        });

        let mut rx = self.start.lock().await;
        rx.recv().await.ok_or(HostError::FrontendClosed)
    }

    async fn show_rejection(&self, message: &str) -> HostResult<()> {
        let client_name = match self.state.get() {
            FrontendState::Login { client_name, .. } => client_name,
            _ => String::new(),
        };
        self.state.set(FrontendState::Login {
            client_name,
            message: Some(message.to_string()),
        });
        Ok(())
    }

    async fn show_session(&self, view: &SessionView) -> HostResult<()> {
        self.state.set(FrontendState::Session {
            view: view.clone(),
            minutes: view.minutes,
            low_time: false,
            warning: None,
        });
        Ok(())
    }

    async fn update_remaining(&self, minutes: i64, low_time: bool) -> HostResult<()> {
        self.state.update_session(|m, low, _| {
            *m = minutes;
            *low = low_time;
        });
        Ok(())
    }

    async fn warn_low_time(&self, minutes: i64) -> HostResult<()> {
        let text = format!(
            "Only {} left. Save your work, you will be logged out.",
            crate::format_remaining(minutes)
        );
        self.state.update_session(|_, low, warning| {
            *low = true;
            *warning = Some(text);
        });
        Ok(())
    }

    async fn show_notice(&self, message: &str) -> HostResult<()> {
        self.state.set(FrontendState::Notice {
            message: message.to_string(),
        });
        Ok(())
    }

    async fn logout_requested(&self) {
        self.logout.notified().await;
    }

    async fn close(&self) -> HostResult<()> {
        info!("Closing frontend");
        self.state.set(FrontendState::Closed);
        Ok(())
    }
}

/// GTK-facing half; cheap to clone into signal handlers
#[derive(Clone)]
pub struct UiLink {
    state: SharedState,
    credentials: mpsc::UnboundedSender<Credentials>,
    start: mpsc::UnboundedSender<()>,
    logout: Arc<Notify>,
}

impl UiLink {
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn submit_credentials(&self, username: &str, password: &str) {
        if self
            .credentials
            .send(Credentials::new(username.trim(), password))
            .is_err()
        {
            debug!("Credentials dropped, machine no longer listening");
        }
    }

    pub fn start_short_time(&self) {
        let _ = self.start.send(());
    }

    pub fn request_logout(&self) {
        info!("Patron requested logout");
        self.logout.notify_one();
    }
}
