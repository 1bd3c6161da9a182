//! What the kiosk window should be showing

use mycel_host_api::SessionView;
use tokio::sync::watch;

/// Current view of the kiosk window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FrontendState {
    /// Waiting for the client to identify itself
    #[default]
    Starting,
    /// Login form; `message` is the reason the last attempt was refused
    Login {
        client_name: String,
        message: Option<String>,
    },
    /// Short-time terminal: one button, no credentials
    ShortTime { client_name: String, minutes: i64 },
    /// Small status window while a patron is logged on
    Session {
        view: SessionView,
        minutes: i64,
        low_time: bool,
        warning: Option<String>,
    },
    /// Operator-facing message; the client is about to give up
    Notice { message: String },
    /// All windows should go away
    Closed,
}

impl FrontendState {
    /// Name of the stack page that renders this state
    pub fn page(&self) -> &'static str {
        match self {
            FrontendState::Starting => "starting",
            FrontendState::Login { .. } => "login",
            FrontendState::ShortTime { .. } => "shorttime",
            FrontendState::Session { .. } => "session",
            FrontendState::Notice { .. } => "notice",
            FrontendState::Closed => "starting",
        }
    }
}

/// Shared state container
#[derive(Clone)]
pub struct SharedState {
    sender: watch::Sender<FrontendState>,
    receiver: watch::Receiver<FrontendState>,
}

impl SharedState {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(FrontendState::default());
        Self { sender, receiver }
    }

    pub fn set(&self, state: FrontendState) {
        // Receivers live as long as `self`, so this cannot fail
        let _ = self.sender.send(state);
    }

    pub fn get(&self) -> FrontendState {
        self.receiver.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FrontendState> {
        self.receiver.clone()
    }

    /// Edit the session view in place; no-op outside a session
    pub fn update_session(&self, f: impl FnOnce(&mut i64, &mut bool, &mut Option<String>)) {
        self.sender.send_if_modified(|state| match state {
            FrontendState::Session {
                minutes,
                low_time,
                warning,
                ..
            } => {
                let before = (*minutes, *low_time, warning.clone());
                f(minutes, low_time, warning);
                before != (*minutes, *low_time, warning.clone())
            }
            _ => false,
        });
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

/// "45 min", "1 h 05 min"
pub fn format_remaining(minutes: i64) -> String {
    let minutes = minutes.max(0);
    if minutes < 60 {
        format!("{} min", minutes)
    } else {
        format!("{} h {:02} min", minutes / 60, minutes % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> FrontendState {
        FrontendState::Session {
            view: SessionView {
                client_name: "Voksen 4".into(),
                user: "kari".into(),
                minutes: 60,
            },
            minutes: 60,
            low_time: false,
            warning: None,
        }
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(45), "45 min");
        assert_eq!(format_remaining(65), "1 h 05 min");
        assert_eq!(format_remaining(-3), "0 min");
    }

    #[test]
    fn test_update_session_outside_session_is_ignored() {
        let state = SharedState::new();
        state.update_session(|minutes, _, _| *minutes = 1);
        assert_eq!(state.get(), FrontendState::Starting);
    }

    #[test]
    fn test_update_session_notifies_only_on_change() {
        let state = SharedState::new();
        state.set(session());
        let mut rx = state.subscribe();
        rx.mark_unchanged();

        state.update_session(|minutes, _, _| *minutes = 60);
        assert!(!rx.has_changed().unwrap());

        state.update_session(|minutes, low, _| {
            *minutes = 4;
            *low = true;
        });
        assert!(rx.has_changed().unwrap());
        assert!(matches!(
            state.get(),
            FrontendState::Session { minutes: 4, low_time: true, .. }
        ));
    }

    #[test]
    fn test_pages() {
        assert_eq!(session().page(), "session");
        assert_eq!(FrontendState::Closed.page(), "starting");
    }
}
