//! Collaborator traits

use async_trait::async_trait;
use mycel_api::{AuthResponse, ClientPolicy, Credentials, HardwareSpecs, PrinterSpec};
use mycel_util::HardwareId;
use thiserror::Error;

/// Errors from collaborator operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Command `{program}` failed: {message}")]
    CommandFailed { program: String, message: String },

    #[error("Frontend closed")]
    FrontendClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HostError {
    pub fn command(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            program: program.into(),
            message: message.into(),
        }
    }
}

pub type HostResult<T> = Result<T, HostError>;

/// Outcome of a directory lookup that did not produce a policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Network failure, timeout or unexpected status; worth retrying
    #[error("Directory unavailable: {0}")]
    Transient(String),

    #[error("Hardware id {0} is not registered")]
    NotRegistered(HardwareId),

    #[error("Undecodable directory response: {0}")]
    Decode(String),
}

impl IdentityError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// The Mycel directory service
#[async_trait]
pub trait Directory: Send + Sync {
    /// Look up the policy for a terminal
    async fn lookup(&self, hardware_id: &HardwareId) -> Result<ClientPolicy, IdentityError>;

    /// Tell the server this terminal is still alive
    async fn keep_alive(&self, hardware_id: &HardwareId) -> HostResult<()>;

    /// Report the terminal's hardware inventory
    async fn report_specs(&self, specs: &HardwareSpecs) -> HostResult<()>;
}

/// Patron authentication
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Check credentials; a refused login is a successful call with
    /// `authenticated == false`
    async fn authenticate(&self, credentials: &Credentials) -> HostResult<AuthResponse>;
}

/// What the status view shows once a session is running
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub client_name: String,
    pub user: String,
    pub minutes: i64,
}

/// The patron-facing screens
///
/// Every method is called from the session core; implementations forward to
/// whatever thread owns the display.
#[async_trait]
pub trait Frontend: Send + Sync {
    /// Show the login screen and wait for the patron to submit credentials
    async fn request_credentials(&self, client_name: &str) -> HostResult<Credentials>;

    /// Show the short-time screen and wait for the patron to press start
    async fn confirm_short_time(&self, client_name: &str, minutes: i64) -> HostResult<()>;

    /// Explain why the last login attempt was refused
    async fn show_rejection(&self, message: &str) -> HostResult<()>;

    /// Replace the login screen with the session status view
    async fn show_session(&self, view: &SessionView) -> HostResult<()>;

    /// Update the countdown; `low_time` selects the warning style
    async fn update_remaining(&self, minutes: i64, low_time: bool) -> HostResult<()>;

    /// One-off notice that the session is about to end
    async fn warn_low_time(&self, minutes: i64) -> HostResult<()>;

    /// Operator-facing notice before the client gives up
    async fn show_notice(&self, message: &str) -> HostResult<()>;

    /// Resolves when the patron asks to log out. Must be cancel safe.
    async fn logout_requested(&self);

    /// Tear down all windows
    async fn close(&self) -> HostResult<()>;
}

/// Local machine configuration and session control
#[async_trait]
pub trait Environment: Send + Sync {
    async fn apply_screen_resolution(&self, resolution: &str) -> HostResult<()>;

    async fn apply_homepage(&self, url: &str) -> HostResult<()>;

    /// Install the given printers. `legacy_address` is only used when the
    /// list is empty.
    async fn apply_printers(
        &self,
        printers: &[PrinterSpec],
        default_printer_id: Option<i64>,
        legacy_address: Option<&str>,
    ) -> HostResult<()>;

    async fn collect_hardware_specs(&self, hardware_id: &HardwareId) -> HostResult<HardwareSpecs>;

    /// End the desktop session so the next patron starts clean
    async fn end_session(&self) -> HostResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_is_retryable() {
        assert!(IdentityError::Transient("timeout".into()).is_transient());
        assert!(!IdentityError::NotRegistered(HardwareId::new("aa")).is_transient());
        assert!(!IdentityError::Decode("eof".into()).is_transient());
    }

    #[test]
    fn command_error_display() {
        let err = HostError::command("xrandr", "exit status 1");
        assert_eq!(err.to_string(), "Command `xrandr` failed: exit status 1");
    }
}
