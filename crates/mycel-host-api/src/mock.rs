//! Mock collaborators for testing

use async_trait::async_trait;
use mycel_api::{AuthResponse, ClientPolicy, Credentials, HardwareSpecs, PrinterSpec};
use mycel_util::HardwareId;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::{
    AuthService, Directory, Environment, Frontend, HostError, HostResult, IdentityError,
    SessionView,
};

/// Directory with scripted lookup results.
///
/// Queued results are returned first; once the queue is empty every lookup
/// returns the fallback policy, or `NotRegistered` when there is none.
pub struct MockDirectory {
    lookups: Mutex<VecDeque<Result<ClientPolicy, IdentityError>>>,
    fallback: Mutex<Option<ClientPolicy>>,
    lookup_calls: AtomicUsize,
    keep_alives: AtomicUsize,
    reported: Mutex<Vec<HardwareSpecs>>,

    /// Configure keep-alive to fail
    pub fail_keep_alive: Arc<Mutex<bool>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self {
            lookups: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            lookup_calls: AtomicUsize::new(0),
            keep_alives: AtomicUsize::new(0),
            reported: Mutex::new(Vec::new()),
            fail_keep_alive: Arc::new(Mutex::new(false)),
        }
    }

    /// Every lookup returns this policy
    pub fn with_policy(policy: ClientPolicy) -> Self {
        let directory = Self::new();
        *directory.fallback.lock().unwrap() = Some(policy);
        directory
    }

    /// Queue a result ahead of the fallback
    pub fn push_lookup(&self, result: Result<ClientPolicy, IdentityError>) {
        self.lookups.lock().unwrap().push_back(result);
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn keep_alive_calls(&self) -> usize {
        self.keep_alives.load(Ordering::SeqCst)
    }

    pub fn reported_specs(&self) -> Vec<HardwareSpecs> {
        self.reported.lock().unwrap().clone()
    }
}

impl Default for MockDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Directory for MockDirectory {
    async fn lookup(&self, hardware_id: &HardwareId) -> Result<ClientPolicy, IdentityError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(result) = self.lookups.lock().unwrap().pop_front() {
            return result;
        }

        self.fallback
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| IdentityError::NotRegistered(hardware_id.clone()))
    }

    async fn keep_alive(&self, _hardware_id: &HardwareId) -> HostResult<()> {
        self.keep_alives.fetch_add(1, Ordering::SeqCst);
        if *self.fail_keep_alive.lock().unwrap() {
            return Err(HostError::Network("Mock keep-alive failure".into()));
        }
        Ok(())
    }

    async fn report_specs(&self, specs: &HardwareSpecs) -> HostResult<()> {
        self.reported.lock().unwrap().push(specs.clone());
        Ok(())
    }
}

/// Authentication service answering from a queue
#[derive(Default)]
pub struct MockAuth {
    responses: Mutex<VecDeque<HostResult<AuthResponse>>>,
    seen: Mutex<Vec<Credentials>>,
}

impl MockAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: AuthResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn push_error(&self, error: HostError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Credentials received so far, in order
    pub fn seen(&self) -> Vec<Credentials> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthService for MockAuth {
    async fn authenticate(&self, credentials: &Credentials) -> HostResult<AuthResponse> {
        self.seen.lock().unwrap().push(credentials.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(HostError::Network("No scripted response".into())))
    }
}

/// Frontend interactions recorded by [`MockFrontend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontendCall {
    LoginShown { client_name: String },
    ShortTimeShown { client_name: String, minutes: i64 },
    Rejection(String),
    Session(SessionView),
    Remaining { minutes: i64, low_time: bool },
    LowTimeWarning(i64),
    Notice(String),
    Closed,
}

/// Frontend that replays scripted patron input.
///
/// With no credentials left, `request_credentials` fails with
/// `FrontendClosed`, as if the window had been destroyed.
pub struct MockFrontend {
    credentials: Mutex<VecDeque<Credentials>>,
    calls: Mutex<Vec<FrontendCall>>,
    logout: Notify,
}

impl MockFrontend {
    pub fn new() -> Self {
        Self {
            credentials: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            logout: Notify::new(),
        }
    }

    pub fn push_credentials(&self, credentials: Credentials) {
        self.credentials.lock().unwrap().push_back(credentials);
    }

    /// Simulate the patron pressing the logout button
    pub fn request_logout(&self) {
        self.logout.notify_one();
    }

    pub fn calls(&self) -> Vec<FrontendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&FrontendCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: FrontendCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Default for MockFrontend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Frontend for MockFrontend {
    async fn request_credentials(&self, client_name: &str) -> HostResult<Credentials> {
        self.record(FrontendCall::LoginShown {
            client_name: client_name.into(),
        });
        self.credentials
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(HostError::FrontendClosed)
    }

    async fn confirm_short_time(&self, client_name: &str, minutes: i64) -> HostResult<()> {
        self.record(FrontendCall::ShortTimeShown {
            client_name: client_name.into(),
            minutes,
        });
        Ok(())
    }

    async fn show_rejection(&self, message: &str) -> HostResult<()> {
        self.record(FrontendCall::Rejection(message.into()));
        Ok(())
    }

    async fn show_session(&self, view: &SessionView) -> HostResult<()> {
        self.record(FrontendCall::Session(view.clone()));
        Ok(())
    }

    async fn update_remaining(&self, minutes: i64, low_time: bool) -> HostResult<()> {
        self.record(FrontendCall::Remaining { minutes, low_time });
        Ok(())
    }

    async fn warn_low_time(&self, minutes: i64) -> HostResult<()> {
        self.record(FrontendCall::LowTimeWarning(minutes));
        Ok(())
    }

    async fn show_notice(&self, message: &str) -> HostResult<()> {
        self.record(FrontendCall::Notice(message.into()));
        Ok(())
    }

    async fn logout_requested(&self) {
        self.logout.notified().await;
    }

    async fn close(&self) -> HostResult<()> {
        self.record(FrontendCall::Closed);
        Ok(())
    }
}

/// Environment changes recorded by [`MockEnvironment`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentCall {
    Resolution(String),
    Homepage(String),
    Printers {
        ids: Vec<i64>,
        default_printer_id: Option<i64>,
        legacy_address: Option<String>,
    },
    EndSession,
}

/// Environment that records instead of touching the machine
#[derive(Default)]
pub struct MockEnvironment {
    calls: Mutex<Vec<EnvironmentCall>>,

    /// Configure every shell-out to fail
    pub fail_commands: Arc<Mutex<bool>>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EnvironmentCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: EnvironmentCall) -> HostResult<()> {
        self.calls.lock().unwrap().push(call);
        if *self.fail_commands.lock().unwrap() {
            return Err(HostError::command("mock", "Mock command failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl Environment for MockEnvironment {
    async fn apply_screen_resolution(&self, resolution: &str) -> HostResult<()> {
        self.record(EnvironmentCall::Resolution(resolution.into()))
    }

    async fn apply_homepage(&self, url: &str) -> HostResult<()> {
        self.record(EnvironmentCall::Homepage(url.into()))
    }

    async fn apply_printers(
        &self,
        printers: &[PrinterSpec],
        default_printer_id: Option<i64>,
        legacy_address: Option<&str>,
    ) -> HostResult<()> {
        self.record(EnvironmentCall::Printers {
            ids: printers.iter().map(|p| p.id).collect(),
            default_printer_id,
            legacy_address: legacy_address.map(str::to_string),
        })
    }

    async fn collect_hardware_specs(&self, hardware_id: &HardwareId) -> HostResult<HardwareSpecs> {
        Ok(HardwareSpecs::for_mac(hardware_id.as_str()))
    }

    async fn end_session(&self) -> HostResult<()> {
        self.record(EnvironmentCall::EndSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mycel_util::ClientId;

    fn policy() -> ClientPolicy {
        ClientPolicy {
            id: ClientId::new(3),
            name: "Terminal 3".into(),
            screen_resolution: None,
            short_time: false,
            options: Default::default(),
            printers: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_directory_queue_then_fallback() {
        let directory = MockDirectory::with_policy(policy());
        directory.push_lookup(Err(IdentityError::Transient("down".into())));

        let hw = HardwareId::new("aa:bb");
        assert!(directory.lookup(&hw).await.is_err());
        assert_eq!(directory.lookup(&hw).await.unwrap().id, ClientId::new(3));
        assert_eq!(directory.lookup_calls(), 2);
    }

    #[tokio::test]
    async fn test_directory_without_policy_is_unregistered() {
        let directory = MockDirectory::new();
        let hw = HardwareId::new("aa:bb");
        assert_eq!(
            directory.lookup(&hw).await,
            Err(IdentityError::NotRegistered(hw))
        );
    }

    #[tokio::test]
    async fn test_frontend_runs_out_of_credentials() {
        let frontend = MockFrontend::new();
        frontend.push_credentials(Credentials::new("n1", "1234"));

        assert!(frontend.request_credentials("T").await.is_ok());
        assert!(matches!(
            frontend.request_credentials("T").await,
            Err(HostError::FrontendClosed)
        ));
    }

    #[tokio::test]
    async fn test_logout_request_is_remembered() {
        let frontend = MockFrontend::new();
        frontend.request_logout();
        // notify_one stores a permit, so a later wait completes immediately
        frontend.logout_requested().await;
    }

    #[tokio::test]
    async fn test_environment_failure_still_records() {
        let env = MockEnvironment::new();
        *env.fail_commands.lock().unwrap() = true;

        assert!(env.apply_homepage("https://example.org").await.is_err());
        assert_eq!(
            env.calls(),
            vec![EnvironmentCall::Homepage("https://example.org".into())]
        );
    }
}
