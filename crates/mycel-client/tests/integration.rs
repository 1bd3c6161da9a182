//! Integration tests for mycel-client
//!
//! These drive the session machine end to end: configuration from TOML, the
//! GTK frontend bridge (without a display) acting as the patron, and scripted
//! directory, login service, environment and live channel.

use chrono::{Local, TimeZone};
use mycel_api::{
    AuthResponse, ChannelAction, ClientPolicy, DayHours, OpeningHours, Options, ANONYMOUS_USER,
};
use mycel_channel::{MockPeer, MockTransport};
use mycel_config::{load_config_with, parse_config, ClientConfig, Overrides};
use mycel_core::{Collaborators, EndReason, FixedClock, SessionMachine, SessionSummary};
use mycel_host_api::{EnvironmentCall, MockAuth, MockDirectory, MockEnvironment};
use mycel_ui::{frontend_pair, FrontendState, UiLink};
use mycel_util::{ClientId, HardwareId, MycelError, RetryPolicy};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

const CONFIG: &str = r#"
config_version = 1

[server]
api_url = "http://mycel.test:9000"
ws_url = "ws://mycel.test:9001"

[client]
hardware_id = "08:00:27:aa:bb:cc"

[timing]
retry_delay_ms = 1

[session]
warning_minutes = 10
"#;

fn policy() -> ClientPolicy {
    ClientPolicy {
        id: ClientId::new(12),
        name: "Voksen 12".into(),
        screen_resolution: Some("auto".into()),
        short_time: false,
        options: Options {
            time_limit: Some(60),
            homepage: Some("https://deichman.no".into()),
            opening_hours: Some(OpeningHours::every_day(
                DayHours::open("09:00", "21:00"),
                Some(10),
            )),
            ..Default::default()
        },
        printers: Vec::new(),
    }
}

fn patron(minutes: i64) -> AuthResponse {
    AuthResponse {
        age: 41,
        authenticated: true,
        message: String::new(),
        minutes,
        account_type: "V".into(),
    }
}

struct Kiosk {
    directory: Arc<MockDirectory>,
    auth: Arc<MockAuth>,
    environment: Arc<MockEnvironment>,
    transport: Arc<MockTransport>,
}

impl Kiosk {
    fn new(policy: ClientPolicy) -> Self {
        Self {
            directory: Arc::new(MockDirectory::with_policy(policy)),
            auth: Arc::new(MockAuth::new()),
            environment: Arc::new(MockEnvironment::new()),
            transport: Arc::new(MockTransport::new()),
        }
    }

    /// Machine at Wednesday 2025-12-24 18:00 plus the patron's side of the UI
    fn start(&self, config: ClientConfig) -> (SessionMachine, UiLink) {
        let (frontend, link) = frontend_pair();
        let now = Local.with_ymd_and_hms(2025, 12, 24, 18, 0, 0).single().unwrap();
        let hardware_id = HardwareId::new(config.identity.hardware_id.clone().unwrap());

        let machine = SessionMachine::new(
            config,
            hardware_id,
            Collaborators {
                directory: self.directory.clone(),
                auth: self.auth.clone(),
                frontend: Arc::new(frontend),
                environment: self.environment.clone(),
                transport: self.transport.clone(),
                clock: Arc::new(FixedClock(now)),
            },
        );
        (machine, link)
    }
}

async fn wait_for(link: &UiLink, pred: impl FnMut(&FrontendState) -> bool) {
    let mut rx = link.state().subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("frontend state not reached")
        .expect("frontend state dropped");
}

async fn run(mut machine: SessionMachine) -> Result<SessionSummary, MycelError> {
    tokio::time::timeout(Duration::from_secs(5), machine.run())
        .await
        .expect("session did not finish")
}

#[tokio::test]
async fn test_patron_session_from_login_to_time_out() {
    let config = parse_config(CONFIG).unwrap();
    assert_eq!(config.timing.retry, RetryPolicy::fixed(Duration::from_millis(1)));

    let kiosk = Kiosk::new(policy());
    kiosk.auth.push_response(patron(45));
    let peer = kiosk.transport.accept();
    peer.logged_on("n0001");

    let (machine, link) = kiosk.start(config);
    let session = tokio::spawn(run(machine));

    wait_for(&link, |s| matches!(s, FrontendState::Login { client_name, .. } if client_name == "Voksen 12")).await;
    link.submit_credentials("n0001", "1234");

    // Budget: 45 minutes; the library closes 21:00 with a 10 minute buffer
    wait_for(&link, |s| matches!(s, FrontendState::Session { minutes: 45, .. })).await;

    peer.ping("n0001", 8);
    wait_for(&link, |s| {
        matches!(s, FrontendState::Session { minutes: 8, low_time: true, warning: Some(_), .. })
    })
    .await;

    peer.ping("n0001", 0);
    let summary = session.await.unwrap().unwrap();

    assert_eq!(summary.reason, EndReason::TimeExhausted);
    assert_eq!(summary.user, "n0001");
    assert_eq!(summary.client_id, ClientId::new(12));
    assert_eq!(link.state().get(), FrontendState::Closed);

    assert_eq!(
        kiosk.transport.sent_actions(),
        vec![ChannelAction::LogOn, ChannelAction::LogOff]
    );
    let env = kiosk.environment.calls();
    assert!(env.contains(&EnvironmentCall::Homepage("https://deichman.no".into())));
    assert!(!env.iter().any(|c| matches!(c, EnvironmentCall::Resolution(_))));
    assert_eq!(env.last(), Some(&EnvironmentCall::EndSession));
}

#[tokio::test]
async fn test_rejected_patron_sees_reason_and_retries() {
    let kiosk = Kiosk::new(policy());
    kiosk.auth.push_response(AuthResponse {
        authenticated: false,
        message: "Unknown card number".into(),
        ..Default::default()
    });
    kiosk.auth.push_response(patron(60));
    let peer = kiosk.transport.accept();
    peer.logged_on("n0002");

    let (machine, link) = kiosk.start(parse_config(CONFIG).unwrap());
    let session = tokio::spawn(run(machine));

    link.submit_credentials("n0002", "0000");
    wait_for(&link, |s| {
        matches!(s, FrontendState::Login { message: Some(m), .. } if m == "Unknown card number")
    })
    .await;

    link.submit_credentials("n0002", "1234");
    wait_for(&link, |s| matches!(s, FrontendState::Session { .. })).await;
    link.request_logout();

    let summary = session.await.unwrap().unwrap();
    assert_eq!(summary.reason, EndReason::LoggedOut);
    assert_eq!(kiosk.auth.seen().len(), 2);
    drop(peer);
}

#[tokio::test]
async fn test_short_time_terminal_starts_without_credentials() {
    let mut short = policy();
    short.short_time = true;
    short.options.short_time_limit = Some(15);
    let kiosk = Kiosk::new(short);
    let peer = kiosk.transport.accept();
    peer.logged_on(ANONYMOUS_USER);

    let (machine, link) = kiosk.start(parse_config(CONFIG).unwrap());
    let session = tokio::spawn(run(machine));

    wait_for(&link, |s| matches!(s, FrontendState::ShortTime { minutes: 15, .. })).await;
    link.start_short_time();
    wait_for(&link, |s| matches!(s, FrontendState::Session { minutes: 15, .. })).await;

    peer.ping(ANONYMOUS_USER, -2);
    let summary = session.await.unwrap().unwrap();

    assert_eq!(summary.user, ANONYMOUS_USER);
    assert_eq!(summary.reason, EndReason::TimeExhausted);
    assert!(kiosk.auth.seen().is_empty());
}

#[tokio::test]
async fn test_channel_drop_reconnects_without_new_login() {
    let kiosk = Kiosk::new(policy());
    kiosk.auth.push_response(patron(60));
    let first = kiosk.transport.accept();
    first.logged_on("n0003");
    let second: MockPeer = kiosk.transport.accept();
    second.logged_on("n0003");

    let (machine, link) = kiosk.start(parse_config(CONFIG).unwrap());
    let session = tokio::spawn(run(machine));

    link.submit_credentials("n0003", "1234");
    wait_for(&link, |s| matches!(s, FrontendState::Session { .. })).await;

    first.close();
    second.ping("n0003", 20);
    wait_for(&link, |s| matches!(s, FrontendState::Session { minutes: 20, .. })).await;
    second.ping("n0003", 0);

    let summary = session.await.unwrap().unwrap();
    assert_eq!(summary.activations, 2);
    assert_eq!(kiosk.auth.seen().len(), 1);
    assert_eq!(kiosk.transport.dials(), 2);
}

#[tokio::test]
async fn test_unregistered_machine_shows_notice() {
    let kiosk = Kiosk::new(policy());
    kiosk
        .directory
        .push_lookup(Err(mycel_host_api::IdentityError::NotRegistered(HardwareId::new(
            "08:00:27:aa:bb:cc",
        ))));

    let (machine, link) = kiosk.start(parse_config(CONFIG).unwrap());
    let result = run(machine).await;

    assert!(matches!(result, Err(MycelError::NotRegistered(_))));
    assert!(matches!(
        link.state().get(),
        FrontendState::Notice { message } if message.contains("not registered")
    ));
    assert_eq!(kiosk.transport.dials(), 0);
}

#[test]
fn test_config_file_with_cli_overrides() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", CONFIG).unwrap();

    let overrides = Overrides {
        ws_url: Some("wss://mycel.example.org".into()),
        ..Default::default()
    };
    let config = load_config_with(file.path(), &overrides).unwrap();

    assert_eq!(config.server.api_url, "http://mycel.test:9000");
    assert_eq!(
        config.channel_endpoint(ClientId::new(12)),
        "wss://mycel.example.org/subscribe/clients/12"
    );
    assert_eq!(config.warning_minutes, 10);
}
