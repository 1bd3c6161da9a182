//! mycel-client - library kiosk client
//!
//! Wires together:
//! - Configuration loading (file plus command-line overrides)
//! - Hardware identity
//! - HTTP directory, login service and heartbeat
//! - Live session channel
//! - Desktop environment (screen, browser, printers, session restart)
//! - GTK frontend on the main thread, session machine on tokio

use anyhow::{Context, Result};
use clap::Parser;
use mycel_channel::WsTransport;
use mycel_config::{load_config_with, ClientConfig, Overrides};
use mycel_core::{Collaborators, SessionMachine, SystemClock};
use mycel_host_api::Frontend;
use mycel_host_linux::{read_hardware_id, CommandRunner, LinuxEnvironment, MycelHttpClient};
use mycel_ui::{frontend_pair, KioskApp};
use mycel_util::{default_config_path, HardwareId};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How long an operator notice stays up before the client exits
const NOTICE_HOLD: Duration = Duration::from_secs(30);

/// How long to wait for the machine after the window is gone
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// mycel-client - Library kiosk client for the Mycel server
#[derive(Parser, Debug)]
#[command(name = "mycel-client")]
#[command(about = "Library kiosk client: patron login, time budget and live session channel", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/mycel/client.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// HTTP API base URL (or set MYCEL_API_URL env var)
    #[arg(long, env = "MYCEL_API_URL")]
    api: Option<String>,

    /// Live-channel base URL (or set MYCEL_WS_URL env var)
    #[arg(long, env = "MYCEL_WS_URL")]
    ws: Option<String>,

    /// Network interface whose MAC address identifies this machine
    #[arg(short, long)]
    interface: Option<String>,

    /// Use this hardware id instead of reading the interface address
    #[arg(long, env = "MYCEL_HARDWARE_ID")]
    hardware_id: Option<String>,

    /// Run privileged commands directly instead of through sudo
    #[arg(long)]
    no_sudo: bool,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            api_url: self.api.clone(),
            ws_url: self.ws.clone(),
            interface: self.interface.clone(),
            hardware_id: self.hardware_id.clone(),
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "mycel-client starting");

    let config = load_config_with(&args.config, &args.overrides())
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    info!(
        config_path = %args.config.display(),
        api_url = %config.server.api_url,
        ws_url = %config.server.ws_url,
        "Configuration loaded"
    );

    let hardware_id = resolve_hardware_id(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let (frontend, link) = frontend_pair();
    let frontend = Arc::new(frontend);
    let collab = collaborators(&config, frontend.clone(), args.no_sudo)?;
    let mut machine = SessionMachine::new(config, hardware_id, collab);

    let worker = runtime.spawn(async move {
        let result = machine.run().await;
        if result.is_err() {
            // Leave the operator notice up for a while, then take the window down
            tokio::time::sleep(NOTICE_HOLD).await;
            if let Err(e) = frontend.close().await {
                warn!(error = %e, "Could not close frontend");
            }
        }
        result
    });

    // GTK owns the main thread until the machine closes the frontend
    let ui_status = KioskApp::new(link).run();
    info!(status = ui_status, "Frontend exited");

    let outcome = runtime.block_on(async { tokio::time::timeout(SHUTDOWN_GRACE, worker).await });
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    match outcome {
        Ok(Ok(Ok(summary))) => {
            info!(
                client_id = %summary.client_id,
                user = %summary.user,
                reason = ?summary.reason,
                last_remaining = summary.last_remaining,
                activations = summary.activations,
                "Session finished"
            );
            Ok(ExitCode::SUCCESS)
        }
        Ok(Ok(Err(e))) => {
            error!(error = %e, "Client stopped");
            Ok(ExitCode::FAILURE)
        }
        Ok(Err(e)) => Err(e).context("Session task failed"),
        Err(_) => {
            warn!("Frontend went away while the session was still running");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn resolve_hardware_id(config: &ClientConfig) -> Result<HardwareId> {
    if let Some(id) = &config.identity.hardware_id {
        info!(hardware_id = %id, "Using configured hardware id");
        return Ok(HardwareId::new(id.clone()));
    }

    read_hardware_id(&config.identity.interface).with_context(|| {
        format!(
            "Failed to read hardware address of interface {}",
            config.identity.interface
        )
    })
}

fn collaborators(
    config: &ClientConfig,
    frontend: Arc<dyn Frontend>,
    no_sudo: bool,
) -> Result<Collaborators> {
    let http = Arc::new(
        MycelHttpClient::new(&config.server.api_url, config.server.request_timeout)
            .context("Failed to create HTTP client")?,
    );
    let runner = if no_sudo {
        CommandRunner::new()
    } else {
        CommandRunner::with_sudo()
    };

    Ok(Collaborators {
        directory: http.clone(),
        auth: http,
        frontend,
        environment: Arc::new(LinuxEnvironment::new(runner)),
        transport: Arc::new(WsTransport::new()),
        clock: Arc::new(SystemClock),
    })
}
