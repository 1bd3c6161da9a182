//! Session machine: drives one client run from identification to logout

use mycel_api::{ClientPolicy, ANONYMOUS_USER};
use mycel_channel::{spawn_pump, LiveChannel, SessionSignal, Transport};
use mycel_config::ClientConfig;
use mycel_host_api::{
    AuthService, Directory, Environment, Frontend, IdentityError, SessionView,
};
use mycel_util::{minutes_until, HardwareId, MycelError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{
    allot, check_patron, closing_cutoff, Allotment, BudgetError, Clock, EndReason, Grant,
    Heartbeat, IdentityResolver, LoginRejection, LowTimeWarning, PhaseTracker, Schedule,
    Session, SessionPhase, SessionSummary,
};

/// Capacity of the pump -> machine signal queue
const SIGNAL_QUEUE: usize = 16;

/// Everything the machine talks to
#[derive(Clone)]
pub struct Collaborators {
    pub directory: Arc<dyn Directory>,
    pub auth: Arc<dyn AuthService>,
    pub frontend: Arc<dyn Frontend>,
    pub environment: Arc<dyn Environment>,
    pub transport: Arc<dyn Transport>,
    pub clock: Arc<dyn Clock>,
}

/// The session machine
pub struct SessionMachine {
    config: ClientConfig,
    hardware_id: HardwareId,
    collab: Collaborators,
    phase: PhaseTracker,
    heartbeat: Option<Heartbeat>,
}

impl SessionMachine {
    pub fn new(config: ClientConfig, hardware_id: HardwareId, collab: Collaborators) -> Self {
        Self {
            config,
            hardware_id,
            collab,
            phase: PhaseTracker::new(),
            heartbeat: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase.current()
    }

    /// Run one session to completion.
    ///
    /// Fatal errors are shown to the operator before they are returned; the
    /// caller only decides how to exit.
    pub async fn run(&mut self) -> Result<SessionSummary, MycelError> {
        match self.run_session().await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                error!(phase = %self.phase(), error = %e, "Session aborted");
                if let Err(notice_err) = self.collab.frontend.show_notice(&e.operator_notice()).await {
                    warn!(error = %notice_err, "Could not show operator notice");
                }
                Err(e)
            }
        }
    }

    async fn run_session(&mut self) -> Result<SessionSummary, MycelError> {
        self.phase.advance_to(SessionPhase::Identifying)?;
        info!(hardware_id = %self.hardware_id, "Identifying client");

        let resolver = IdentityResolver::new(self.collab.directory.clone(), self.config.timing.retry);
        let policy = resolver
            .resolve_until_registered(&self.hardware_id)
            .await
            .map_err(identity_to_fatal)?;

        self.report_specs().await;
        self.heartbeat = Some(Heartbeat::spawn(
            self.collab.directory.clone(),
            self.hardware_id.clone(),
            self.config.timing.heartbeat_interval,
        ));
        self.apply_display_settings(&policy).await;

        let now = self.collab.clock.now();
        let cutoff = match closing_cutoff(&policy, now).map_err(budget_to_fatal)? {
            Schedule::Open {
                cutoff,
                buffer_minutes,
            } => {
                info!(cutoff = %mycel_util::format_clock_time(&cutoff), buffer_minutes, "Closing cutoff");
                cutoff
            }
            Schedule::ClosedToday => return Err(MycelError::ClosedToday),
        };
        if minutes_until(cutoff, now) <= 0 {
            info!("Past today's closing cutoff");
            return Err(MycelError::ClosedToday);
        }

        self.phase.advance_to(SessionPhase::Authenticating)?;
        let (user, allotment) = self.authenticate(&policy, cutoff).await?;

        self.phase.advance_to(SessionPhase::BudgetComputed)?;
        if allotment.total() <= 0 {
            return Err(MycelError::ClosedToday);
        }
        let mut session = Session::new(policy.id, user, allotment, cutoff);
        info!(
            client_id = %session.client_id,
            user = %session.user,
            granted = session.granted,
            extra = session.extra,
            "Budget computed"
        );

        self.phase.advance_to(SessionPhase::ChannelConnecting)?;
        let channel = LiveChannel::connect(
            self.collab.transport.clone(),
            self.config.channel_endpoint(policy.id),
            policy.id,
            session.user.clone(),
            self.config.timing.retry,
        )
        .await;

        self.phase.advance_to(SessionPhase::SessionActive)?;
        let (signal_tx, mut signals) = mpsc::channel(SIGNAL_QUEUE);
        let pump = spawn_pump(channel, session.extra, signal_tx);

        self.refresh_printers(&policy).await;

        let view = SessionView {
            client_name: policy.name.clone(),
            user: session.user.clone(),
            minutes: session.remaining,
        };
        if let Err(e) = self.collab.frontend.show_session(&view).await {
            warn!(error = %e, "Could not show session status");
        }

        let mut warning = LowTimeWarning::new(self.config.warning_minutes);
        self.show_remaining(&mut warning, session.remaining).await;

        let reason = loop {
            tokio::select! {
                biased;
                signal = signals.recv() => {
                    let Some(signal) = signal else {
                        warn!("Session pump stopped");
                        break EndReason::ChannelLost;
                    };
                    if session.apply(signal) {
                        info!(remaining = session.remaining, "Time exhausted");
                        break EndReason::TimeExhausted;
                    }
                    self.show_remaining(&mut warning, session.remaining).await;
                }
                _ = self.collab.frontend.logout_requested() => {
                    info!(user = %session.user, "Logout requested");
                    break EndReason::LoggedOut;
                }
            }
        };

        self.phase.advance_to(SessionPhase::Terminating)?;
        info!(reason = ?reason, "Ending session");

        drop(signals);
        let activations = match pump.stop().await {
            Some(channel) => channel.activations(),
            None => 0,
        };

        if let Err(e) = self.collab.environment.end_session().await {
            warn!(error = %e, "Session cleanup failed");
        }
        if let Err(e) = self.collab.frontend.close().await {
            warn!(error = %e, "Could not close frontend");
        }

        self.phase.advance_to(SessionPhase::Terminated)?;

        Ok(SessionSummary {
            client_id: session.client_id,
            user: session.user,
            granted: session.granted,
            extra: session.extra,
            last_remaining: session.remaining,
            reason,
            activations,
        })
    }

    /// Get a user and an allotment, either from short-time confirmation or by
    /// looping over login attempts until one is accepted
    async fn authenticate(
        &self,
        policy: &ClientPolicy,
        cutoff: chrono::DateTime<chrono::Local>,
    ) -> Result<(String, Allotment), MycelError> {
        let limits = &self.config.budget;
        let frontend = &self.collab.frontend;

        if policy.short_time {
            let until_close = minutes_until(cutoff, self.collab.clock.now());
            let allotment = allot(policy, Grant::ShortTime, limits, until_close);
            frontend
                .confirm_short_time(&policy.name, allotment.total())
                .await
                .map_err(|e| MycelError::frontend(e.to_string()))?;
            info!(minutes = allotment.total(), "Short-time session confirmed");
            return Ok((ANONYMOUS_USER.to_string(), allotment));
        }

        loop {
            let credentials = frontend
                .request_credentials(&policy.name)
                .await
                .map_err(|e| MycelError::frontend(e.to_string()))?;

            let rejection = match self.collab.auth.authenticate(&credentials).await {
                Ok(auth) => match check_patron(&auth, policy, limits) {
                    Ok(()) => {
                        // Login can take a while; measure from when it succeeded
                        let until_close = minutes_until(cutoff, self.collab.clock.now());
                        let allotment = allot(policy, Grant::Patron(&auth), limits, until_close);
                        info!(
                            user = %credentials.username,
                            guest = auth.is_guest(),
                            quota = auth.minutes,
                            "Patron authenticated"
                        );
                        return Ok((credentials.username, allotment));
                    }
                    Err(rejection) => rejection,
                },
                Err(e) => {
                    warn!(error = %e, "Authentication service unavailable");
                    LoginRejection::Unreachable
                }
            };

            info!(user = %credentials.username, rejection = ?rejection, "Login refused");
            frontend
                .show_rejection(&rejection.to_string())
                .await
                .map_err(|e| MycelError::frontend(e.to_string()))?;
        }
    }

    async fn report_specs(&self) {
        let specs = match self
            .collab
            .environment
            .collect_hardware_specs(&self.hardware_id)
            .await
        {
            Ok(specs) => specs,
            Err(e) => {
                warn!(error = %e, "Could not collect hardware specs");
                return;
            }
        };

        match self.collab.directory.report_specs(&specs).await {
            Ok(()) => debug!("Hardware specs reported"),
            Err(e) => warn!(error = %e, "Could not report hardware specs"),
        }
    }

    async fn apply_display_settings(&self, policy: &ClientPolicy) {
        let environment = &self.collab.environment;

        if let Some(resolution) = policy.requested_resolution() {
            if let Err(e) = environment.apply_screen_resolution(resolution).await {
                warn!(resolution, error = %e, "Could not set screen resolution");
            }
        }

        if let Some(homepage) = policy
            .options
            .homepage
            .as_deref()
            .filter(|h| !h.trim().is_empty())
        {
            if let Err(e) = environment.apply_homepage(homepage).await {
                warn!(homepage, error = %e, "Could not set browser homepage");
            }
        }
    }

    /// Install printers from a fresh copy of the policy, falling back to the
    /// one resolved at startup
    async fn refresh_printers(&self, startup: &ClientPolicy) {
        let fresh = match self.collab.directory.lookup(&self.hardware_id).await {
            Ok(policy) => Some(policy),
            Err(e) => {
                warn!(error = %e, "Policy refresh failed, using startup printers");
                None
            }
        };
        let policy = fresh.as_ref().unwrap_or(startup);

        let legacy = if policy.printers.is_empty() {
            policy
                .options
                .printer_address
                .as_deref()
                .filter(|a| !a.trim().is_empty())
        } else {
            None
        };

        if policy.printers.is_empty() && legacy.is_none() {
            debug!("No printers configured");
            return;
        }

        if let Err(e) = self
            .collab
            .environment
            .apply_printers(&policy.printers, policy.options.default_printer_id, legacy)
            .await
        {
            warn!(error = %e, "Could not install printers");
        }
    }

    async fn show_remaining(&self, warning: &mut LowTimeWarning, minutes: i64) {
        let frontend = &self.collab.frontend;

        if let Err(e) = frontend.update_remaining(minutes, warning.is_low(minutes)).await {
            warn!(error = %e, "Could not update remaining time");
        }
        if warning.observe(minutes) {
            info!(minutes, "Low time warning");
            if let Err(e) = frontend.warn_low_time(minutes).await {
                warn!(error = %e, "Could not show low time warning");
            }
        }
    }
}

fn identity_to_fatal(err: IdentityError) -> MycelError {
    match err {
        IdentityError::NotRegistered(hw) => MycelError::NotRegistered(hw),
        IdentityError::Decode(msg) => MycelError::decode(msg),
        IdentityError::Transient(msg) => MycelError::internal(msg),
    }
}

fn budget_to_fatal(err: BudgetError) -> MycelError {
    MycelError::schedule(err.to_string())
}
