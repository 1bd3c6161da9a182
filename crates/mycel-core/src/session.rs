//! Session state machine

use chrono::{DateTime, Local};
use mycel_channel::SessionSignal;
use mycel_util::{ClientId, MycelError};
use std::fmt;

use crate::Allotment;

/// Phases of one client run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionPhase {
    Idle,
    Identifying,
    Authenticating,
    BudgetComputed,
    ChannelConnecting,
    SessionActive,
    Terminating,
    Terminated,
}

impl SessionPhase {
    /// The only phase this one may move to
    pub fn next(self) -> Option<Self> {
        use SessionPhase::*;
        match self {
            Idle => Some(Identifying),
            Identifying => Some(Authenticating),
            Authenticating => Some(BudgetComputed),
            BudgetComputed => Some(ChannelConnecting),
            ChannelConnecting => Some(SessionActive),
            SessionActive => Some(Terminating),
            Terminating => Some(Terminated),
            Terminated => None,
        }
    }

    pub fn can_transition_to(self, to: Self) -> bool {
        self.next() == Some(to)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Current phase, advanced one step at a time
#[derive(Debug)]
pub struct PhaseTracker {
    phase: SessionPhase,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
        }
    }

    pub fn current(&self) -> SessionPhase {
        self.phase
    }

    pub fn advance_to(&mut self, to: SessionPhase) -> Result<(), MycelError> {
        if !self.phase.can_transition_to(to) {
            return Err(MycelError::InvalidTransition(format!(
                "{} -> {}",
                self.phase, to
            )));
        }
        tracing::debug!(from = %self.phase, to = %to, "Phase transition");
        self.phase = to;
        Ok(())
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// One patron session.
///
/// Owned and mutated by the session machine only.
#[derive(Debug, Clone)]
pub struct Session {
    pub client_id: ClientId,
    pub user: String,
    pub granted: i64,
    pub extra: i64,
    pub cutoff: DateTime<Local>,
    /// Last value shown to the patron
    pub remaining: i64,
}

impl Session {
    pub fn new(
        client_id: ClientId,
        user: impl Into<String>,
        allotment: Allotment,
        cutoff: DateTime<Local>,
    ) -> Self {
        Self {
            client_id,
            user: user.into(),
            granted: allotment.granted,
            extra: allotment.extra,
            cutoff,
            remaining: allotment.total(),
        }
    }

    /// Record a pump signal; returns true when the session is out of time
    pub fn apply(&mut self, signal: SessionSignal) -> bool {
        self.remaining = signal.minutes();
        matches!(signal, SessionSignal::Exhausted(_))
    }
}

/// Fires once when remaining time drops to the threshold, and re-arms if the
/// time goes back above it.
#[derive(Debug, Clone)]
pub struct LowTimeWarning {
    threshold: i64,
    armed: bool,
}

impl LowTimeWarning {
    pub fn new(threshold: i64) -> Self {
        Self {
            threshold,
            armed: true,
        }
    }

    pub fn is_low(&self, minutes: i64) -> bool {
        minutes <= self.threshold
    }

    /// Returns true when the warning should be shown now
    pub fn observe(&mut self, minutes: i64) -> bool {
        if !self.is_low(minutes) {
            self.armed = true;
            return false;
        }
        std::mem::replace(&mut self.armed, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_advance_one_step() {
        let mut tracker = PhaseTracker::new();
        let order = [
            SessionPhase::Identifying,
            SessionPhase::Authenticating,
            SessionPhase::BudgetComputed,
            SessionPhase::ChannelConnecting,
            SessionPhase::SessionActive,
            SessionPhase::Terminating,
            SessionPhase::Terminated,
        ];
        for phase in order {
            tracker.advance_to(phase).unwrap();
        }
        assert_eq!(tracker.current(), SessionPhase::Terminated);
        assert_eq!(SessionPhase::Terminated.next(), None);
    }

    #[test]
    fn test_skipping_a_phase_is_rejected() {
        let mut tracker = PhaseTracker::new();
        let err = tracker.advance_to(SessionPhase::Authenticating).unwrap_err();
        assert!(matches!(err, MycelError::InvalidTransition(_)));
        assert_eq!(tracker.current(), SessionPhase::Idle);
    }

    #[test]
    fn test_terminating_only_once() {
        let mut tracker = PhaseTracker::new();
        for phase in [
            SessionPhase::Identifying,
            SessionPhase::Authenticating,
            SessionPhase::BudgetComputed,
            SessionPhase::ChannelConnecting,
            SessionPhase::SessionActive,
            SessionPhase::Terminating,
        ] {
            tracker.advance_to(phase).unwrap();
        }
        assert!(tracker.advance_to(SessionPhase::Terminating).is_err());
        assert!(tracker.advance_to(SessionPhase::SessionActive).is_err());
    }

    #[test]
    fn test_session_tracks_remaining() {
        let mut session = Session::new(
            ClientId::new(1),
            "n0123",
            Allotment {
                granted: 90,
                extra: 10,
            },
            Local::now(),
        );
        assert_eq!(session.remaining, 100);

        assert!(!session.apply(SessionSignal::Remaining(42)));
        assert_eq!(session.remaining, 42);

        assert!(session.apply(SessionSignal::Exhausted(0)));
        assert_eq!(session.remaining, 0);
    }

    #[test]
    fn test_low_time_warning_fires_once_and_rearms() {
        let mut warning = LowTimeWarning::new(5);

        assert!(!warning.observe(10));
        assert!(warning.observe(5));
        assert!(!warning.observe(4));
        assert!(!warning.observe(3));

        // Quota topped up by staff, then running low again
        assert!(!warning.observe(20));
        assert!(warning.observe(2));
    }
}
