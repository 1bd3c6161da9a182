//! Budget calculation
//!
//! Pure functions over the client policy, the authentication result and the
//! wall clock. All arithmetic is in whole minutes.

use chrono::{DateTime, Datelike, Local, Weekday};
use mycel_api::{AuthResponse, ClientPolicy};
use mycel_config::BudgetLimits;
use mycel_util::WallClock;
use std::fmt;
use thiserror::Error;

/// Opening-hours data that cannot produce a closing time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    #[error("no closing time configured for {0}")]
    IncompleteSchedule(Weekday),

    #[error("malformed closing time '{value}' for {day}")]
    MalformedClosingTime { day: Weekday, value: String },

    #[error("closing time '{value}' for {day} does not exist in the local timezone")]
    UnresolvableClosingTime { day: Weekday, value: String },
}

/// Today's schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Sessions must end by `cutoff`, which is the closing time minus
    /// `buffer_minutes`
    Open {
        cutoff: DateTime<Local>,
        buffer_minutes: i64,
    },
    ClosedToday,
}

/// Compute today's session cutoff from the policy's opening hours
pub fn closing_cutoff(policy: &ClientPolicy, now: DateTime<Local>) -> Result<Schedule, BudgetError> {
    let weekday = now.weekday();

    let Some(hours) = policy.options.opening_hours.as_ref() else {
        return Err(BudgetError::IncompleteSchedule(weekday));
    };

    let day = hours.day(weekday);
    if day.is_closed() {
        return Ok(Schedule::ClosedToday);
    }

    let closes = day
        .closes
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(BudgetError::IncompleteSchedule(weekday))?;

    let closing = WallClock::parse(closes)
        .ok_or_else(|| BudgetError::MalformedClosingTime {
            day: weekday,
            value: closes.to_string(),
        })?
        .on_date(now.date_naive())
        .ok_or_else(|| BudgetError::UnresolvableClosingTime {
            day: weekday,
            value: closes.to_string(),
        })?;

    let buffer_minutes = hours.minutes_before_closing.unwrap_or(0).max(0);

    Ok(Schedule::Open {
        cutoff: closing - chrono::Duration::minutes(buffer_minutes),
        buffer_minutes,
    })
}

/// How the patron got in
#[derive(Debug, Clone, Copy)]
pub enum Grant<'a> {
    /// Credential-less session on a short-time terminal
    ShortTime,
    Patron(&'a AuthResponse),
}

/// Minutes granted to a session.
///
/// `granted` is what the server counts; `extra` is the terminal's adjustment
/// on top of it and may be negative. Pings from the server report the
/// patron's quota, so the pump adds `extra` to every reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allotment {
    pub granted: i64,
    pub extra: i64,
}

impl Allotment {
    pub fn total(&self) -> i64 {
        self.granted + self.extra
    }
}

/// Compute the allotment for a grant, clamped to the time left until closing
pub fn allot(
    policy: &ClientPolicy,
    grant: Grant<'_>,
    limits: &BudgetLimits,
    until_close: i64,
) -> Allotment {
    let mut allotment = allot_unclamped(policy, grant, limits);

    if allotment.total() > until_close {
        allotment.extra = until_close - allotment.granted;
    }

    allotment
}

fn allot_unclamped(policy: &ClientPolicy, grant: Grant<'_>, limits: &BudgetLimits) -> Allotment {
    let options = &policy.options;

    match grant {
        Grant::ShortTime => Allotment {
            granted: options
                .short_time_limit
                .unwrap_or(limits.default_short_time_limit),
            extra: 0,
        },
        Grant::Patron(auth) => {
            let configured = configured_limit(policy, limits);
            let extra = if auth.is_guest() {
                configured.min(auth.minutes) - auth.minutes
            } else {
                configured - limits.baseline_minutes
            };
            Allotment {
                granted: auth.minutes,
                extra,
            }
        }
    }
}

fn configured_limit(policy: &ClientPolicy, limits: &BudgetLimits) -> i64 {
    policy
        .options
        .time_limit
        .unwrap_or(limits.default_time_limit)
}

/// Why a login attempt was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginRejection {
    /// The server refused the credentials; carries its explanation
    Denied(String),
    /// The authentication service could not be reached
    Unreachable,
    QuotaExhausted,
    AgeRestricted {
        lower: Option<i64>,
        upper: Option<i64>,
    },
}

impl fmt::Display for LoginRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Denied(msg) if !msg.trim().is_empty() => write!(f, "{}", msg.trim()),
            Self::Denied(_) => write!(f, "Wrong username or password."),
            Self::Unreachable => write!(f, "Could not reach the login service. Please try again."),
            Self::QuotaExhausted => write!(f, "You have used all your time today."),
            Self::AgeRestricted {
                lower: Some(lo),
                upper: Some(hi),
            } => write!(f, "This machine is reserved for ages {lo} to {hi}."),
            Self::AgeRestricted {
                lower: Some(lo),
                upper: None,
            } => write!(f, "This machine is reserved for ages {lo} and up."),
            Self::AgeRestricted {
                lower: None,
                upper: Some(hi),
            } => write!(f, "This machine is reserved for ages up to {hi}."),
            Self::AgeRestricted { .. } => write!(f, "This machine is age restricted."),
        }
    }
}

/// Decide whether an authenticated patron may start a session here
pub fn check_patron(
    auth: &AuthResponse,
    policy: &ClientPolicy,
    limits: &BudgetLimits,
) -> Result<(), LoginRejection> {
    if !auth.authenticated {
        return Err(LoginRejection::Denied(auth.message.clone()));
    }

    // Quota is judged against the terminal's adjustment for every account
    // type; the guest cap only applies once the session is granted.
    let adjustment = configured_limit(policy, limits) - limits.baseline_minutes;
    if auth.minutes + adjustment <= 0 {
        return Err(LoginRejection::QuotaExhausted);
    }

    let lower = policy.options.age_limit_lower;
    let upper = policy.options.age_limit_higher;
    let too_young = lower.is_some_and(|lo| auth.age < lo);
    let too_old = upper.is_some_and(|hi| auth.age > hi);
    if too_young || too_old {
        return Err(LoginRejection::AgeRestricted { lower, upper });
    }

    Ok(())
}
