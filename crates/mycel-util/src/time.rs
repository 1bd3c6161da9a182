//! Time utilities for the Mycel client
//!
//! Wall-clock time drives every budget decision (closing time, minutes until
//! close). All minute arithmetic is integer and truncates toward zero.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `MYCEL_MOCK_TIME` environment variable overrides the
//! system time for all time-sensitive operations, which is handy for checking
//! closing-time behaviour without waiting for the evening.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-22 19:00:00`)
//!
//! Example:
//! ```bash
//! MYCEL_MOCK_TIME="2025-12-22 19:00:00" ./mycel-client
//! ```

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use std::fmt;
use std::sync::OnceLock;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "MYCEL_MOCK_TIME";

/// Format accepted in `MYCEL_MOCK_TIME`
const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset between mock time and real time at process start, so mock time
/// advances naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) else {
                return None;
            };
            let Ok(naive_dt) = NaiveDateTime::parse_from_str(&mock_time_str, MOCK_TIME_FORMAT)
            else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    expected_format = MOCK_TIME_FORMAT,
                    "Invalid mock time format"
                );
                return None;
            };
            match Local.from_local_datetime(&naive_dt).single() {
                Some(mock_dt) => {
                    let offset = mock_dt.signed_duration_since(chrono::Local::now());
                    tracing::info!(
                        mock_time = %mock_time_str,
                        offset_secs = offset.num_seconds(),
                        "Mock time enabled"
                    );
                    Some(offset)
                }
                None => {
                    tracing::warn!(
                        mock_time = %mock_time_str,
                        "Failed to convert mock time to local timezone"
                    );
                    None
                }
            }
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // the wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Format a DateTime as `HH:MM`
pub fn format_clock_time(dt: &DateTime<Local>) -> String {
    dt.format("%H:%M").to_string()
}

/// Whole minutes from `now` until `later`, truncated toward zero.
///
/// Negative when `later` is already in the past.
pub fn minutes_until(later: DateTime<Local>, now: DateTime<Local>) -> i64 {
    later.signed_duration_since(now).num_minutes()
}

/// A time of day as published in opening-hours tables (`HH:MM`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WallClock {
    pub hour: u8,
    pub minute: u8,
}

impl WallClock {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Parse an `HH:MM` literal. Seconds (`HH:MM:SS`) are tolerated and dropped.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let mut parts = s.split(':');
        let hour = parts.next()?.parse::<u8>().ok()?;
        let minute = parts.next()?.parse::<u8>().ok()?;
        if let Some(seconds) = parts.next() {
            seconds.parse::<u8>().ok().filter(|s| *s < 60)?;
        }
        if parts.next().is_some() {
            return None;
        }
        Self::new(hour, minute)
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }

    /// Place this time of day on `date` in the local timezone.
    ///
    /// An ambiguous time resolves to its earliest instant. A time skipped by
    /// a DST jump moves forward to the first local time after the gap.
    pub fn on_date(self, date: NaiveDate) -> Option<DateTime<Local>> {
        resolve_forward(date.and_time(self.to_naive_time()), |t| {
            Local.from_local_datetime(t)
        })
    }
}

/// Longest DST gap searched past before giving up
const MAX_GAP_MINUTES: i64 = 3 * 60;

fn resolve_forward<T>(
    local: NaiveDateTime,
    lookup: impl Fn(&NaiveDateTime) -> LocalResult<T>,
) -> Option<T> {
    (0..=MAX_GAP_MINUTES).find_map(|step| lookup(&(local + chrono::Duration::minutes(step))).earliest())
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}
