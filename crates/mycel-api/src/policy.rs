//! Client policy as published by the Mycel directory service

use chrono::Weekday;
use mycel_util::ClientId;
use serde::{Deserialize, Serialize};

use crate::null_as_default;

/// Screen resolution value meaning "leave the display alone"
pub const AUTO_RESOLUTION: &str = "auto";

/// Envelope of `GET /api/clients/?mac=...`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryResponse {
    #[serde(alias = "Client")]
    pub client: ClientPolicy,
}

/// Policy record for one physical terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientPolicy {
    pub id: ClientId,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// `WIDTHxHEIGHT`, or `auto`
    #[serde(default)]
    pub screen_resolution: Option<String>,

    /// Short-time terminals need no credentials and use their own ceiling
    #[serde(
        rename = "shorttime",
        alias = "short_time",
        default,
        deserialize_with = "null_as_default"
    )]
    pub short_time: bool,

    #[serde(
        rename = "options_inherited",
        default,
        deserialize_with = "null_as_default"
    )]
    pub options: Options,

    #[serde(default, deserialize_with = "null_as_default")]
    pub printers: Vec<PrinterSpec>,
}

impl ClientPolicy {
    /// Resolution to force on the display, if any
    pub fn requested_resolution(&self) -> Option<&str> {
        self.screen_resolution
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty() && !r.eq_ignore_ascii_case(AUTO_RESOLUTION))
    }
}

/// Per-client configuration inherited down the directory tree.
///
/// Every field may be unset; consumers fall back to platform defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Options {
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,

    #[serde(default)]
    pub age_limit_lower: Option<i64>,

    #[serde(default)]
    pub age_limit_higher: Option<i64>,

    /// Standard daily minutes on this terminal
    #[serde(default)]
    pub time_limit: Option<i64>,

    #[serde(rename = "shorttime_limit", default)]
    pub short_time_limit: Option<i64>,

    /// Legacy single network printer address
    #[serde(rename = "printeraddr", default)]
    pub printer_address: Option<String>,

    #[serde(default)]
    pub homepage: Option<String>,

    #[serde(default)]
    pub default_printer_id: Option<i64>,
}

/// One printer to install on the terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterSpec {
    pub id: i64,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(rename = "ppd_client", default)]
    pub driver: Option<String>,

    #[serde(rename = "uri_client", default)]
    pub uri: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub info: Option<String>,

    /// Raw `lpadmin` option string
    #[serde(rename = "poptions", default)]
    pub options: Option<String>,
}

/// Opening hours of one weekday
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayHours {
    pub opens: Option<String>,
    pub closes: Option<String>,
    pub closed: Option<bool>,
}

impl DayHours {
    pub fn open(opens: impl Into<String>, closes: impl Into<String>) -> Self {
        Self {
            opens: Some(opens.into()),
            closes: Some(closes.into()),
            closed: Some(false),
        }
    }

    pub fn closed() -> Self {
        Self {
            opens: None,
            closes: None,
            closed: Some(true),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.unwrap_or(false)
    }
}

/// Weekly opening hours plus a closing buffer applied to every day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOpeningHours", into = "RawOpeningHours")]
pub struct OpeningHours {
    /// Indexed Monday-first
    days: [DayHours; 7],
    pub minutes_before_closing: Option<i64>,
}

impl OpeningHours {
    pub fn new(minutes_before_closing: Option<i64>) -> Self {
        Self {
            days: Default::default(),
            minutes_before_closing,
        }
    }

    pub fn with_day(mut self, weekday: Weekday, hours: DayHours) -> Self {
        self.days[weekday.num_days_from_monday() as usize] = hours;
        self
    }

    /// Same hours every day of the week
    pub fn every_day(hours: DayHours, minutes_before_closing: Option<i64>) -> Self {
        Self {
            days: std::array::from_fn(|_| hours.clone()),
            minutes_before_closing,
        }
    }

    pub fn day(&self, weekday: Weekday) -> &DayHours {
        &self.days[weekday.num_days_from_monday() as usize]
    }
}

/// Flat wire layout of the opening-hours table.
///
/// The directory spells Wednesday `wednsday`; the correct spelling is accepted
/// on input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawOpeningHours {
    #[serde(default)]
    monday_opens: Option<String>,
    #[serde(default)]
    monday_closes: Option<String>,
    #[serde(default)]
    monday_closed: Option<bool>,
    #[serde(default)]
    tuesday_opens: Option<String>,
    #[serde(default)]
    tuesday_closes: Option<String>,
    #[serde(default)]
    tuesday_closed: Option<bool>,
    #[serde(rename = "wednsday_opens", alias = "wednesday_opens", default)]
    wednesday_opens: Option<String>,
    #[serde(rename = "wednsday_closes", alias = "wednesday_closes", default)]
    wednesday_closes: Option<String>,
    #[serde(rename = "wednsday_closed", alias = "wednesday_closed", default)]
    wednesday_closed: Option<bool>,
    #[serde(default)]
    thursday_opens: Option<String>,
    #[serde(default)]
    thursday_closes: Option<String>,
    #[serde(default)]
    thursday_closed: Option<bool>,
    #[serde(default)]
    friday_opens: Option<String>,
    #[serde(default)]
    friday_closes: Option<String>,
    #[serde(default)]
    friday_closed: Option<bool>,
    #[serde(default)]
    saturday_opens: Option<String>,
    #[serde(default)]
    saturday_closes: Option<String>,
    #[serde(default)]
    saturday_closed: Option<bool>,
    #[serde(default)]
    sunday_opens: Option<String>,
    #[serde(default)]
    sunday_closes: Option<String>,
    #[serde(default)]
    sunday_closed: Option<bool>,
    #[serde(default)]
    minutes_before_closing: Option<i64>,
}

impl From<RawOpeningHours> for OpeningHours {
    fn from(raw: RawOpeningHours) -> Self {
        let day = |opens, closes, closed| DayHours {
            opens,
            closes,
            closed,
        };
        Self {
            days: [
                day(raw.monday_opens, raw.monday_closes, raw.monday_closed),
                day(raw.tuesday_opens, raw.tuesday_closes, raw.tuesday_closed),
                day(raw.wednesday_opens, raw.wednesday_closes, raw.wednesday_closed),
                day(raw.thursday_opens, raw.thursday_closes, raw.thursday_closed),
                day(raw.friday_opens, raw.friday_closes, raw.friday_closed),
                day(raw.saturday_opens, raw.saturday_closes, raw.saturday_closed),
                day(raw.sunday_opens, raw.sunday_closes, raw.sunday_closed),
            ],
            minutes_before_closing: raw.minutes_before_closing,
        }
    }
}

impl From<OpeningHours> for RawOpeningHours {
    fn from(hours: OpeningHours) -> Self {
        let [mon, tue, wed, thu, fri, sat, sun] = hours.days;
        Self {
            monday_opens: mon.opens,
            monday_closes: mon.closes,
            monday_closed: mon.closed,
            tuesday_opens: tue.opens,
            tuesday_closes: tue.closes,
            tuesday_closed: tue.closed,
            wednesday_opens: wed.opens,
            wednesday_closes: wed.closes,
            wednesday_closed: wed.closed,
            thursday_opens: thu.opens,
            thursday_closes: thu.closes,
            thursday_closed: thu.closed,
            friday_opens: fri.opens,
            friday_closes: fri.closes,
            friday_closed: fri.closed,
            saturday_opens: sat.opens,
            saturday_closes: sat.closes,
            saturday_closed: sat.closed,
            sunday_opens: sun.opens,
            sunday_closes: sun.closes,
            sunday_closed: sun.closed,
            minutes_before_closing: hours.minutes_before_closing,
        }
    }
}
