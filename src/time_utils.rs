// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and `HH:MM` clock times.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Minutes in one day; clock arithmetic wraps modulo this value.
pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Build a fixed UTC offset from a number of minutes east of UTC.
pub fn fixed_offset(minutes_east: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes_east.checked_mul(60)?)
}

/// Errors from parsing `HH:MM` strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeParseError {
    #[error("empty time string")]
    Empty,

    #[error("invalid time format: {0}")]
    Format(String),
}

/// Parse an `HH:MM` string into raw minutes (`hours * 60 + minutes`).
///
/// The components are not range-checked, so "25:10" yields 1510; callers that
/// need a time of day go through [`ClockTime`], which wraps. Signs are not
/// accepted, and a total that does not fit in an `i32` is a format error.
pub fn parse_minutes(value: &str) -> Result<i32, TimeParseError> {
    if value.is_empty() {
        return Err(TimeParseError::Empty);
    }
    let invalid = || TimeParseError::Format(value.to_string());
    let (hours, minutes) = value
        .split_once(':')
        .filter(|(_, rest)| !rest.contains(':'))
        .ok_or_else(invalid)?;
    let hours = parse_component(hours).ok_or_else(invalid)?;
    let minutes = parse_component(minutes).ok_or_else(invalid)?;
    hours
        .checked_mul(60)
        .and_then(|h| h.checked_add(minutes))
        .ok_or_else(invalid)
}

/// One unsigned clock component.
fn parse_component(value: &str) -> Option<i32> {
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Like [`parse_minutes`], but unparsable input counts as midnight.
pub fn parse_minutes_or_zero(value: &str) -> i32 {
    parse_minutes(value).unwrap_or(0)
}

/// A wall-clock time of day with minute precision, rendered as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    minutes: u16,
}

impl ClockTime {
    /// Build from minutes since midnight, wrapping into `[0, 1440)`.
    /// Negative values wrap forward ("-30" is 23:30).
    pub fn from_minutes(minutes: i32) -> Self {
        Self {
            minutes: minutes.rem_euclid(MINUTES_PER_DAY) as u16,
        }
    }

    /// The local time of day of an absolute timestamp.
    pub fn from_timestamp(timestamp: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local = timestamp.with_timezone(&offset);
        Self::from_minutes((local.hour() * 60 + local.minute()) as i32)
    }

    pub fn minutes_of_day(self) -> i32 {
        i32::from(self.minutes)
    }

    /// Translate by `delta` minutes, wrapping around midnight.
    pub fn shifted(self, delta: i32) -> Self {
        Self::from_minutes(self.minutes_of_day() + delta.rem_euclid(MINUTES_PER_DAY))
    }

    /// Place this time of day on `date` in the given offset.
    pub fn on_date(self, date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
        let local = date.and_time(NaiveTime::MIN + TimeDelta::minutes(i64::from(self.minutes)));
        let utc = local - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
        DateTime::from_naive_utc_and_offset(utc, Utc)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes / 60, self.minutes % 60)
    }
}

impl FromStr for ClockTime {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_minutes(s).map(Self::from_minutes)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
