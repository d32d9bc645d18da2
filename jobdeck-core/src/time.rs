//! Time math for countdown displays
//!
//! Computes the time left until a target instant, decomposed the way a
//! duration display cascades units (`2d 3h 5m`), and renders it as text.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

use crate::error::{Error, Result};

pub const MILLIS_PER_SECOND: i64 = 1000;
pub const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Text shown for a countdown that has elapsed or has less than a second left
pub const ELAPSED_TEXT: &str = "< 1s";

/// Source of the current instant
///
/// The countdown engine reads time through this trait so that it can be
/// driven by a virtual clock.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by `Utc::now()`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Time left until a target instant
///
/// `seconds`, `minutes` and `hours` are the remainder within their next
/// larger unit; `days` and `total_milliseconds` are totals. All fields are
/// zero or negative once the target has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remaining {
    pub seconds: i64,
    pub minutes: i64,
    pub hours: i64,
    pub days: i64,
    pub total_milliseconds: i64,
}

impl Remaining {
    /// Decompose `target - now`
    pub fn between(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let diff = target.signed_duration_since(now).num_milliseconds();
        Self {
            seconds: (diff % MILLIS_PER_MINUTE) / MILLIS_PER_SECOND,
            minutes: (diff % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE,
            hours: (diff % MILLIS_PER_DAY) / MILLIS_PER_HOUR,
            days: diff / MILLIS_PER_DAY,
            total_milliseconds: diff,
        }
    }

    /// Whether the target is now or in the past
    pub fn is_elapsed(&self) -> bool {
        self.total_milliseconds <= 0
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(3);
        if self.days > 0 {
            parts.push(format!("{}d", self.days));
        }
        if self.hours > 0 {
            parts.push(format!("{}h", self.hours));
        }
        if self.minutes > 0 {
            parts.push(format!("{}m", self.minutes));
        }
        // Seconds only show up in the last minute
        if self.seconds > 0 && self.minutes == 0 && self.hours == 0 && self.days == 0 {
            parts.push(format!("{}s", self.seconds));
        }

        if parts.is_empty() {
            f.write_str(ELAPSED_TEXT)
        } else {
            f.write_str(&parts.join(" "))
        }
    }
}

/// Time left until `target`, measured against the system clock
pub fn remaining(target: DateTime<Utc>) -> Remaining {
    remaining_at(target, SystemClock.now())
}

/// Time left until `target`, measured against `now`
pub fn remaining_at(target: DateTime<Utc>, now: DateTime<Utc>) -> Remaining {
    Remaining::between(target, now)
}

/// Human-readable time left until `target` (e.g. `"2d 3h 5m"`)
pub fn remaining_string(target: DateTime<Utc>) -> String {
    remaining(target).to_string()
}

/// Human-readable time left until `target`, measured against `now`
pub fn remaining_string_at(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    remaining_at(target, now).to_string()
}

/// Parse an RFC 3339 timestamp into an instant
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidInstant(format!("'{}': {}", value, e)))
}

/// Convert milliseconds since the Unix epoch into an instant
pub fn instant_from_millis(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| Error::InvalidInstant(format!("{} ms is out of range", millis)))
}
