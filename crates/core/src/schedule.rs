// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot cron schedules.
//!
//! A TTL fires exactly once, so the instant is encoded as
//! `minute hour day-of-month month *`. Cron has no year field, which is
//! why TTLs are capped well under a year (see [`crate::time_input`]).

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use thiserror::Error;

/// How many years ahead to look for a date such as Feb 29.
const MAX_YEAR_LOOKAHEAD: i32 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid cron schedule {schedule:?}: {reason}")]
pub struct ScheduleError {
    pub schedule: String,
    pub reason: String,
}

impl ScheduleError {
    fn new(schedule: &str, reason: impl Into<String>) -> Self {
        Self { schedule: schedule.to_string(), reason: reason.into() }
    }
}

/// Encode an instant as a cron expression (UTC, weekday wildcarded).
pub fn time_to_schedule(at: DateTime<Utc>) -> String {
    format!("{} {} {} {} *", at.minute(), at.hour(), at.day(), at.month())
}

/// Decode a schedule produced by [`time_to_schedule`].
///
/// Returns the next instant at or after `now` matching the encoded
/// minute/hour/day/month. Only used for display.
pub fn parse_schedule(schedule: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
    let fields: Vec<&str> = schedule.split_whitespace().collect();
    let [minute, hour, day, month, weekday] = fields.as_slice() else {
        return Err(ScheduleError::new(
            schedule,
            format!("expected 5 fields, got {}", fields.len()),
        ));
    };
    if *weekday != "*" {
        return Err(ScheduleError::new(schedule, "day-of-week must be '*'"));
    }

    let minute = numeric_field(schedule, "minute", minute, 0, 59)?;
    let hour = numeric_field(schedule, "hour", hour, 0, 23)?;
    let day = numeric_field(schedule, "day-of-month", day, 1, 31)?;
    let month = numeric_field(schedule, "month", month, 1, 12)?;

    for year in now.year()..=now.year() + MAX_YEAR_LOOKAHEAD {
        if let Some(at) = Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).single() {
            if at >= now {
                return Ok(at);
            }
        }
    }
    Err(ScheduleError::new(schedule, format!("day {} never occurs in month {}", day, month)))
}

fn numeric_field(
    schedule: &str,
    name: &str,
    raw: &str,
    min: u32,
    max: u32,
) -> Result<u32, ScheduleError> {
    let value: u32 = raw
        .parse()
        .map_err(|_| ScheduleError::new(schedule, format!("{} {:?} is not a number", name, raw)))?;
    if !(min..=max).contains(&value) {
        return Err(ScheduleError::new(
            schedule,
            format!("{} {} out of range {}-{}", name, value, min, max),
        ));
    }
    Ok(value)
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
