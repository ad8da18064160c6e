// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parsing of user-supplied TTL expressions into an absolute instant.
//!
//! Accepted forms, tried in order (first match wins):
//!
//! 1. Offsets: `30m`, `2h`, `2h30m`, `1.5h`, `90s` (signed, so `-1h` is
//!    recognised and rejected as non-positive)
//! 2. Days shorthand: `7d`, `30d`
//! 3. Phrases: `6 hours`, `3 days`, `2 weeks`, `1 day 6 hours`
//! 4. Relative expressions: `tomorrow`, `next monday`, `next week`,
//!    `in 2 hours`, `3 days from now`

use chrono::{DateTime, Datelike, Months, TimeDelta, Utc, Weekday};
use thiserror::Error;

/// Upper bound on a TTL.
///
/// Schedules carry no year (see [`crate::schedule`]), so anything close to a
/// year out would be indistinguishable from a date in the next few weeks.
pub const MAX_TTL_DAYS: i64 = 330;

const SECS_PER_MINUTE: f64 = 60.0;
const SECS_PER_HOUR: f64 = 3600.0;
const SECS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeInputError {
    #[error("duration must be positive, got {0:?}")]
    NotPositive(String),
    #[error("{input:?} exceeds maximum TTL of {max_days} days")]
    ExceedsMaximum { input: String, max_days: i64 },
    #[error("{0:?} resolves to a time that is not in the future")]
    NotInFuture(String),
    #[error(
        "unable to parse {0:?}; expected a duration (30m, 2h, 7d), a phrase \
         (3 days, 2 weeks) or a relative time (tomorrow, next monday, in 2 hours)"
    )]
    Unrecognized(String),
}

type Parsed = Option<Result<DateTime<Utc>, TimeInputError>>;

/// Resolve a TTL expression against `now`.
pub fn parse_time_input(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, TimeInputError> {
    let input = input.trim();
    let parsers: [fn(&str, DateTime<Utc>) -> Parsed; 4] =
        [parse_offset, parse_days, parse_phrase, parse_relative];

    for parser in parsers {
        if let Some(result) = parser(input, now) {
            return result;
        }
    }
    Err(TimeInputError::Unrecognized(input.to_string()))
}

/// Parse a plain positive duration such as `10m`, `90s` or `1h30m`.
pub fn parse_duration(input: &str) -> Result<TimeDelta, TimeInputError> {
    let input = input.trim();
    match offset_delta(input) {
        Some(delta) if delta > TimeDelta::zero() => Ok(delta),
        Some(_) => Err(TimeInputError::NotPositive(input.to_string())),
        None => Err(TimeInputError::Unrecognized(input.to_string())),
    }
}

fn max_ttl() -> TimeDelta {
    TimeDelta::seconds(MAX_TTL_DAYS * SECS_PER_DAY)
}

/// Validate a relative offset and apply it.
fn apply_offset(
    input: &str,
    now: DateTime<Utc>,
    delta: TimeDelta,
) -> Result<DateTime<Utc>, TimeInputError> {
    if delta <= TimeDelta::zero() {
        return Err(TimeInputError::NotPositive(input.to_string()));
    }
    if delta > max_ttl() {
        return Err(TimeInputError::ExceedsMaximum {
            input: input.to_string(),
            max_days: MAX_TTL_DAYS,
        });
    }
    now.checked_add_signed(delta).ok_or_else(|| TimeInputError::ExceedsMaximum {
        input: input.to_string(),
        max_days: MAX_TTL_DAYS,
    })
}

/// Validate an absolute instant produced by a relative expression.
fn check_instant(
    input: &str,
    now: DateTime<Utc>,
    at: DateTime<Utc>,
) -> Result<DateTime<Utc>, TimeInputError> {
    if at <= now {
        return Err(TimeInputError::NotInFuture(input.to_string()));
    }
    if at - now > max_ttl() {
        return Err(TimeInputError::ExceedsMaximum {
            input: input.to_string(),
            max_days: MAX_TTL_DAYS,
        });
    }
    Ok(at)
}

// ── 1. Offsets ──────────────────────────────────────────────────────────

fn parse_offset(input: &str, now: DateTime<Utc>) -> Parsed {
    let delta = offset_delta(input)?;
    Some(apply_offset(input, now, delta))
}

/// `[+-]?(<number><unit>)+` with units `s`, `m`, `h`; a bare `0` is zero.
fn offset_delta(input: &str) -> Option<TimeDelta> {
    let (negative, body) = match input.as_bytes().first()? {
        b'-' => (true, &input[1..]),
        b'+' => (false, &input[1..]),
        _ => (false, input),
    };
    if body == "0" {
        return Some(TimeDelta::zero());
    }
    if body.is_empty() {
        return None;
    }

    let mut total_secs = 0.0_f64;
    let mut rest = body;
    while !rest.is_empty() {
        let num_end = rest.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
        if num_end == 0 {
            return None;
        }
        let value: f64 = rest[..num_end].parse().ok()?;
        rest = &rest[num_end..];

        let unit_end = rest.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(rest.len());
        let multiplier = match &rest[..unit_end] {
            "s" => 1.0,
            "m" => SECS_PER_MINUTE,
            "h" => SECS_PER_HOUR,
            _ => return None,
        };
        rest = &rest[unit_end..];
        total_secs += value * multiplier;
    }

    let millis = (total_secs * 1000.0).round();
    if !millis.is_finite() || millis > i64::MAX as f64 {
        return None;
    }
    let delta = TimeDelta::milliseconds(millis as i64);
    Some(if negative { -delta } else { delta })
}

// ── 2. Days shorthand ───────────────────────────────────────────────────

fn parse_days(input: &str, now: DateTime<Utc>) -> Parsed {
    let digits = input.strip_suffix('d')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let Ok(days) = digits.parse::<i64>() else {
        return Some(Err(TimeInputError::ExceedsMaximum {
            input: input.to_string(),
            max_days: MAX_TTL_DAYS,
        }));
    };
    if days > MAX_TTL_DAYS {
        return Some(Err(TimeInputError::ExceedsMaximum {
            input: input.to_string(),
            max_days: MAX_TTL_DAYS,
        }));
    }
    Some(apply_offset(input, now, TimeDelta::seconds(days * SECS_PER_DAY)))
}

// ── 3. Phrases ──────────────────────────────────────────────────────────

fn parse_phrase(input: &str, now: DateTime<Utc>) -> Parsed {
    let delta = phrase_delta(&input.to_ascii_lowercase())?;
    Some(apply_offset(input, now, delta))
}

/// Sum of `<count> <unit>` pairs, e.g. `1 day 6 hours`, `2weeks`, `an hour`.
fn phrase_delta(phrase: &str) -> Option<TimeDelta> {
    let mut tokens = Vec::new();
    for word in phrase.split(|c: char| c.is_whitespace() || c == ',') {
        if word.is_empty() || word == "and" {
            continue;
        }
        // Split joined forms such as "3days" into "3" + "days"
        match word.find(|c: char| !c.is_ascii_digit()) {
            Some(idx) if idx > 0 => {
                tokens.push(&word[..idx]);
                tokens.push(&word[idx..]);
            }
            _ => tokens.push(word),
        }
    }
    if tokens.is_empty() || tokens.len() % 2 != 0 {
        return None;
    }

    let mut total = 0_i64;
    for pair in tokens.chunks(2) {
        let count: i64 = match pair[0] {
            "a" | "an" | "one" => 1,
            n => n.parse().ok()?,
        };
        let secs = unit_seconds(pair[1])?;
        total = total.checked_add(count.checked_mul(secs)?)?;
    }
    TimeDelta::try_seconds(total)
}

fn unit_seconds(unit: &str) -> Option<i64> {
    Some(match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => SECS_PER_DAY,
        "w" | "wk" | "wks" | "week" | "weeks" => 7 * SECS_PER_DAY,
        "month" | "months" => 30 * SECS_PER_DAY,
        _ => return None,
    })
}

// ── 4. Relative expressions ─────────────────────────────────────────────

fn parse_relative(input: &str, now: DateTime<Utc>) -> Parsed {
    let lower = input.to_ascii_lowercase();
    let lower = lower.trim();

    let at = if lower == "tomorrow" {
        now.checked_add_signed(TimeDelta::days(1))?
    } else if lower == "next week" {
        now.checked_add_signed(TimeDelta::days(7))?
    } else if lower == "next month" {
        now.checked_add_months(Months::new(1))?
    } else if let Some(rest) = lower.strip_prefix("in ") {
        now.checked_add_signed(phrase_delta(rest)?)?
    } else if let Some(rest) = lower.strip_suffix(" from now") {
        now.checked_add_signed(phrase_delta(rest)?)?
    } else {
        let day = lower.strip_prefix("next ").unwrap_or(lower);
        let weekday: Weekday = day.parse().ok()?;
        next_weekday(now, weekday)
    };
    Some(check_instant(input, now, at))
}

/// The next `weekday` strictly after today, at the same time of day.
fn next_weekday(now: DateTime<Utc>, weekday: Weekday) -> DateTime<Utc> {
    let today = now.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    let mut ahead = (target - today).rem_euclid(7);
    if ahead == 0 {
        ahead = 7;
    }
    now + TimeDelta::days(ahead)
}

#[cfg(test)]
#[path = "time_input_tests.rs"]
mod tests;
