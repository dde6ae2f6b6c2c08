// src/schedule/spec.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};

use crate::errors::{LineageError, Result};
use crate::schedule::cron_expr;
use crate::types::parse_duration;

/// A workflow's declared schedule.
#[derive(Debug, Clone)]
pub enum ScheduleSpec {
    /// `@once`: fires a single time, there is no next occurrence.
    Once,
    /// No schedule at all (`none`); runs are only ever triggered externally.
    Manual,
    /// Recurring cron expression.
    Cron(CronSchedule),
    /// Fixed delta between runs (`"30m"`, `"6h"`, `"1d"`).
    Interval(chrono::Duration),
}

impl ScheduleSpec {
    /// Parse a schedule as written in a workflow definition.
    ///
    /// Accepts `@once`, `none` (or an empty string), the `@hourly` family of
    /// presets, a fixed interval such as `"30m"`, and 5/6/7-field cron
    /// expressions.
    pub fn parse(expr: &str) -> Result<Self> {
        let trimmed = expr.trim();

        match trimmed.to_lowercase().as_str() {
            "" | "none" => return Ok(ScheduleSpec::Manual),
            "@once" => return Ok(ScheduleSpec::Once),
            _ => {}
        }

        if trimmed.starts_with('@') {
            return cron_expr::preset(trimmed)
                .ok_or_else(|| {
                    LineageError::InvalidSchedule(format!("unknown schedule preset '{trimmed}'"))
                })
                .and_then(|expanded| {
                    CronSchedule::from_normalized(trimmed, vec![expanded.to_string()])
                })
                .map(ScheduleSpec::Cron);
        }

        if looks_like_interval(trimmed) {
            return parse_interval(trimmed).map(ScheduleSpec::Interval);
        }

        CronSchedule::parse(trimmed).map(ScheduleSpec::Cron)
    }

    /// True when runs have a following occurrence that bounds their window.
    pub fn is_recurring(&self) -> bool {
        matches!(self, ScheduleSpec::Cron(_) | ScheduleSpec::Interval(_))
    }
}

impl FromStr for ScheduleSpec {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self> {
        ScheduleSpec::parse(s)
    }
}

impl PartialEq for ScheduleSpec {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ScheduleSpec::Once, ScheduleSpec::Once) => true,
            (ScheduleSpec::Manual, ScheduleSpec::Manual) => true,
            (ScheduleSpec::Cron(a), ScheduleSpec::Cron(b)) => a.normalized == b.normalized,
            (ScheduleSpec::Interval(a), ScheduleSpec::Interval(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for ScheduleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleSpec::Once => f.write_str("@once"),
            ScheduleSpec::Manual => f.write_str("none"),
            ScheduleSpec::Cron(cron) => f.write_str(cron.expression()),
            ScheduleSpec::Interval(step) => write!(f, "{}s", step.num_seconds()),
        }
    }
}

/// A parsed cron expression, keeping the text it was written as.
///
/// Holds more than one `cron::Schedule` when the expression fires on either
/// of two day fields; the next fire time is the earliest among them.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    source: String,
    normalized: Vec<String>,
    schedules: Vec<cron::Schedule>,
}

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self> {
        let normalized = cron_expr::normalize(expr).map_err(|reason| {
            LineageError::InvalidSchedule(format!("invalid cron expression '{expr}': {reason}"))
        })?;
        Self::from_normalized(expr, normalized)
    }

    fn from_normalized(source: &str, normalized: Vec<String>) -> Result<Self> {
        let schedules = normalized
            .iter()
            .map(|expr| {
                cron::Schedule::from_str(expr).map_err(|e| {
                    LineageError::InvalidSchedule(format!("invalid cron expression '{source}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            source: source.to_string(),
            normalized,
            schedules,
        })
    }

    /// The expression as written by the user.
    pub fn expression(&self) -> &str {
        &self.source
    }

    /// First fire time strictly after `after`, in `after`'s timezone.
    ///
    /// Fire times are matched against local wall-clock time. A fire time
    /// that falls twice (clocks going back) resolves to its earliest instant
    /// still after `after`. One that falls in a gap (clocks going forward)
    /// moves to the first valid local time after the gap.
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let zone = after.timezone();
        let mut cursor = after.naive_local();

        loop {
            let wall = self.next_wall_time(&cursor)?;
            if let Some(next) = resolve_local(&zone, &wall)
                .into_iter()
                .find(|candidate| candidate > after)
            {
                return Some(next);
            }
            cursor = wall;
        }
    }

    /// Next matching wall-clock time, evaluated on a zone without DST.
    fn next_wall_time(&self, after: &NaiveDateTime) -> Option<NaiveDateTime> {
        let wall = Utc.from_utc_datetime(after);
        self.schedules
            .iter()
            .filter_map(|schedule| schedule.after(&wall).next())
            .min()
            .map(|next| next.naive_utc())
    }
}

/// Longest clock jump searched when a wall time does not exist (some zones
/// have skipped a whole calendar day).
const MAX_GAP_MINUTES: i64 = 48 * 60;

/// Every instant in `zone` that shows `wall` on the clock, earliest first.
fn resolve_local<Tz: TimeZone>(zone: &Tz, wall: &NaiveDateTime) -> Vec<DateTime<Tz>> {
    match zone.from_local_datetime(wall) {
        LocalResult::Single(at) => vec![at],
        LocalResult::Ambiguous(earliest, latest) => vec![earliest, latest],
        LocalResult::None => (1..=MAX_GAP_MINUTES)
            .map(|minutes| *wall + chrono::Duration::minutes(minutes))
            .find_map(|shifted| zone.from_local_datetime(&shifted).earliest())
            .into_iter()
            .collect(),
    }
}

fn looks_like_interval(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_digit()) && !s.contains(char::is_whitespace)
        && s.ends_with(|c: char| c.is_ascii_alphabetic())
}

fn parse_interval(s: &str) -> Result<chrono::Duration> {
    let std_duration = parse_duration(s)
        .map_err(|reason| LineageError::InvalidSchedule(format!("invalid interval '{s}': {reason}")))?;
    if std_duration.is_zero() {
        return Err(LineageError::InvalidSchedule(format!(
            "interval '{s}' must be greater than zero"
        )));
    }
    chrono::Duration::from_std(std_duration)
        .map_err(|e| LineageError::InvalidSchedule(format!("interval '{s}' is out of range: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_once_and_manual() {
        assert_eq!(ScheduleSpec::parse("@once").unwrap(), ScheduleSpec::Once);
        assert_eq!(ScheduleSpec::parse("@ONCE").unwrap(), ScheduleSpec::Once);
        assert_eq!(ScheduleSpec::parse("none").unwrap(), ScheduleSpec::Manual);
        assert_eq!(ScheduleSpec::parse("  ").unwrap(), ScheduleSpec::Manual);
    }

    #[test]
    fn parses_cron_and_presets() {
        let spec = ScheduleSpec::parse("*/10 * * * *").unwrap();
        assert!(spec.is_recurring());
        assert_eq!(spec.to_string(), "*/10 * * * *");

        let daily = ScheduleSpec::parse("@daily").unwrap();
        assert_eq!(daily, ScheduleSpec::parse("0 0 * * *").unwrap());
    }

    #[test]
    fn parses_intervals() {
        assert_eq!(
            ScheduleSpec::parse("30m").unwrap(),
            ScheduleSpec::Interval(chrono::Duration::minutes(30))
        );
        assert_eq!(
            ScheduleSpec::parse("1d").unwrap(),
            ScheduleSpec::Interval(chrono::Duration::days(1))
        );
    }

    #[test]
    fn rejects_malformed_schedules() {
        for bad in ["@fortnightly", "not a cron", "61 * * * *", "* * *", "0s", "5 parsecs"] {
            match ScheduleSpec::parse(bad) {
                Err(LineageError::InvalidSchedule(_)) => {}
                other => panic!("expected InvalidSchedule for {bad:?}, got {other:?}"),
            }
        }
    }
}
