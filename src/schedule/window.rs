// src/schedule/window.rs

use chrono::{DateTime, TimeZone, Utc};

use crate::errors::{LineageError, Result};
use crate::schedule::ScheduleSpec;

/// Nominal data interval covered by one run.
///
/// `end` is the next scheduled occurrence after `start`; it is `None` when
/// the schedule has no next occurrence (`@once`, manual).
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionWindow<Tz: TimeZone> {
    pub start: DateTime<Tz>,
    pub end: Option<DateTime<Tz>>,
}

impl<Tz: TimeZone> ExecutionWindow<Tz> {
    pub fn to_utc(&self) -> ExecutionWindow<Utc> {
        ExecutionWindow {
            start: self.start.with_timezone(&Utc),
            end: self.end.as_ref().map(|end| end.with_timezone(&Utc)),
        }
    }
}

/// Compute the window of the run whose nominal time is `nominal_time`.
///
/// All arithmetic happens in `nominal_time`'s own timezone, so the returned
/// timestamps carry the same zone (and DST rules, for zones that have them).
///
/// Fails with [`LineageError::InvalidSchedule`] when a recurring schedule has
/// no occurrence after `nominal_time`.
pub fn compute<Tz: TimeZone>(
    schedule: &ScheduleSpec,
    nominal_time: &DateTime<Tz>,
) -> Result<ExecutionWindow<Tz>> {
    let end = match schedule {
        ScheduleSpec::Once | ScheduleSpec::Manual => None,
        ScheduleSpec::Cron(cron) => {
            let next = cron.next_after(nominal_time).ok_or_else(|| {
                LineageError::InvalidSchedule(format!(
                    "schedule '{}' has no occurrence after {} UTC",
                    cron.expression(),
                    nominal_time.naive_utc()
                ))
            })?;
            Some(next)
        }
        ScheduleSpec::Interval(step) => {
            let next = nominal_time.clone().checked_add_signed(*step).ok_or_else(|| {
                LineageError::InvalidSchedule(format!(
                    "interval schedule overflows after {} UTC",
                    nominal_time.naive_utc()
                ))
            })?;
            Some(next)
        }
    };

    Ok(ExecutionWindow {
        start: nominal_time.clone(),
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use chrono_tz::Europe::Berlin;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn every_ten_minutes() {
        let schedule = ScheduleSpec::parse("*/10 * * * *").unwrap();
        let window = compute(&schedule, &utc("2019-01-31T00:00:00Z")).unwrap();
        assert_eq!(window.start, utc("2019-01-31T00:00:00Z"));
        assert_eq!(window.end, Some(utc("2019-01-31T00:10:00Z")));
    }

    #[test]
    fn once_has_no_end() {
        let window = compute(&ScheduleSpec::Once, &utc("2019-01-31T00:00:00Z")).unwrap();
        assert_eq!(window.start, utc("2019-01-31T00:00:00Z"));
        assert_eq!(window.end, None);
    }

    #[test]
    fn manual_has_no_end() {
        let window = compute(&ScheduleSpec::Manual, &utc("2021-06-01T12:34:56Z")).unwrap();
        assert!(window.end.is_none());
    }

    #[test]
    fn end_is_strictly_after_an_on_boundary_start() {
        let schedule = ScheduleSpec::parse("@hourly").unwrap();
        let window = compute(&schedule, &utc("2019-01-31T05:00:00Z")).unwrap();
        assert_eq!(window.end, Some(utc("2019-01-31T06:00:00Z")));
    }

    #[test]
    fn off_boundary_start_rounds_up_to_next_fire() {
        let schedule = ScheduleSpec::parse("0 2 * * *").unwrap();
        let window = compute(&schedule, &utc("2019-01-31T13:45:00Z")).unwrap();
        assert_eq!(window.end, Some(utc("2019-02-01T02:00:00Z")));
    }

    #[test]
    fn unix_sunday_schedule() {
        // 2019-01-31 is a Thursday; the following Sunday is 2019-02-03.
        let schedule = ScheduleSpec::parse("0 0 * * 0").unwrap();
        let window = compute(&schedule, &utc("2019-01-31T00:00:00Z")).unwrap();
        assert_eq!(window.end, Some(utc("2019-02-03T00:00:00Z")));
    }

    #[test]
    fn either_day_field_can_fire() {
        // Thursday the 31st: the 1st of February comes before any Monday.
        let schedule = ScheduleSpec::parse("0 0 1 * 1").unwrap();
        let window = compute(&schedule, &utc("2019-01-31T00:00:00Z")).unwrap();
        assert_eq!(window.end, Some(utc("2019-02-01T00:00:00Z")));

        // From the 1st, the following Monday is the 4th.
        let window = compute(&schedule, &utc("2019-02-01T00:00:00Z")).unwrap();
        assert_eq!(window.end, Some(utc("2019-02-04T00:00:00Z")));
    }

    #[test]
    fn daily_across_the_autumn_change_is_25_hours() {
        let schedule = ScheduleSpec::parse("0 0 * * *").unwrap();
        let nominal = Berlin.with_ymd_and_hms(2019, 10, 27, 0, 0, 0).unwrap();

        let end = compute(&schedule, &nominal).unwrap().end.unwrap();
        assert_eq!(end, Berlin.with_ymd_and_hms(2019, 10, 28, 0, 0, 0).unwrap());
        assert_eq!(end.clone() - nominal, chrono::Duration::hours(25));
    }

    #[test]
    fn repeated_wall_time_takes_the_earliest_instant() {
        let schedule = ScheduleSpec::parse("30 2 * * *").unwrap();
        let nominal = Berlin.with_ymd_and_hms(2019, 10, 26, 2, 30, 0).unwrap();

        let end = compute(&schedule, &nominal).unwrap().end.unwrap();
        // 02:30 happens twice on the 27th; the first one is still CEST.
        assert_eq!(end.with_timezone(&Utc), utc("2019-10-27T00:30:00Z"));
        assert_eq!(end.clone() - nominal, chrono::Duration::hours(24));
    }

    #[test]
    fn within_a_repeated_hour_the_end_still_follows_the_start() {
        let schedule = ScheduleSpec::parse("*/10 * * * *").unwrap();
        // 02:10 CET, the second pass through 02:10 that night.
        let nominal = utc("2019-10-27T01:10:00Z").with_timezone(&Berlin);

        let end = compute(&schedule, &nominal).unwrap().end.unwrap();
        assert_eq!(end.with_timezone(&Utc), utc("2019-10-27T01:20:00Z"));
    }

    #[test]
    fn skipped_wall_time_moves_past_the_gap() {
        let schedule = ScheduleSpec::parse("30 2 * * *").unwrap();
        let nominal = Berlin.with_ymd_and_hms(2019, 3, 30, 2, 30, 0).unwrap();

        let end = compute(&schedule, &nominal).unwrap().end.unwrap();
        // 02:30 does not exist on the 31st; 03:00 CEST is the first valid time.
        assert_eq!(end.with_timezone(&Utc), utc("2019-03-31T01:00:00Z"));

        // The day after is back to 02:30.
        let following = compute(&schedule, &end).unwrap().end.unwrap();
        assert_eq!(following, Berlin.with_ymd_and_hms(2019, 4, 1, 2, 30, 0).unwrap());
    }

    #[test]
    fn keeps_the_nominal_timezone() {
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let nominal = ist.with_ymd_and_hms(2019, 1, 31, 0, 0, 0).unwrap();
        let schedule = ScheduleSpec::parse("@daily").unwrap();

        let window = compute(&schedule, &nominal).unwrap();
        let end = window.end.unwrap();

        // Midnight is evaluated in +05:30, not in UTC.
        assert_eq!(end.offset(), &ist);
        assert_eq!(end, ist.with_ymd_and_hms(2019, 2, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn interval_adds_the_delta() {
        let schedule = ScheduleSpec::parse("6h").unwrap();
        let window = compute(&schedule, &utc("2019-01-31T00:00:00Z")).unwrap();
        assert_eq!(window.end, Some(utc("2019-01-31T06:00:00Z")));
    }

    #[test]
    fn exhausted_schedule_is_an_error() {
        let schedule = ScheduleSpec::parse("0 0 0 1 1 * 2000").unwrap();
        match compute(&schedule, &utc("2019-01-31T00:00:00Z")) {
            Err(LineageError::InvalidSchedule(msg)) => assert!(msg.contains("no occurrence")),
            other => panic!("expected InvalidSchedule, got {other:?}"),
        }
    }

    #[test]
    fn to_utc_converts_both_ends() {
        let plus_one = FixedOffset::east_opt(3600).unwrap();
        let nominal = plus_one.with_ymd_and_hms(2019, 1, 31, 1, 0, 0).unwrap();
        let window = compute(&ScheduleSpec::parse("1h").unwrap(), &nominal).unwrap();

        let in_utc = window.to_utc();
        assert_eq!(in_utc.start, utc("2019-01-31T00:00:00Z"));
        assert_eq!(in_utc.end, Some(utc("2019-01-31T01:00:00Z")));
    }
}
