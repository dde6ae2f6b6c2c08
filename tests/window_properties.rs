// tests/window_properties.rs

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Timelike, Utc};
use proptest::prelude::*;

use lineagehook::schedule::{compute, ScheduleSpec};
use lineagehook::store::RunKey;

// 2000-01-01 .. 2098-12-31, whole seconds.
fn nominal_time() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800i64..4_070_908_800i64).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn offset() -> impl Strategy<Value = FixedOffset> {
    // Quarter-hour offsets between -12:00 and +14:00.
    (-48i32..=56).prop_map(|quarters| FixedOffset::east_opt(quarters * 15 * 60).unwrap())
}

fn recurring_schedule() -> impl Strategy<Value = String> {
    prop_oneof![
        (1u32..=30).prop_map(|k| format!("*/{k} * * * *")),
        (0u32..60, 0u32..24).prop_map(|(m, h)| format!("{m} {h} * * *")),
        (0u32..60).prop_map(|m| format!("{m} * * * 1-5")),
        Just("@hourly".to_string()),
        Just("@daily".to_string()),
        Just("@weekly".to_string()),
        Just("@monthly".to_string()),
        Just("0 0 * * 0".to_string()),
    ]
}

/// First `*/k` minute strictly after `t`, found by walking whole minutes.
fn next_step_minute(t: DateTime<Utc>, k: u32) -> DateTime<Utc> {
    let mut candidate = t.with_second(0).unwrap() + Duration::minutes(1);
    while candidate.minute() % k != 0 {
        candidate += Duration::minutes(1);
    }
    candidate
}

proptest! {
    #[test]
    fn recurring_end_is_the_next_fire_time(expr in recurring_schedule(), t in nominal_time()) {
        let spec = ScheduleSpec::parse(&expr).unwrap();
        let window = compute(&spec, &t).unwrap();
        let end = window.end.expect("recurring schedules have an end");

        prop_assert_eq!(window.start, t);
        prop_assert!(end > t);

        // Nothing fires between start and end: asking from any point inside
        // the window lands on the same end.
        let just_before = end - Duration::seconds(1);
        prop_assert_eq!(compute(&spec, &just_before).unwrap().end, Some(end));
    }

    #[test]
    fn step_schedules_match_minute_walk(k in 1u32..=30, t in nominal_time()) {
        let spec = ScheduleSpec::parse(&format!("*/{k} * * * *")).unwrap();
        let window = compute(&spec, &t).unwrap();
        prop_assert_eq!(window.end, Some(next_step_minute(t, k)));
    }

    #[test]
    fn timezone_of_nominal_time_is_kept(
        expr in recurring_schedule(),
        t in nominal_time(),
        tz in offset(),
    ) {
        let local = t.with_timezone(&tz);
        let spec = ScheduleSpec::parse(&expr).unwrap();
        let window = compute(&spec, &local).unwrap();
        let end = window.end.unwrap();

        prop_assert_eq!(window.start.offset(), &tz);
        prop_assert_eq!(end.offset(), &tz);
        prop_assert!(end > local);
    }

    #[test]
    fn once_and_manual_never_have_an_end(t in nominal_time(), tz in offset()) {
        let local = t.with_timezone(&tz);
        for expr in ["@once", "none", ""] {
            let spec = ScheduleSpec::parse(expr).unwrap();
            let window = compute(&spec, &local).unwrap();
            prop_assert_eq!(window.start, local);
            prop_assert!(window.end.is_none());
        }
    }

    #[test]
    fn interval_end_is_start_plus_interval(minutes in 1i64..=10_000, t in nominal_time()) {
        let spec = ScheduleSpec::parse(&format!("{minutes}m")).unwrap();
        let window = compute(&spec, &t).unwrap();
        prop_assert_eq!(window.end, Some(t + Duration::minutes(minutes)));
    }

    #[test]
    fn distinct_runs_never_share_a_storage_key(
        a in ("[a-z/:0-9]{0,6}", "[a-z/:0-9]{0,6}", "[a-z/:0-9]{0,6}"),
        b in ("[a-z/:0-9]{0,6}", "[a-z/:0-9]{0,6}", "[a-z/:0-9]{0,6}"),
    ) {
        let ka = RunKey::new(a.0.clone(), a.1.clone(), a.2.clone());
        let kb = RunKey::new(b.0.clone(), b.1.clone(), b.2.clone());

        prop_assert_eq!(ka.storage_key() == kb.storage_key(), a == b);
        prop_assert_eq!(RunKey::from_storage_key(&ka.storage_key()), Some(ka));
    }
}

#[test]
fn separator_heavy_ids_stay_apart() {
    let pairs = [
        ("etl/a", "b"),
        ("etl", "a/b"),
        ("etl:1", "run"),
        ("etl", "1:run"),
        ("5:etl", ""),
        ("", "5:etl"),
        ("a/1:b", "c"),
        ("a", "1:b/1:c"),
    ];

    let mut keys: Vec<String> = pairs
        .iter()
        .map(|(wf, run)| RunKey::new("default", *wf, *run).storage_key())
        .collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), pairs.len());
}
