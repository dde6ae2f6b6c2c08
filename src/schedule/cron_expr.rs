// src/schedule/cron_expr.rs

//! Normalisation of user-facing cron syntax to what the `cron` crate parses.
//!
//! The `cron` crate wants 6 fields (sec min hour dom month dow, plus an
//! optional year) and numbers weekdays 1-7 starting at Sunday. Workflow
//! definitions use classic 5-field Unix cron (0 or 7 = Sunday) or one of the
//! `@` presets, so both are rewritten here before parsing.

use std::collections::BTreeSet;

/// Expand an `@` preset to a 6-field expression, if it is one we know.
pub(crate) fn preset(expr: &str) -> Option<&'static str> {
    match expr.trim().to_lowercase().as_str() {
        "@hourly" => Some("0 0 * * * *"),
        "@daily" | "@midnight" => Some("0 0 0 * * *"),
        "@weekly" => Some("0 0 0 * * 1"),
        "@monthly" => Some("0 0 0 1 * *"),
        "@quarterly" => Some("0 0 0 1 */3 *"),
        "@yearly" | "@annually" => Some("0 0 0 1 1 *"),
        _ => None,
    }
}

/// Rewrite `expr` into the 6/7-field form accepted by `cron::Schedule`.
///
/// - 5 fields: prepend `0` seconds and translate the day-of-week field.
/// - 6 or 7 fields: already in `cron` crate syntax, returned unchanged.
///
/// Unix cron fires when *either* day field matches if both are restricted,
/// while the `cron` crate requires both. Such expressions come back as two
/// schedules, one per day field, whose union is the Unix schedule.
pub(crate) fn normalize(expr: &str) -> Result<Vec<String>, String> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    match fields.len() {
        5 => {
            let (minute, hour, dom, month) = (fields[0], fields[1], fields[2], fields[3]);
            let dow = translate_unix_dow(fields[4])?;

            if is_restricted(dom) && is_restricted(fields[4]) {
                Ok(vec![
                    format!("0 {minute} {hour} {dom} {month} *"),
                    format!("0 {minute} {hour} * {month} {dow}"),
                ])
            } else {
                Ok(vec![format!("0 {minute} {hour} {dom} {month} {dow}")])
            }
        }
        6 | 7 => Ok(vec![fields.join(" ")]),
        n => Err(format!(
            "expected 5 fields (or 6/7 with seconds/year), got {n}"
        )),
    }
}

/// A day field counts as restricted unless it starts with `*` or `?`, the
/// same rule Vixie cron uses.
fn is_restricted(field: &str) -> bool {
    !(field.starts_with('*') || field.starts_with('?'))
}

/// Translate a Unix day-of-week field (0-7, Sunday = 0 or 7) to the `cron`
/// crate numbering (1-7, Sunday = 1).
///
/// Named days (`MON-FRI`) and bare wildcards (`*`, `*/2`) mean the same in
/// both numberings and pass through. Numeric ranges and steps are expanded to
/// an explicit list, since a Unix range ending in 7 has no contiguous
/// equivalent.
fn translate_unix_dow(field: &str) -> Result<String, String> {
    let mut parts = Vec::new();

    for part in field.split(',') {
        if !part.chars().any(|c| c.is_ascii_digit()) {
            parts.push(part.to_string());
            continue;
        }

        let (range, step) = match part.split_once('/') {
            Some((range, step)) => (range, Some(parse_step(step)?)),
            None => (part, None),
        };

        if range == "*" || range == "?" {
            parts.push(part.to_string());
            continue;
        }

        let (lo, hi) = match range.split_once('-') {
            Some((lo, hi)) => (parse_unix_day(lo)?, parse_unix_day(hi)?),
            None => {
                let day = parse_unix_day(range)?;
                // `n/step` runs from n to the end of the week.
                (day, if step.is_some() { 6 } else { day })
            }
        };

        if lo > hi {
            return Err(format!("day-of-week range '{range}' is reversed"));
        }

        let days: BTreeSet<u32> = (lo..=hi)
            .step_by(step.unwrap_or(1) as usize)
            .map(|d| d % 7 + 1)
            .collect();

        parts.push(
            days.iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(","),
        );
    }

    Ok(parts.join(","))
}

fn parse_unix_day(s: &str) -> Result<u32, String> {
    let day: u32 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid day-of-week value '{s}'"))?;
    if day > 7 {
        return Err(format!("day-of-week value {day} out of range 0-7"));
    }
    Ok(day)
}

fn parse_step(s: &str) -> Result<u32, String> {
    match s.trim().parse::<u32>() {
        Ok(step) if step > 0 => Ok(step),
        _ => Err(format!("invalid step '{s}'")),
    }
}
