//! Single-date parsing for tool fields such as an expense or invoice date.
//!
//! Unlike [`crate::date_query`], this returns an error for anything it
//! cannot read: a field that needs one date has no sensible fallback.
//!
//! Numeric dates with slashes are read as `MM/DD/YYYY` unless the first
//! component is greater than 12, in which case they are read as
//! `DD/MM/YYYY`. When both components are 12 or less the input is
//! ambiguous and always stays `MM/DD`.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::debug;

use crate::date_query::{
    normalize_expression, parse_iso_date, parse_month_day_tokens, parse_weekday, parse_year,
};
use crate::error::{EngineError, Result};

/// Parse a single date relative to `anchor`.
///
/// # Supported Expressions
///
/// - `today`, `tomorrow`, `yesterday`
/// - `in 3 days`, `2 weeks ago`
/// - `next friday`, `this monday`, `last tuesday`
/// - `2024-03-05`, `2024-3-5`
/// - `03/05/2024`, `13/02/2024`, `5.3.2024`
/// - `March 5`, `5 March 2024`
///
/// # Errors
///
/// [`EngineError::InvalidExpression`] when the text matches no form, and
/// [`EngineError::InvalidDate`] when it matches a form but names no real
/// calendar day ("february 30").
pub fn parse_relative_date(text: &str, anchor: NaiveDate) -> Result<NaiveDate> {
    let s = normalize_expression(text);

    let shift = match s.as_str() {
        "today" => Some(0),
        "tomorrow" => Some(1),
        "yesterday" => Some(-1),
        _ => None,
    };
    if let Some(days) = shift {
        return shift_anchor(&s, anchor, days);
    }

    if let Some(date) = try_offset(&s, anchor)? {
        return Ok(date);
    }
    if let Some(date) = try_weekday(&s, anchor)? {
        return Ok(date);
    }
    if let Some(date) = try_iso(&s)? {
        return Ok(date);
    }
    if let Some(date) = try_numeric(&s)? {
        return Ok(date);
    }
    if let Some(date) = try_month_day(&s, anchor)? {
        return Ok(date);
    }

    Err(EngineError::InvalidExpression(format!(
        "cannot parse date: '{}'",
        text.trim()
    )))
}

/// `in N days|weeks` or `N days|weeks ago`.
fn try_offset(s: &str, anchor: NaiveDate) -> Result<Option<NaiveDate>> {
    let (sign, rest) = if let Some(rest) = s.strip_prefix("in ") {
        (1, rest)
    } else if let Some(rest) = s.strip_suffix(" ago") {
        (-1, rest)
    } else {
        return Ok(None);
    };

    let parts: Vec<&str> = rest.split_whitespace().collect();
    let [n, unit] = parts.as_slice() else {
        return Ok(None);
    };
    let Ok(n) = n.parse::<i64>() else {
        return Ok(None);
    };
    let days_per_unit = match *unit {
        "day" | "days" => 1,
        "week" | "weeks" => 7,
        _ => return Ok(None),
    };

    let days = n
        .checked_mul(days_per_unit * sign)
        .ok_or_else(|| EngineError::InvalidDate(format!("offset too large: '{s}'")))?;
    shift_anchor(s, anchor, days).map(Some)
}

fn shift_anchor(s: &str, anchor: NaiveDate, days: i64) -> Result<NaiveDate> {
    Duration::try_days(days)
        .and_then(|delta| anchor.checked_add_signed(delta))
        .ok_or_else(|| EngineError::InvalidDate(format!("'{s}' from {anchor} is out of range")))
}

/// `next|this|last <weekday>`.
///
/// `next` is strictly in the future and `last` strictly in the past, so
/// "next monday" on a Monday is a week away. `this` stays inside the
/// Monday-start week and may be in the past.
fn try_weekday(s: &str, anchor: NaiveDate) -> Result<Option<NaiveDate>> {
    let Some((modifier, name)) = s.split_once(' ') else {
        return Ok(None);
    };
    let Some(weekday) = parse_weekday(name) else {
        return Ok(None);
    };
    let target = weekday.num_days_from_monday() as i64;
    let current = anchor.weekday().num_days_from_monday() as i64;

    let offset = match modifier {
        "next" => {
            let ahead = (target - current + 7) % 7;
            if ahead == 0 {
                7
            } else {
                ahead
            }
        }
        "this" => target - current,
        "last" => {
            let back = (current - target + 7) % 7;
            -(if back == 0 { 7 } else { back })
        }
        _ => return Ok(None),
    };
    shift_anchor(s, anchor, offset).map(Some)
}

/// ISO `YYYY-M-D`. A well-formed one naming no real day is an error.
fn try_iso(s: &str) -> Result<Option<NaiveDate>> {
    if let Some(date) = parse_iso_date(s) {
        return Ok(Some(date));
    }
    let short = |p: &str| !p.is_empty() && p.len() <= 2 && p.bytes().all(|b| b.is_ascii_digit());
    let parts: Vec<&str> = s.split('-').collect();
    match parts.as_slice() {
        [y, m, d] if parse_year(y).is_some() && short(*m) && short(*d) => Err(
            EngineError::InvalidDate(format!("'{s}' is not a calendar date")),
        ),
        _ => Ok(None),
    }
}

/// `A/B/YYYY` with `/`, `.` or `-` separators.
fn try_numeric(s: &str) -> Result<Option<NaiveDate>> {
    let Some(separator) = ['/', '.', '-'].into_iter().find(|c| s.contains(*c)) else {
        return Ok(None);
    };
    let parts: Vec<&str> = s.split(separator).collect();
    let [a, b, y] = parts.as_slice() else {
        return Ok(None);
    };
    let number = |p: &str| -> Option<u32> {
        if p.is_empty() || p.len() > 2 || !p.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        p.parse().ok()
    };
    let (Some(a), Some(b)) = (number(*a), number(*b)) else {
        return Ok(None);
    };
    let Some(year) = parse_year(y) else {
        return Ok(None);
    };

    let (month, day) = if a > 12 {
        (b, a)
    } else {
        if b <= 12 && a != b {
            debug!(input = s, "ambiguous numeric date read as MM/DD");
        }
        (a, b)
    };

    NaiveDate::from_ymd_opt(year, month, day)
        .map(Some)
        .ok_or_else(|| EngineError::InvalidDate(format!("'{s}' is not a calendar date")))
}

/// `Month Day [Year]` / `Day Month [Year]`, validated against the calendar.
fn try_month_day(s: &str, anchor: NaiveDate) -> Result<Option<NaiveDate>> {
    let s = s.strip_prefix("on ").unwrap_or(s);
    let tokens: Vec<&str> = s
        .split_whitespace()
        .filter(|t| *t != "of" && *t != "the")
        .collect();
    let Some((month, day, year)) = parse_month_day_tokens(&tokens) else {
        return Ok(None);
    };
    let year = year.unwrap_or(anchor.year());
    NaiveDate::from_ymd_opt(year, month, day)
        .map(Some)
        .ok_or_else(|| EngineError::InvalidDate(format!("'{s}' is not a calendar date")))
}

/// Weekday of a parsed date, for callers that echo it back to the user.
pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
