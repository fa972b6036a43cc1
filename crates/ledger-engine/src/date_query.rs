//! Deterministic date-phrase resolution for assistant tool calls.
//!
//! Turns a free-text temporal phrase ("last month", "November 5",
//! "from Jan to March") into a concrete `YYYY-MM-DD` day or range. The
//! caller always supplies the anchor date, so nothing here reads the system
//! clock and every result is reproducible.
//!
//! # Design Principle
//!
//! Failing to recognize a phrase is **not** an error. The tool layer that
//! calls this must always be able to fall back to "the anchor date only",
//! so an unrecognized phrase yields a successful [`DateQuery`] with no range
//! and a description of what went wrong. Only internal faults (date
//! arithmetic leaving the representable calendar) produce `success: false`.
//!
//! # Rule order
//!
//! Rules are tried in a fixed order and the first match wins. Keyword and
//! phrase-containment rules run before the generic month-name rules, so
//! "this month" is never read as a month name.
//!
//! 1. `today`, `yesterday`, `tomorrow`
//! 2. `last N days` / `past N days`
//! 3. contains `this week` / `last week`
//! 4. contains `this month` / `last month`
//! 5. contains `this year` / `last year`, then `this quarter` / `last quarter`
//! 6. `Month Day [Year]` or `Day Month [Year]` anywhere in the phrase
//! 7. `[all of] Month [Year]` anywhere in the phrase
//! 8. `[from] <left> to <right>` (both halves resolved recursively)
//! 9. ISO `YYYY-M-D`
//!
//! Rules 6 and 7 step aside for a phrase with a range separator so that
//! rule 8 sees it whole; each half is then scanned on its own.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;
use tracing::debug;

use crate::error::{EngineError, Result};

// ── Configurable week start ─────────────────────────────────────────────────

/// Which day begins a week for "this week" / "last week".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum WeekStartDay {
    /// ISO 8601 standard (Monday = day 0 of the week).
    #[default]
    Monday,
    /// US/Canada convention (Sunday = day 0 of the week).
    Sunday,
}

/// Options for [`resolve_date_query_with_options`].
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Which day starts the week for week computations.
    pub week_start: WeekStartDay,
}

/// How many days `weekday` is from the week-start day.
fn days_from_week_start(weekday: Weekday, week_start: WeekStartDay) -> i64 {
    match week_start {
        WeekStartDay::Monday => weekday.num_days_from_monday() as i64,
        WeekStartDay::Sunday => weekday.num_days_from_sunday() as i64,
    }
}

// ── Result type ─────────────────────────────────────────────────────────────

/// The result of resolving a date phrase.
///
/// Serializes to the shape the assistant's tool layer consumes; absent
/// fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateQuery {
    /// `false` only for internal faults, never for unrecognized phrases.
    pub success: bool,
    /// First day of the resolved range (`YYYY-MM-DD`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Last day of the resolved range (`YYYY-MM-DD`), inclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// The anchor date (`YYYY-MM-DD`).
    pub current_date: String,
    /// The anchor's year.
    pub current_year: i32,
    /// Human-readable account of what was parsed.
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DateQuery {
    fn resolved(anchor: NaiveDate, span: Span) -> Self {
        Self {
            success: true,
            start_date: Some(span.start.to_string()),
            end_date: Some(span.end.to_string()),
            current_date: CalendarDay::from(anchor).to_string(),
            current_year: anchor.year(),
            description: span.description,
            error: None,
        }
    }

    fn anchor_only(anchor: NaiveDate, description: String) -> Self {
        Self {
            success: true,
            start_date: None,
            end_date: None,
            current_date: CalendarDay::from(anchor).to_string(),
            current_year: anchor.year(),
            description,
            error: None,
        }
    }

    fn failed(anchor: NaiveDate, expression: &str, err: EngineError) -> Self {
        Self {
            success: false,
            start_date: None,
            end_date: None,
            current_date: CalendarDay::from(anchor).to_string(),
            current_year: anchor.year(),
            description: format!("Failed to resolve '{expression}'"),
            error: Some(err.to_string()),
        }
    }

    /// Whether a day or range was resolved.
    pub fn has_range(&self) -> bool {
        self.start_date.is_some() && self.end_date.is_some()
    }

    /// Whether the resolution is a single day (`start_date == end_date`).
    pub fn is_single_day(&self) -> bool {
        self.has_range() && self.start_date == self.end_date
    }
}

/// A calendar day that is not checked against the month's length.
///
/// Month-day phrases accept any day from 1 to 31, so "february 30" stays
/// `YYYY-02-30` here. Field order gives chronological ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct CalendarDay {
    year: i32,
    month: u32,
    day: u32,
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// A resolved inclusive span plus its description.
#[derive(Debug, Clone)]
struct Span {
    start: CalendarDay,
    end: CalendarDay,
    description: String,
}

impl Span {
    fn day(day: CalendarDay, description: String) -> Self {
        Self {
            start: day,
            end: day,
            description,
        }
    }

    fn between(start: NaiveDate, end: NaiveDate, description: String) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            description,
        }
    }
}

// ── resolve_date_query ──────────────────────────────────────────────────────

/// Resolve a date phrase against `anchor`, with Monday-start weeks.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use ledger_engine::date_query::resolve_date_query;
///
/// let anchor = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// let result = resolve_date_query("last month", anchor);
/// assert_eq!(result.start_date.as_deref(), Some("2023-12-01"));
/// assert_eq!(result.end_date.as_deref(), Some("2023-12-31"));
/// ```
pub fn resolve_date_query(expression: &str, anchor: NaiveDate) -> DateQuery {
    resolve_date_query_with_options(expression, anchor, &ResolveOptions::default())
}

/// Resolve a date phrase against `anchor` with options.
///
/// Never panics and never returns an error for an unrecognized phrase; see
/// the module docs for the grammar and the failure policy.
pub fn resolve_date_query_with_options(
    expression: &str,
    anchor: NaiveDate,
    options: &ResolveOptions,
) -> DateQuery {
    let normalized = normalize_expression(expression);

    if normalized.is_empty() {
        return DateQuery::anchor_only(
            anchor,
            format!(
                "No date specified; using current date {}",
                CalendarDay::from(anchor)
            ),
        );
    }

    match resolve_span(&normalized, anchor, options) {
        Ok(Some(span)) => {
            debug!(
                expression = %normalized,
                start = %span.start,
                end = %span.end,
                "resolved date phrase"
            );
            DateQuery::resolved(anchor, span)
        }
        Ok(None) => {
            debug!(expression = %normalized, "unrecognized date phrase");
            DateQuery::anchor_only(
                anchor,
                format!(
                    "Could not parse '{}'; using current date {}",
                    expression.trim(),
                    CalendarDay::from(anchor)
                ),
            )
        }
        Err(err) => {
            debug!(expression = %normalized, error = %err, "date phrase resolution failed");
            DateQuery::failed(anchor, expression.trim(), err)
        }
    }
}

type Rule = fn(&str, NaiveDate, &ResolveOptions) -> Result<Option<Span>>;

/// Rules in priority order. The range rule recurses back into this list.
const RULES: [(&str, Rule); 10] = [
    ("anchored", try_anchored),
    ("last_n_days", try_last_n_days),
    ("week", try_week),
    ("month", try_month),
    ("year", try_year),
    ("quarter", try_quarter),
    ("month_day", try_month_day),
    ("whole_month", try_whole_month),
    ("range", try_range),
    ("iso_date", try_iso_date),
];

fn resolve_span(s: &str, anchor: NaiveDate, options: &ResolveOptions) -> Result<Option<Span>> {
    for (name, rule) in RULES {
        if let Some(span) = rule(s, anchor, options)? {
            debug!(rule = name, expression = s, "date rule matched");
            return Ok(Some(span));
        }
    }
    Ok(None)
}

// ── Rules ───────────────────────────────────────────────────────────────────

/// `today`, `yesterday`, `tomorrow`.
fn try_anchored(s: &str, anchor: NaiveDate, _: &ResolveOptions) -> Result<Option<Span>> {
    let (offset, label) = match s {
        "today" => (0, "Today"),
        "yesterday" => (-1, "Yesterday"),
        "tomorrow" => (1, "Tomorrow"),
        _ => return Ok(None),
    };
    let day = shift_days(anchor, offset)?;
    Ok(Some(Span::between(
        day,
        day,
        format!("{label} ({})", CalendarDay::from(day)),
    )))
}

/// `last N days`, anywhere in the phrase.
fn try_last_n_days(s: &str, anchor: NaiveDate, _: &ResolveOptions) -> Result<Option<Span>> {
    let tokens: Vec<&str> = s.split_whitespace().collect();
    for window in tokens.windows(3) {
        if !matches!(window[0], "last" | "past") || !matches!(window[2], "day" | "days") {
            continue;
        }
        if !window[1].bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let Ok(n) = window[1].parse::<i64>() else {
            continue;
        };
        let start = shift_days(anchor, -n)?;
        return Ok(Some(Span::between(
            start,
            anchor,
            format!(
                "Last {n} day{} ({} to {})",
                if n == 1 { "" } else { "s" },
                CalendarDay::from(start),
                CalendarDay::from(anchor)
            ),
        )));
    }
    Ok(None)
}

/// Contains `this week` / `last week`.
fn try_week(s: &str, anchor: NaiveDate, options: &ResolveOptions) -> Result<Option<Span>> {
    let (reference, label) = if s.contains("this week") {
        (anchor, "This week")
    } else if s.contains("last week") {
        (shift_days(anchor, -7)?, "Last week")
    } else {
        return Ok(None);
    };

    let start = shift_days(
        reference,
        -days_from_week_start(reference.weekday(), options.week_start),
    )?;
    let end = shift_days(start, 6)?;
    Ok(Some(Span::between(
        start,
        end,
        format!(
            "{label} ({} to {})",
            CalendarDay::from(start),
            CalendarDay::from(end)
        ),
    )))
}

/// Contains `this month` / `last month`.
fn try_month(s: &str, anchor: NaiveDate, _: &ResolveOptions) -> Result<Option<Span>> {
    let (year, month, label) = if s.contains("this month") {
        (anchor.year(), anchor.month(), "This month")
    } else if s.contains("last month") {
        let (y, m) = if anchor.month() == 1 {
            (anchor.year() - 1, 12)
        } else {
            (anchor.year(), anchor.month() - 1)
        };
        (y, m, "Last month")
    } else {
        return Ok(None);
    };

    let (start, end) = month_bounds(year, month)?;
    Ok(Some(Span::between(
        start,
        end,
        format!("{label} ({} {year})", month_name(month)),
    )))
}

/// Contains `this year` / `last year`.
fn try_year(s: &str, anchor: NaiveDate, _: &ResolveOptions) -> Result<Option<Span>> {
    let (year, label) = if s.contains("this year") {
        (anchor.year(), "This year")
    } else if s.contains("last year") {
        (anchor.year() - 1, "Last year")
    } else {
        return Ok(None);
    };

    let start = ymd(year, 1, 1)?;
    let end = ymd(year, 12, 31)?;
    Ok(Some(Span::between(start, end, format!("{label} ({year})"))))
}

/// Contains `this quarter` / `last quarter`.
fn try_quarter(s: &str, anchor: NaiveDate, _: &ResolveOptions) -> Result<Option<Span>> {
    let quarter = (anchor.month() - 1) / 3;
    let (year, quarter, label) = if s.contains("this quarter") {
        (anchor.year(), quarter, "This quarter")
    } else if s.contains("last quarter") {
        if quarter == 0 {
            (anchor.year() - 1, 3, "Last quarter")
        } else {
            (anchor.year(), quarter - 1, "Last quarter")
        }
    } else {
        return Ok(None);
    };

    let first_month = quarter * 3 + 1;
    let start = ymd(year, first_month, 1)?;
    let (_, end) = month_bounds(year, first_month + 2)?;
    Ok(Some(Span::between(
        start,
        end,
        format!("{label} (Q{} {year})", quarter + 1),
    )))
}

/// `Month Day [Year]` or `Day Month [Year]`, anywhere in the phrase.
fn try_month_day(s: &str, anchor: NaiveDate, _: &ResolveOptions) -> Result<Option<Span>> {
    if split_range(s).is_some() {
        return Ok(None);
    }
    let tokens: Vec<&str> = s
        .split_whitespace()
        .filter(|t| !matches!(*t, "on" | "of" | "the"))
        .collect();

    let Some((month, day, year)) = find_month_day(&tokens) else {
        return Ok(None);
    };
    let year = year.unwrap_or(anchor.year());
    let day = CalendarDay { year, month, day };
    Ok(Some(Span::day(
        day,
        format!("{} {}, {year}", month_name(month), day.day),
    )))
}

/// `[all of|in] Month [Year]`, anywhere in the phrase.
fn try_whole_month(s: &str, anchor: NaiveDate, _: &ResolveOptions) -> Result<Option<Span>> {
    if split_range(s).is_some() {
        return Ok(None);
    }
    let tokens: Vec<&str> = s.split_whitespace().collect();
    let Some((month, year)) = find_month(&tokens) else {
        return Ok(None);
    };
    let year = year.unwrap_or(anchor.year());

    let (start, end) = month_bounds(year, month)?;
    Ok(Some(Span::between(
        start,
        end,
        format!("All of {} {year}", month_name(month)),
    )))
}

/// `[from] <left> to <right>`; both halves must resolve on their own.
fn try_range(s: &str, anchor: NaiveDate, options: &ResolveOptions) -> Result<Option<Span>> {
    let Some((left, right)) = split_range(s) else {
        return Ok(None);
    };

    let Some(left) = resolve_span(left, anchor, options)? else {
        return Ok(None);
    };
    let Some(right) = resolve_span(right, anchor, options)? else {
        return Ok(None);
    };

    if left.start > right.end {
        debug!(start = %left.start, end = %right.end, "range ends before it starts");
        return Ok(None);
    }

    Ok(Some(Span {
        start: left.start,
        end: right.end,
        description: format!("{} to {}", left.description, right.description),
    }))
}

/// Split `[from] <left> to|through|until|- <right>` or
/// `between <left> and <right>` into two non-empty halves.
fn split_range(s: &str) -> Option<(&str, &str)> {
    let (body, separators): (&str, &[&str]) = if let Some(rest) = s.strip_prefix("between ") {
        (rest, &[" and "])
    } else {
        (
            s.strip_prefix("from ").unwrap_or(s),
            &[" to ", " through ", " until ", " - "],
        )
    };

    let (left, right) = separators.iter().find_map(|sep| body.split_once(sep))?;
    let (left, right) = (left.trim(), right.trim());
    (!left.is_empty() && !right.is_empty()).then_some((left, right))
}

/// Strict ISO `YYYY-M-D` / `YYYY-MM-DD` naming a real calendar date.
fn try_iso_date(s: &str, _: NaiveDate, _: &ResolveOptions) -> Result<Option<Span>> {
    let Some(date) = parse_iso_date(s) else {
        return Ok(None);
    };
    let day = CalendarDay::from(date);
    Ok(Some(Span::day(day, day.to_string())))
}

// ── Parsing helpers ─────────────────────────────────────────────────────────

/// Normalize: trim, lowercase, drop commas and trailing punctuation,
/// collapse whitespace.
pub(crate) fn normalize_expression(s: &str) -> String {
    let lowered = s.trim().to_lowercase().replace(',', " ");
    let trimmed = lowered.trim_end_matches(['.', '?', '!']);
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The first `month day [year]` / `day month [year]` window, preferring
/// the three-token form at each position.
fn find_month_day(tokens: &[&str]) -> Option<(u32, u32, Option<i32>)> {
    (0..tokens.len()).find_map(|i| {
        let rest = &tokens[i..];
        [3, 2]
            .into_iter()
            .filter(|n| rest.len() >= *n)
            .find_map(|n| parse_month_day_tokens(&rest[..n]))
    })
}

/// The first month name that stands for a whole month, with its year if
/// one follows.
///
/// A month followed by a number that is not a year is a failed day
/// ("march 32"), not a month. Past the first token a bare month needs a
/// lead-in word (`in`, `of`, `during`, `for`). `may` opening a longer
/// phrase is read as the verb.
fn find_month(tokens: &[&str]) -> Option<(u32, Option<i32>)> {
    tokens.iter().enumerate().find_map(|(i, token)| {
        let month = parse_month(token)?;
        let next = tokens.get(i + 1).copied();
        let year = next.and_then(parse_year);
        if year.is_none() && next.is_some_and(|t| t.starts_with(|c: char| c.is_ascii_digit())) {
            return None;
        }
        let introduced = match i.checked_sub(1) {
            Some(prev) => matches!(tokens[prev], "in" | "of" | "during" | "for"),
            None => tokens.len() == 1 || month != 5,
        };
        (year.is_some() || introduced).then_some((month, year))
    })
}

/// Match `[month, day, year?]` or `[day, month, year?]`.
pub(crate) fn parse_month_day_tokens(tokens: &[&str]) -> Option<(u32, u32, Option<i32>)> {
    let (first, second, rest) = match tokens {
        [a, b] => (*a, *b, None),
        [a, b, y] => (*a, *b, Some(*y)),
        _ => return None,
    };
    let year = match rest {
        Some(y) => Some(parse_year(y)?),
        None => None,
    };

    if let (Some(month), Some(day)) = (parse_month(first), parse_day(second)) {
        return Some((month, day, year));
    }
    if let (Some(day), Some(month)) = (parse_day(first), parse_month(second)) {
        return Some((month, day, year));
    }
    None
}

/// Parse a month name to number (1-12), full or abbreviated.
pub(crate) fn parse_month(s: &str) -> Option<u32> {
    match s {
        "january" | "jan" => Some(1),
        "february" | "feb" => Some(2),
        "march" | "mar" => Some(3),
        "april" | "apr" => Some(4),
        "may" => Some(5),
        "june" | "jun" => Some(6),
        "july" | "jul" => Some(7),
        "august" | "aug" => Some(8),
        "september" | "sep" | "sept" => Some(9),
        "october" | "oct" => Some(10),
        "november" | "nov" => Some(11),
        "december" | "dec" => Some(12),
        _ => None,
    }
}

/// Parse a weekday name, full or abbreviated.
pub(crate) fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Day of month 1-31, with an optional ordinal suffix ("5th").
pub(crate) fn parse_day(s: &str) -> Option<u32> {
    let digits = ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| s.strip_suffix(suffix))
        .unwrap_or(s);
    if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let day: u32 = digits.parse().ok()?;
    (1..=31).contains(&day).then_some(day)
}

/// Exactly four digits.
pub(crate) fn parse_year(s: &str) -> Option<i32> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// `YYYY-M-D` or `YYYY-MM-DD`, validated against the calendar.
pub(crate) fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split('-').collect();
    let [y, m, d] = parts.as_slice() else {
        return None;
    };
    let short_number = |p: &str| {
        (!p.is_empty() && p.len() <= 2 && p.bytes().all(|b| b.is_ascii_digit()))
            .then(|| p.parse::<u32>().ok())
            .flatten()
    };
    NaiveDate::from_ymd_opt(parse_year(y)?, short_number(*m)?, short_number(*d)?)
}

fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    NAMES[(month as usize - 1) % 12]
}

// ── Calendar arithmetic ─────────────────────────────────────────────────────

fn shift_days(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| {
            EngineError::InvalidDate(format!("{date} shifted by {days} days is out of range"))
        })
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        EngineError::InvalidDate(format!("{year:04}-{month:02}-{day:02} is out of range"))
    })
}

/// First and last day of a calendar month.
pub(crate) fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let first = ymd(year, month, 1)?;
    let (ny, nm) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let last = ymd(ny, nm, 1)?
        .pred_opt()
        .ok_or_else(|| EngineError::InvalidDate(format!("no day before {ny:04}-{nm:02}-01")))?;
    Ok((first, last))
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Monday, January 15, 2024.
    fn anchor() -> NaiveDate {
        date(2024, 1, 15)
    }

    fn range(result: &DateQuery) -> (&str, &str) {
        (
            result.start_date.as_deref().expect("start_date"),
            result.end_date.as_deref().expect("end_date"),
        )
    }

    // ── anchored ────────────────────────────────────────────────────────

    #[test]
    fn test_today_is_anchor() {
        let result = resolve_date_query("today", anchor());
        assert!(result.success);
        assert_eq!(range(&result), ("2024-01-15", "2024-01-15"));
        assert_eq!(result.current_date, "2024-01-15");
        assert_eq!(result.current_year, 2024);
    }

    #[test]
    fn test_yesterday_crosses_leap_day() {
        let result = resolve_date_query("Yesterday", date(2024, 3, 1));
        assert_eq!(range(&result), ("2024-02-29", "2024-02-29"));
    }

    #[test]
    fn test_tomorrow_crosses_year() {
        let result = resolve_date_query("tomorrow", date(2023, 12, 31));
        assert_eq!(range(&result), ("2024-01-01", "2024-01-01"));
    }

    #[test]
    fn test_today_must_be_whole_phrase() {
        // "today" is exact-match only; this falls through to unrecognized
        let result = resolve_date_query("what about today please", anchor());
        assert!(result.success);
        assert!(!result.has_range());
    }

    // ── last N days ─────────────────────────────────────────────────────

    #[test]
    fn test_last_7_days() {
        let result = resolve_date_query("last 7 days", anchor());
        assert_eq!(range(&result), ("2024-01-08", "2024-01-15"));
        assert!(result.description.starts_with("Last 7 days"));
    }

    #[test]
    fn test_last_0_days_is_anchor_only_range() {
        let result = resolve_date_query("last 0 days", anchor());
        assert_eq!(range(&result), ("2024-01-15", "2024-01-15"));
    }

    #[test]
    fn test_past_30_days_inside_sentence() {
        let result = resolve_date_query("expenses over the past 30 days", date(2024, 3, 10));
        assert_eq!(range(&result), ("2024-02-09", "2024-03-10"));
    }

    #[test]
    fn test_last_n_days_overflow_is_hard_failure() {
        let result = resolve_date_query("last 999999999 days", anchor());
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("Invalid date"));
        assert_eq!(result.current_date, "2024-01-15");
    }

    // ── weeks ───────────────────────────────────────────────────────────

    #[test]
    fn test_this_week_on_monday() {
        let result = resolve_date_query("this week", anchor());
        assert_eq!(range(&result), ("2024-01-15", "2024-01-21"));
    }

    #[test]
    fn test_this_week_on_sunday_belongs_to_previous_monday() {
        // Sunday Jan 21 is the last day of the Monday-start week
        let result = resolve_date_query("this week", date(2024, 1, 21));
        assert_eq!(range(&result), ("2024-01-15", "2024-01-21"));
    }

    #[test]
    fn test_this_week_sunday_start() {
        let options = ResolveOptions {
            week_start: WeekStartDay::Sunday,
        };
        let result = resolve_date_query_with_options("this week", date(2024, 1, 21), &options);
        assert_eq!(range(&result), ("2024-01-21", "2024-01-27"));
    }

    #[test]
    fn test_last_week_from_wednesday() {
        let result = resolve_date_query("show me last week", date(2024, 1, 17));
        assert_eq!(range(&result), ("2024-01-08", "2024-01-14"));
    }

    #[test]
    fn test_last_week_across_year() {
        let result = resolve_date_query("last week", date(2024, 1, 3));
        assert_eq!(range(&result), ("2023-12-25", "2023-12-31"));
    }

    // ── months ──────────────────────────────────────────────────────────

    #[test]
    fn test_last_month_rolls_back_year_in_january() {
        let result = resolve_date_query("last month", anchor());
        assert_eq!(range(&result), ("2023-12-01", "2023-12-31"));
        assert_eq!(result.description, "Last month (December 2023)");
    }

    #[test]
    fn test_this_month_leap_february() {
        let result = resolve_date_query("this month", date(2024, 2, 10));
        assert_eq!(range(&result), ("2024-02-01", "2024-02-29"));
    }

    #[test]
    fn test_month_containment_shadows_range() {
        // "this month" is checked before the range rule
        let result = resolve_date_query("from last month to this month", date(2024, 5, 20));
        assert_eq!(range(&result), ("2024-05-01", "2024-05-31"));
    }

    #[test]
    fn test_this_month_not_read_as_month_name() {
        let result = resolve_date_query("invoices this month", date(2024, 4, 2));
        assert_eq!(range(&result), ("2024-04-01", "2024-04-30"));
    }

    // ── years and quarters ──────────────────────────────────────────────

    #[test]
    fn test_this_year() {
        let result = resolve_date_query("budget for this year", anchor());
        assert_eq!(range(&result), ("2024-01-01", "2024-12-31"));
    }

    #[test]
    fn test_last_year() {
        let result = resolve_date_query("last year", anchor());
        assert_eq!(range(&result), ("2023-01-01", "2023-12-31"));
    }

    #[test]
    fn test_this_quarter() {
        let result = resolve_date_query("this quarter", date(2024, 8, 14));
        assert_eq!(range(&result), ("2024-07-01", "2024-09-30"));
        assert_eq!(result.description, "This quarter (Q3 2024)");
    }

    #[test]
    fn test_last_quarter_rolls_back_year() {
        let result = resolve_date_query("last quarter", date(2026, 2, 18));
        assert_eq!(range(&result), ("2025-10-01", "2025-12-31"));
    }

    // ── month + day ─────────────────────────────────────────────────────

    #[test]
    fn test_month_day_defaults_to_anchor_year() {
        let result = resolve_date_query("november 5", anchor());
        assert_eq!(range(&result), ("2024-11-05", "2024-11-05"));
        assert_eq!(result.description, "November 5, 2024");
    }

    #[test]
    fn test_day_month_year() {
        let result = resolve_date_query("5 nov 2023", anchor());
        assert_eq!(range(&result), ("2023-11-05", "2023-11-05"));
    }

    #[test]
    fn test_month_day_with_ordinal_and_comma() {
        let result = resolve_date_query("Nov 5th, 2023", anchor());
        assert_eq!(range(&result), ("2023-11-05", "2023-11-05"));
    }

    #[test]
    fn test_day_of_month() {
        let result = resolve_date_query("on the 3rd of march", anchor());
        assert_eq!(range(&result), ("2024-03-03", "2024-03-03"));
    }

    #[test]
    fn test_month_day_is_not_calendar_validated() {
        let result = resolve_date_query("february 30", anchor());
        assert_eq!(range(&result), ("2024-02-30", "2024-02-30"));
    }

    #[test]
    fn test_day_32_is_rejected() {
        let result = resolve_date_query("march 32", anchor());
        assert!(result.success);
        assert!(!result.has_range());
    }

    #[test]
    fn test_month_day_inside_sentence() {
        let result = resolve_date_query("expenses on november 5", anchor());
        assert_eq!(range(&result), ("2024-11-05", "2024-11-05"));
        let result = resolve_date_query("November 5 expenses", anchor());
        assert_eq!(range(&result), ("2024-11-05", "2024-11-05"));
    }

    #[test]
    fn test_day_month_year_inside_sentence() {
        let result = resolve_date_query("what did I spend on 5th of nov 2023?", anchor());
        assert_eq!(range(&result), ("2023-11-05", "2023-11-05"));
    }

    // ── whole month ─────────────────────────────────────────────────────

    #[test]
    fn test_whole_month_anchor_year() {
        let result = resolve_date_query("March", anchor());
        assert_eq!(range(&result), ("2024-03-01", "2024-03-31"));
    }

    #[test]
    fn test_all_of_month_with_year() {
        let result = resolve_date_query("all of feb 2023", anchor());
        assert_eq!(range(&result), ("2023-02-01", "2023-02-28"));
        assert_eq!(result.description, "All of February 2023");
    }

    #[test]
    fn test_month_year_is_not_a_day() {
        let result = resolve_date_query("december 2023", anchor());
        assert_eq!(range(&result), ("2023-12-01", "2023-12-31"));
    }

    #[test]
    fn test_whole_month_inside_sentence() {
        let result = resolve_date_query("show my budget for march", anchor());
        assert_eq!(range(&result), ("2024-03-01", "2024-03-31"));
        let result = resolve_date_query("invoices from december 2023 please", anchor());
        assert_eq!(range(&result), ("2023-12-01", "2023-12-31"));
    }

    #[test]
    fn test_may_as_verb_is_not_a_month() {
        let result = resolve_date_query("may i see my expenses", anchor());
        assert!(!result.has_range());
        let result = resolve_date_query("expenses in may", anchor());
        assert_eq!(range(&result), ("2024-05-01", "2024-05-31"));
    }

    // ── ranges ──────────────────────────────────────────────────────────

    #[test]
    fn test_from_month_to_month() {
        let result = resolve_date_query("from january to march", anchor());
        assert_eq!(range(&result), ("2024-01-01", "2024-03-31"));
    }

    #[test]
    fn test_range_of_days() {
        let result = resolve_date_query("nov 5 to nov 20", anchor());
        assert_eq!(range(&result), ("2024-11-05", "2024-11-20"));
        assert_eq!(result.description, "November 5, 2024 to November 20, 2024");
    }

    #[test]
    fn test_range_with_explicit_years() {
        let result = resolve_date_query("from dec 2023 to feb 2024", anchor());
        assert_eq!(range(&result), ("2023-12-01", "2024-02-29"));
    }

    #[test]
    fn test_range_halves_are_scanned() {
        let result = resolve_date_query("expenses from nov 5 to nov 20", anchor());
        assert_eq!(range(&result), ("2024-11-05", "2024-11-20"));
    }

    #[test]
    fn test_range_with_iso_halves() {
        let result = resolve_date_query("2024-01-01 to 2024-01-31", anchor());
        assert_eq!(range(&result), ("2024-01-01", "2024-01-31"));
    }

    #[test]
    fn test_between_and_range() {
        let result = resolve_date_query("between yesterday and tomorrow", anchor());
        assert_eq!(range(&result), ("2024-01-14", "2024-01-16"));
    }

    #[test]
    fn test_range_requires_both_halves() {
        let result = resolve_date_query("from january to someday", anchor());
        assert!(result.success);
        assert!(!result.has_range());
    }

    #[test]
    fn test_backwards_range_is_not_recognized() {
        let result = resolve_date_query("from march to january", anchor());
        assert!(result.success);
        assert!(!result.has_range());
    }

    // ── ISO ─────────────────────────────────────────────────────────────

    #[test]
    fn test_iso_short_form() {
        let result = resolve_date_query("2024-3-5", anchor());
        assert_eq!(range(&result), ("2024-03-05", "2024-03-05"));
    }

    #[test]
    fn test_iso_invalid_calendar_date_falls_through() {
        let result = resolve_date_query("2024-02-30", anchor());
        assert!(result.success);
        assert!(!result.has_range());
    }

    // ── fallbacks ───────────────────────────────────────────────────────

    #[test]
    fn test_empty_input_is_anchor_only() {
        let result = resolve_date_query("   ", anchor());
        assert!(result.success);
        assert!(!result.has_range());
        assert_eq!(result.current_date, "2024-01-15");
        assert!(result.description.starts_with("No date specified"));
    }

    #[test]
    fn test_gibberish_is_anchor_only() {
        let result = resolve_date_query("gibberish text", anchor());
        assert!(result.success);
        assert_eq!(result.start_date, None);
        assert_eq!(result.end_date, None);
        assert_eq!(result.error, None);
        assert!(result.description.contains("gibberish text"));
    }

    #[test]
    fn test_serialized_shape_omits_missing_fields() {
        let result = resolve_date_query("gibberish", anchor());
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("start_date").is_none());
        assert!(json.get("error").is_none());
        assert_eq!(json["current_date"], "2024-01-15");
        assert_eq!(json["current_year"], 2024);
    }

    // ── helpers ─────────────────────────────────────────────────────────

    #[test]
    fn test_normalize_expression() {
        assert_eq!(normalize_expression("  Nov  5th,  2023?  "), "nov 5th 2023");
    }

    #[test]
    fn test_parse_day_bounds() {
        assert_eq!(parse_day("1"), Some(1));
        assert_eq!(parse_day("31st"), Some(31));
        assert_eq!(parse_day("0"), None);
        assert_eq!(parse_day("32"), None);
        assert_eq!(parse_day("2023"), None);
    }
}
