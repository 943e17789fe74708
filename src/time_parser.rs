//! Lenient date/time parsing for event start times.
//!
//! The oracle is asked for ISO-8601, but models drift: some return a bare
//! date, some drop the offset, and some echo the user's phrase back
//! ("tomorrow 3pm"). This module accepts all of those and always yields an
//! instant in the configured zone.
//!
//! Accepted forms, tried in order:
//!
//! 1. RFC 3339 with an offset or `Z`, and ISO forms with a `+0200` style
//!    offset, converted into the target zone
//! 2. Absolute dates with a trailing ` UTC`, ` GMT` or `Z`, read as UTC
//! 3. Absolute dates without an offset, interpreted in the target zone:
//!    naive ISO date-times, `YYYY-MM-DD` or `YYYY/MM/DD` followed by any clock
//!    time, and month names (`October 23, 2026 12:00 PM`, `Fri, Oct 23 at noon`).
//!    A date with no clock time is midnight. A month name without a year is
//!    the next such date on or after today.
//! 4. Relative phrases: `today`, `tonight`, `tomorrow`, weekday names
//!    (optionally prefixed by `next`/`this`), each optionally combined with a
//!    clock time such as `3pm`, `3:30 p.m.`, `15:00`, `noon`, `midnight` or a
//!    bare hour after `at` (`tomorrow at 3` is 03:00, read on a 24-hour clock)

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Suffixes that pin an otherwise naive date-time to UTC
const UTC_SUFFIXES: &[&str] = &[" UTC", " GMT", "UTC", "Z"];

/// Filler words allowed around a relative day and time
const FILLER_WORDS: &[&str] = &["at", "on", "next", "this", "@"];

/// Start time for "tonight" when no clock time is given
const TONIGHT_HOUR: u32 = 20;
/// Start time for a named day when no clock time is given
const DEFAULT_HOUR: u32 = 9;

// Group 1 is a self-describing clock time, group 2 a bare hour after "at".
// The first branch must win on "at 3 pm" and "at 3:30".
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:at\s+)?(noon|midnight|\d{1,2}(?::\d{2})?\s*[ap]\.?m\b\.?|\d{1,2}:\d{2})|\bat\s+(\d{1,2})\b",
    )
    .expect("time regex is valid")
});

static NUMERIC_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{4})[-/](\d{1,2})[-/](\d{1,2})(?:(?:\s+|t)(?:at\s+)?(.+))?$")
        .expect("numeric date regex is valid")
});

static MONTH_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(?:mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?,?\s+)?(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?(?:,?\s+(\d{4}))?(?:,?\s+(?:at\s+)?(.+))?$",
    )
    .expect("month date regex is valid")
});

static AMPM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{1,2})(?::(\d{2}))?\s*([ap])?\.?(?:m\.?)?$").expect("am/pm regex is valid")
});

static DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(today|tonight|tomorrow|monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tues|tue|wed|thurs|thur|thu|fri|sat|sun)\b",
    )
    .expect("day regex is valid")
});

/// Parse an event start time, attaching `tz` when the input has no offset.
///
/// `now` anchors relative phrases. Returns `None` if nothing matched.
pub fn parse_event_time(raw: &str, now: DateTime<Tz>, tz: Tz) -> Option<DateTime<Tz>> {
    let input = raw.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&tz));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Some(dt.with_timezone(&tz));
        }
    }

    let today = now.with_timezone(&tz).date_naive();
    if let Some(naive) = strip_utc_suffix(input).and_then(|rest| parse_absolute(rest, today)) {
        return Some(Utc.from_utc_datetime(&naive).with_timezone(&tz));
    }
    if let Some(naive) = parse_absolute(input, today) {
        return localize(naive, tz);
    }

    let parsed = parse_relative(input, today, tz);
    if parsed.is_none() {
        debug!("Could not parse time expression '{}'", input);
    }
    parsed
}

fn strip_utc_suffix(input: &str) -> Option<&str> {
    let upper = input.to_ascii_uppercase();
    UTC_SUFFIXES
        .iter()
        .find(|suffix| upper.ends_with(*suffix))
        .map(|suffix| input[..input.len() - suffix.len()].trim_end())
}

/// A wall-clock date-time with no zone information, or `None`
fn parse_absolute(input: &str, today: NaiveDate) -> Option<NaiveDateTime> {
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive);
        }
    }

    if let Some(caps) = NUMERIC_DATE_RE.captures(input) {
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )?;
        return with_clock_time(date, caps.get(4).map(|m| m.as_str()));
    }

    if let Some(caps) = MONTH_DATE_RE.captures(input) {
        let month = parse_month(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let date = match caps.get(3) {
            Some(year) => NaiveDate::from_ymd_opt(year.as_str().parse().ok()?, month, day)?,
            None => {
                let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
                match this_year {
                    Some(date) if date >= today => date,
                    _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day)?,
                }
            }
        };
        return with_clock_time(date, caps.get(4).map(|m| m.as_str()));
    }

    None
}

/// Midnight when no time is given; an unreadable time fails the whole date
fn with_clock_time(date: NaiveDate, time: Option<&str>) -> Option<NaiveDateTime> {
    let time = match time {
        Some(time) => parse_clock_time(time)?,
        None => NaiveTime::MIN,
    };
    Some(date.and_time(time))
}

fn parse_month(word: &str) -> Option<u32> {
    let month = match word.to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Attach a zone to a wall-clock time. DST gaps have no mapping and fail.
fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive).earliest()
}

fn parse_relative(input: &str, today: NaiveDate, tz: Tz) -> Option<DateTime<Tz>> {
    let lower = input.to_lowercase();
    let lower = lower.trim_end_matches(['.', ',', '!']);

    let time_caps = TIME_RE.captures(lower);
    let time_match = time_caps.as_ref().and_then(|caps| caps.get(0));
    let day_match = DAY_RE.find(lower);
    if time_match.is_none() && day_match.is_none() {
        return None;
    }

    // Everything besides the day and the time must be filler.
    let mut rest = lower.to_string();
    let mut spans: Vec<(usize, usize)> =
        [time_match, day_match].iter().flatten().map(|m| (m.start(), m.end())).collect();
    spans.sort_by(|a, b| b.0.cmp(&a.0));
    for (start, end) in spans {
        rest.replace_range(start..end, " ");
    }
    if rest.split_whitespace().any(|word| !FILLER_WORDS.contains(&word)) {
        return None;
    }

    let day_word = day_match.map(|m| m.as_str());
    let date = match day_word {
        None | Some("today") | Some("tonight") => today,
        Some("tomorrow") => today + Duration::days(1),
        Some(word) => next_weekday(today, parse_weekday(word)?),
    };

    let clock = time_caps.as_ref().and_then(|caps| caps.get(1).or_else(|| caps.get(2)));
    let time = match clock {
        Some(m) => parse_clock_time(m.as_str())?,
        None if day_word == Some("tonight") => NaiveTime::from_hms_opt(TONIGHT_HOUR, 0, 0)?,
        None => NaiveTime::from_hms_opt(DEFAULT_HOUR, 0, 0)?,
    };

    localize(date.and_time(time), tz)
}

/// Next occurrence of `weekday` strictly after `today`
fn next_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let current = today.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    let mut ahead = (target - current + 7) % 7;
    if ahead == 0 {
        ahead = 7;
    }
    today + Duration::days(ahead)
}

fn parse_weekday(word: &str) -> Option<Weekday> {
    match word {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thur" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Parse a clock time like "8pm", "10:30 a.m.", "15:00", "noon"
pub fn parse_clock_time(time_str: &str) -> Option<NaiveTime> {
    let time_lower = time_str.trim().to_lowercase();
    match time_lower.as_str() {
        "noon" => return NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => return NaiveTime::from_hms_opt(0, 0, 0),
        _ => {}
    }

    let caps = AMPM_RE.captures(&time_lower)?;
    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(2).map_or("0", |m| m.as_str()).parse().ok()?;

    let hour_24 = match caps.get(3).map(|m| m.as_str()) {
        Some(_) if hour == 0 || hour > 12 => return None,
        Some("p") if hour < 12 => hour + 12,
        Some("a") if hour == 12 => 0,
        _ => hour,
    };

    NaiveTime::from_hms_opt(hour_24, minute, 0)
}
