use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Weekday};
use regex::{Match, Regex};

static REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?xi)
^ # anchor to start of string

(?: # date part (optional, defaults to current day)
  (?: # date is in ISO format (yyyy-mm-dd)
    (\d{4})-(\d{2})-(\d{2})
    (?:\s*T?\s*) # can be either a T or nothing, with arbitrary whitespace allowed everywhere
  ) | (?: # date is a name referring to a day relative to the local date
    (yesterday | today | monday | tuesday | wednesday | thursday | friday | saturday | sunday)
    (?:\s*) # only whitespace as separator
  )
)?
#time part
(\d{2}):(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?

$ # anchor to end of string
",
    )
    .expect("Could not parse Regex")
});

/// Parses a naive local timestamp such as `2024-01-01T09:00:00`, `2024-01-01 09:00`
/// or `yesterday 17:30`.  Relative dates are resolved against `today`.
pub fn parse_timestamp(timestamp: &str, today: NaiveDate) -> Option<NaiveDateTime> {
    let captures = REGEX.captures(timestamp.trim())?;

    let today = parse_relative_date(captures.get(4).map(|f| f.as_str()), today)?;

    let date = NaiveDate::from_ymd_opt(
        capture_with_default(captures.get(1), today.year())?,
        capture_with_default(captures.get(2), today.month())?,
        capture_with_default(captures.get(3), today.day())?,
    )?;

    date.and_hms_nano_opt(
        captures[5].parse().ok()?,
        captures[6].parse().ok()?,
        capture_with_default(captures.get(7), 0)?,
        parse_nanos(captures.get(8))?,
    )
}

fn parse_relative_date(relation: Option<&str>, today: NaiveDate) -> Option<NaiveDate> {
    match relation {
        None => Some(today),
        Some(day) if day.eq_ignore_ascii_case("today") => Some(today),
        Some(day) if day.eq_ignore_ascii_case("yesterday") => today.pred_opt(),
        Some(day) => {
            let weekday = day.parse().ok()?;
            find_last_day(today, weekday)
        }
    }
}

fn find_last_day(today: NaiveDate, day_of_week: Weekday) -> Option<NaiveDate> {
    let current_day = today.weekday();
    match current_day.days_since(day_of_week) {
        // don't allow user to specify "monday" on a monday,
        // as it is ambiguous if they mean today or last monday
        0 => None,
        n => Some(today - (Days::new(n as u64))),
    }
}

fn capture_with_default<T: std::str::FromStr>(m: Option<Match>, default: T) -> Option<T> {
    match m {
        Some(m) => m.as_str().parse().ok(),
        None => Some(default),
    }
}

// "5" is half a second, not five nanoseconds
fn parse_nanos(m: Option<Match>) -> Option<u32> {
    let Some(m) = m else {
        return Some(0);
    };
    let digits = m.as_str();
    let nanos: u32 = digits.parse().ok()?;
    Some(nanos * 10u32.pow(9 - digits.len() as u32))
}
