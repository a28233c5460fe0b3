//! Natural-language date normalization.
//!
//! Everything the extractor captures as a date funnels through
//! [`parse_natural_date`], so corrections and ordinary extraction always
//! agree on what "next friday" means. Relative phrases are resolved against
//! the caller-supplied reference date, which keeps parsing deterministic in
//! tests.

use chrono::{Datelike, Duration, Month, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})$").expect("numeric date regex"));

static MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<month>[a-z]{3,9})\s+(?P<day>\d{1,2})(?:st|nd|rd|th)?(?:\s*,?\s*(?P<year>\d{4}))?$")
        .expect("month-day regex")
});

static DAY_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<day>\d{1,2})(?:st|nd|rd|th)?\s+(?:of\s+)?(?P<month>[a-z]{3,9})(?:\s*,?\s*(?P<year>\d{4}))?$")
        .expect("day-month regex")
});

static BARE_ORDINAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:on\s+)?(?:the\s+)?(?P<day>\d{1,2})(?:st|nd|rd|th)$").expect("ordinal regex")
});

static WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:next|this)\s+)?(?P<day>monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun)$")
        .expect("weekday regex")
});

/// Parses a free-text date phrase into a calendar date.
///
/// Supported forms: ISO `YYYY-MM-DD`, numeric `DD/MM/YYYY` (day-first when
/// unambiguous), `today`/`tomorrow`, weekday names with optional
/// `next`/`this`, `December 15` / `15 December` (rolled into next year if
/// already past), and bare ordinals like `the 26th` (next occurrence).
/// Returns `None` for anything it cannot read with confidence.
pub fn parse_natural_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let t = text
        .trim()
        .trim_end_matches(['.', '!', '?', ','])
        .to_lowercase();
    if t.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(&t, "%Y-%m-%d") {
        return Some(date);
    }

    if let Some(caps) = NUMERIC.captures(&t) {
        return parse_numeric(&caps);
    }

    match t.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        _ => {}
    }

    if let Some(caps) = WEEKDAY.captures(&t) {
        let weekday = parse_weekday(&caps["day"])?;
        return Some(next_occurrence_of_weekday(today, weekday));
    }

    for (re, day_group, month_group) in [(&MONTH_DAY, "day", "month"), (&DAY_MONTH, "day", "month")]
    {
        if let Some(caps) = re.captures(&t) {
            let day: u32 = caps[day_group].parse().ok()?;
            let month = parse_month(&caps[month_group])?;
            let year = caps
                .name("year")
                .and_then(|y| y.as_str().parse::<i32>().ok());
            return month_day_to_date(month, day, year, today);
        }
    }

    if let Some(caps) = BARE_ORDINAL.captures(&t) {
        let day: u32 = caps["day"].parse().ok()?;
        return next_occurrence_of_day(day, today);
    }

    None
}

fn parse_numeric(caps: &regex::Captures<'_>) -> Option<NaiveDate> {
    let first: u32 = caps[1].parse().ok()?;
    let second: u32 = caps[2].parse().ok()?;
    let mut year: i32 = caps[3].parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    // Day-first unless the first component can only be a month.
    let (day, month) = if first > 12 {
        (first, second)
    } else if second > 12 {
        (second, first)
    } else {
        (first, second)
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    let weekday = match &name[..3.min(name.len())] {
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

fn parse_month(name: &str) -> Option<Month> {
    let month = match &name[..3.min(name.len())] {
        "jan" => Month::January,
        "feb" => Month::February,
        "mar" => Month::March,
        "apr" => Month::April,
        "may" => Month::May,
        "jun" => Month::June,
        "jul" => Month::July,
        "aug" => Month::August,
        "sep" => Month::September,
        "oct" => Month::October,
        "nov" => Month::November,
        "dec" => Month::December,
        _ => return None,
    };
    Some(month)
}

/// The next date falling on `weekday`, strictly after `today`.
fn next_occurrence_of_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (weekday.num_days_from_monday() + 7 - today.weekday().num_days_from_monday()) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    today + Duration::days(i64::from(ahead))
}

/// Month + day with an optional explicit year; rolls into next year when the
/// date has already passed.
fn month_day_to_date(month: Month, day: u32, year: Option<i32>, today: NaiveDate) -> Option<NaiveDate> {
    let month_number = month.number_from_month();
    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year, month_number, day);
    }
    let this_year = NaiveDate::from_ymd_opt(today.year(), month_number, day);
    match this_year {
        Some(date) if date >= today => Some(date),
        _ => NaiveDate::from_ymd_opt(today.year() + 1, month_number, day),
    }
}

/// Bare day-of-month ("the 26th"): this month if still ahead, else the next
/// month that actually has that day.
fn next_occurrence_of_day(day: u32, today: NaiveDate) -> Option<NaiveDate> {
    if day == 0 || day > 31 {
        return None;
    }
    let mut year = today.year();
    let mut month = today.month();
    for _ in 0..12 {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            if date >= today {
                return Some(date);
            }
        }
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
    None
}
