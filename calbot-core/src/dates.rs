//! Loose date/time translation.
//!
//! `parse_when` turns human text into an [`Instant`]; `pretty_when`
//! renders an [`Instant`] back as a relative phrase. Both delegate to
//! pure `*_at` variants taking an explicit clock so every rule is
//! testable at a pinned moment.
//!
//! The parsing policy, in the order the rules are tried:
//!
//! - a trailing timezone token (`UTC`, `GMT`, `Z`, `+02:00`) is dropped
//! - relative offsets: `in 10 minutes`, `in 2 hours`, `in 3 days`
//! - a date part, a time part, or both separated by whitespace
//! - date parts: `dd/mm[/yyyy]` (day first, year defaults to the current
//!   one), `yyyy-mm-dd`, `today`, `tomorrow`, weekday names (nearest
//!   current-or-future occurrence), `19 dec` / `dec 19`
//! - time parts: `HH:MM[:SS]`, `7pm`, `7:30am`; a bare time means today
//! - a parsed midnight collapses to the date-only variant

use std::sync::OnceLock;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;

use crate::error::InvalidDate;
use crate::event::Instant;

struct WhenPatterns {
    tz_word: Regex,
    tz_attached: Regex,
    iso_t: Regex,
    in_offset: Regex,
    dmy: Regex,
    iso: Regex,
    time_24h: Regex,
    time_12h: Regex,
    day_month: Regex,
    month_day: Regex,
}

fn patterns() -> &'static WhenPatterns {
    static PATTERNS: OnceLock<WhenPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| WhenPatterns {
        // "11:30 UTC", "11:30 +02:00"
        tz_word: Regex::new(r"(?i)\s+(utc|gmt|z|[+-]\d{1,2}(:?\d{2})?)$").unwrap(),
        // "11:30:00Z", "11:30+02:00"
        tz_attached: Regex::new(r"(?i)^(?P<head>.*\d)(z|[+-]\d{2}:\d{2})$").unwrap(),
        iso_t: Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{1,2}:\d{2}(:\d{2})?$").unwrap(),
        in_offset: Regex::new(r"(?i)^in\s+(\d+)\s+(minutes?|mins?|hours?|days?|weeks?)$").unwrap(),
        dmy: Regex::new(r"^(\d{1,2})/(\d{1,2})(?:/(\d{2,4}))?$").unwrap(),
        iso: Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap(),
        time_24h: Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$").unwrap(),
        time_12h: Regex::new(r"(?i)^(\d{1,2})(?::(\d{2}))?\s*(am|pm)$").unwrap(),
        day_month: Regex::new(r"(?i)^(\d{1,2})(?:st|nd|rd|th)?\s+([a-z]{3,9})$").unwrap(),
        month_day: Regex::new(r"(?i)^([a-z]{3,9})\s+(\d{1,2})(?:st|nd|rd|th)?$").unwrap(),
    })
}

/// Parse loose date/time text against the current moment.
pub fn parse_when(text: &str) -> Result<Instant, InvalidDate> {
    parse_when_at(text, Local::now().naive_local())
}

/// Parse loose date/time text against an explicit `now`.
pub fn parse_when_at(text: &str, now: NaiveDateTime) -> Result<Instant, InvalidDate> {
    let p = patterns();
    let today = now.date();

    let stripped = p.tz_word.replace(text.trim(), "");
    let stripped = p.tz_attached.replace(stripped.trim(), "$head");
    let mut input = stripped.trim().to_string();
    if input.is_empty() {
        return Err(InvalidDate(text.to_string()));
    }
    if p.iso_t.is_match(&input) {
        input = input.replacen('T', " ", 1);
    }

    if let Some(caps) = p.in_offset.captures(&input) {
        let n: i64 = caps[1].parse().map_err(|_| InvalidDate(text.to_string()))?;
        let unit = caps[2].to_lowercase();
        let delta = if unit.starts_with("min") {
            Duration::minutes(n)
        } else if unit.starts_with("hour") {
            Duration::hours(n)
        } else if unit.starts_with("day") {
            Duration::days(n)
        } else {
            Duration::weeks(n)
        };
        return Ok(Instant::from_parsed(now + delta));
    }

    // A bare time means today at that time.
    if let Some(t) = parse_time(p, &input) {
        return Ok(Instant::from_parsed(today.and_time(t)));
    }

    if let Some(d) = parse_date(p, &input, today) {
        return Ok(Instant::Date(d));
    }

    // Date followed by a time, split at the last run of whitespace.
    if let Some((head, tail)) = input.rsplit_once(|c: char| c.is_whitespace()) {
        if let Some(t) = parse_time(p, tail.trim()) {
            if let Some(d) = parse_date(p, head.trim(), today) {
                return Ok(Instant::from_parsed(d.and_time(t)));
            }
        }
    }

    Err(InvalidDate(text.to_string()))
}

fn parse_time(p: &WhenPatterns, s: &str) -> Option<NaiveTime> {
    if let Some(c) = p.time_24h.captures(s) {
        let h: u32 = c[1].parse().ok()?;
        let m: u32 = c[2].parse().ok()?;
        let sec: u32 = c.get(3).and_then(|x| x.as_str().parse().ok()).unwrap_or(0);
        return NaiveTime::from_hms_opt(h, m, sec);
    }
    if let Some(c) = p.time_12h.captures(s) {
        let mut h: u32 = c[1].parse().ok()?;
        let m: u32 = c.get(2).and_then(|x| x.as_str().parse().ok()).unwrap_or(0);
        if h == 12 {
            h = 0;
        }
        if c[3].eq_ignore_ascii_case("pm") {
            h += 12;
        }
        return NaiveTime::from_hms_opt(h, m, 0);
    }
    None
}

fn parse_date(p: &WhenPatterns, s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = s.to_lowercase();
    match lower.as_str() {
        "today" | "tonight" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        _ => {}
    }
    if let Some(wd) = parse_weekday(&lower) {
        let ahead = (wd.num_days_from_monday() as i64
            - today.weekday().num_days_from_monday() as i64)
            .rem_euclid(7);
        return Some(today + Duration::days(ahead));
    }
    if let Some(c) = p.iso.captures(s) {
        return NaiveDate::from_ymd_opt(
            c[1].parse().ok()?,
            c[2].parse().ok()?,
            c[3].parse().ok()?,
        );
    }
    if let Some(c) = p.dmy.captures(s) {
        let day: u32 = c[1].parse().ok()?;
        let month: u32 = c[2].parse().ok()?;
        let year = match c.get(3) {
            Some(y) => {
                let y: i32 = y.as_str().parse().ok()?;
                if y < 100 { y + 2000 } else { y }
            }
            None => today.year(),
        };
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if let Some(c) = p.day_month.captures(s) {
        let day: u32 = c[1].parse().ok()?;
        let month = month_from_name(&c[2])?;
        return NaiveDate::from_ymd_opt(today.year(), month, day);
    }
    if let Some(c) = p.month_day.captures(s) {
        let month = month_from_name(&c[1])?;
        let day: u32 = c[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(today.year(), month, day);
    }
    None
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
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

fn month_from_name(s: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = s.to_lowercase();
    MONTHS
        .iter()
        .position(|m| lower.starts_with(m))
        .map(|i| i as u32 + 1)
}

/// Render an instant as a relative phrase against the current moment.
pub fn pretty_when(instant: &Instant) -> String {
    pretty_when_at(instant, Local::now().naive_local())
}

/// Render an instant as a relative phrase against an explicit `now`.
///
/// Timed instants: `now` when already past, `in N minute(s)` under an
/// hour, `today HH:MM` / `tomorrow HH:MM`, the weekday name for strictly
/// 2..=6 days ahead, `DD/MM/YYYY HH:MM` beyond that. Whole days use the
/// same day bands without the time.
pub fn pretty_when_at(instant: &Instant, now: NaiveDateTime) -> String {
    match instant {
        Instant::DateTime(dt) => {
            let secs = (*dt - now).num_seconds();
            let days = (dt.date() - now.date()).num_days();
            if secs < 0 {
                "now".to_string()
            } else if secs < 60 * 60 {
                let mins = secs / 60;
                format!("in {} minute{}", mins, if mins == 1 { "" } else { "s" })
            } else if days == 0 {
                format!("today {}", dt.format("%H:%M"))
            } else if days == 1 {
                format!("tomorrow {}", dt.format("%H:%M"))
            } else if days > 1 && days < 7 {
                dt.format("%A %H:%M").to_string()
            } else {
                dt.format("%d/%m/%Y %H:%M").to_string()
            }
        }
        Instant::Date(d) => {
            let days = (*d - now.date()).num_days();
            if days == 0 {
                "today".to_string()
            } else if days == 1 {
                "tomorrow".to_string()
            } else if days > 1 && days < 7 {
                d.format("%A").to_string()
            } else {
                d.format("%d/%m/%Y").to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Monday 2016-12-12, 10:00.
    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 12, 12)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        date(y, mo, d).and_hms_opt(h, mi, 0).unwrap()
    }

    #[test]
    fn numeric_dates_are_day_first() {
        assert_eq!(
            parse_when_at("01/02", now()),
            Ok(Instant::Date(date(2016, 2, 1)))
        );
        assert_eq!(
            parse_when_at("19/12/2016 11:30", now()),
            Ok(Instant::DateTime(dt(2016, 12, 19, 11, 30)))
        );
    }

    #[test]
    fn midnight_input_collapses_to_a_date() {
        let bare = parse_when_at("2016-01-01", now()).unwrap();
        let midnight = parse_when_at("2016-01-01 00:00", now()).unwrap();
        assert_eq!(bare, midnight);
        assert_eq!(bare, Instant::Date(date(2016, 1, 1)));
    }

    #[test]
    fn weekdays_resolve_to_the_nearest_occurrence() {
        // Today is a Monday; "monday" is today, not next week.
        assert_eq!(
            parse_when_at("monday", now()),
            Ok(Instant::Date(date(2016, 12, 12)))
        );
        assert_eq!(
            parse_when_at("friday", now()),
            Ok(Instant::Date(date(2016, 12, 16)))
        );
        assert_eq!(
            parse_when_at("Friday 15:00", now()),
            Ok(Instant::DateTime(dt(2016, 12, 16, 15, 0)))
        );
    }

    #[test]
    fn bare_times_mean_today() {
        assert_eq!(
            parse_when_at("9:30", now()),
            Ok(Instant::DateTime(dt(2016, 12, 12, 9, 30)))
        );
        // Past times are accepted, not rejected.
        assert_eq!(
            parse_when_at("09:00", now()),
            Ok(Instant::DateTime(dt(2016, 12, 12, 9, 0)))
        );
        assert_eq!(
            parse_when_at("7pm", now()),
            Ok(Instant::DateTime(dt(2016, 12, 12, 19, 0)))
        );
        assert_eq!(
            parse_when_at("7:30am", now()),
            Ok(Instant::DateTime(dt(2016, 12, 12, 7, 30)))
        );
        // Noon and midnight in 12-hour form.
        assert_eq!(
            parse_when_at("12pm", now()),
            Ok(Instant::DateTime(dt(2016, 12, 12, 12, 0)))
        );
        assert_eq!(
            parse_when_at("12am", now()),
            Ok(Instant::Date(date(2016, 12, 12)))
        );
    }

    #[test]
    fn relative_words_and_offsets() {
        assert_eq!(
            parse_when_at("today", now()),
            Ok(Instant::Date(date(2016, 12, 12)))
        );
        assert_eq!(
            parse_when_at("tomorrow 11:30", now()),
            Ok(Instant::DateTime(dt(2016, 12, 13, 11, 30)))
        );
        assert_eq!(
            parse_when_at("in 10 minutes", now()),
            Ok(Instant::DateTime(dt(2016, 12, 12, 10, 10)))
        );
        assert_eq!(
            parse_when_at("in 2 days", now()),
            Ok(Instant::DateTime(dt(2016, 12, 14, 10, 0)))
        );
    }

    #[test]
    fn month_names_both_ways_round() {
        assert_eq!(
            parse_when_at("1 feb", now()),
            Ok(Instant::Date(date(2016, 2, 1)))
        );
        assert_eq!(
            parse_when_at("feb 1", now()),
            Ok(Instant::Date(date(2016, 2, 1)))
        );
        assert_eq!(
            parse_when_at("19th December 18:00", now()),
            Ok(Instant::DateTime(dt(2016, 12, 19, 18, 0)))
        );
    }

    #[test]
    fn timezone_tokens_are_ignored() {
        assert_eq!(
            parse_when_at("19/12/2016 11:30 UTC", now()),
            Ok(Instant::DateTime(dt(2016, 12, 19, 11, 30)))
        );
        assert_eq!(
            parse_when_at("2016-12-19T11:30:00Z", now()),
            Ok(Instant::DateTime(dt(2016, 12, 19, 11, 30)))
        );
    }

    #[test]
    fn unreadable_input_is_an_error() {
        assert!(parse_when_at("whenever", now()).is_err());
        assert!(parse_when_at("", now()).is_err());
        assert!(parse_when_at("32/13", now()).is_err());
    }

    #[test]
    fn past_times_render_as_now() {
        let past = Instant::DateTime(now() - Duration::minutes(5));
        assert_eq!(pretty_when_at(&past, now()), "now");
    }

    #[test]
    fn minutes_band_is_exclusive_at_the_hour() {
        let one = Instant::DateTime(now() + Duration::minutes(1));
        assert_eq!(pretty_when_at(&one, now()), "in 1 minute");

        let soon = Instant::DateTime(now() + Duration::seconds(30));
        assert_eq!(pretty_when_at(&soon, now()), "in 0 minutes");

        let ten = Instant::DateTime(now() + Duration::minutes(10));
        assert_eq!(pretty_when_at(&ten, now()), "in 10 minutes");

        let hour = Instant::DateTime(now() + Duration::minutes(60));
        assert_eq!(pretty_when_at(&hour, now()), "today 11:00");

        let over = Instant::DateTime(now() + Duration::minutes(61));
        assert_eq!(pretty_when_at(&over, now()), "today 11:01");
    }

    #[test]
    fn day_bands_for_timed_instants() {
        let tonight = Instant::DateTime(dt(2016, 12, 12, 23, 15));
        assert_eq!(pretty_when_at(&tonight, now()), "today 23:15");

        let tomorrow = Instant::DateTime(dt(2016, 12, 13, 11, 30));
        assert_eq!(pretty_when_at(&tomorrow, now()), "tomorrow 11:30");

        let two_days = Instant::DateTime(dt(2016, 12, 14, 10, 0));
        assert_eq!(pretty_when_at(&two_days, now()), "Wednesday 10:00");

        let six_days = Instant::DateTime(dt(2016, 12, 18, 9, 0));
        assert_eq!(pretty_when_at(&six_days, now()), "Sunday 09:00");

        let week_out = Instant::DateTime(dt(2016, 12, 19, 11, 30));
        assert_eq!(pretty_when_at(&week_out, now()), "19/12/2016 11:30");
    }

    #[test]
    fn day_bands_for_whole_days() {
        assert_eq!(
            pretty_when_at(&Instant::Date(date(2016, 12, 12)), now()),
            "today"
        );
        assert_eq!(
            pretty_when_at(&Instant::Date(date(2016, 12, 13)), now()),
            "tomorrow"
        );
        assert_eq!(
            pretty_when_at(&Instant::Date(date(2016, 12, 14)), now()),
            "Wednesday"
        );
        assert_eq!(
            pretty_when_at(&Instant::Date(date(2016, 12, 19)), now()),
            "19/12/2016"
        );
    }
}
