//! Calendar entities and their wire representation.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::source::{RawEvent, RawTime};

/// Wire format for whole-day start/end descriptors.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Wire format for timed start/end descriptors.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A point in time the way the remote service models it: either a whole
/// day or a concrete date and time. Always naive local time; timezone
/// information never enters the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instant {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Instant {
    /// Wrap a parsed datetime, collapsing midnight to the date-only
    /// variant. Loose input cannot distinguish "no time given" from
    /// "00:00", so a midnight-valued parse always means a whole day.
    pub fn from_parsed(dt: NaiveDateTime) -> Instant {
        if dt.hour() == 0 && dt.minute() == 0 {
            Instant::Date(dt.date())
        } else {
            Instant::DateTime(dt)
        }
    }

    /// Key used for snapshot ordering; whole days sort at midnight.
    pub fn sort_key(&self) -> NaiveDateTime {
        match self {
            Instant::Date(d) => d.and_time(NaiveTime::MIN),
            Instant::DateTime(dt) => *dt,
        }
    }

    /// End instant sent to the remote service when only a start is known:
    /// one hour later for timed events, the next day for whole-day events.
    pub fn default_end(&self) -> Instant {
        match self {
            Instant::DateTime(dt) => Instant::DateTime(*dt + Duration::hours(1)),
            Instant::Date(d) => Instant::Date(*d + Duration::days(1)),
        }
    }

    /// Wire descriptor with exactly one of `date` / `dateTime` set.
    pub fn to_raw(&self) -> RawTime {
        match self {
            Instant::Date(d) => RawTime {
                date: Some(d.format(DATE_FORMAT).to_string()),
                date_time: None,
            },
            Instant::DateTime(dt) => RawTime {
                date: None,
                date_time: Some(dt.format(DATETIME_FORMAT).to_string()),
            },
        }
    }

    /// Read a wire descriptor; `None` when neither side is usable.
    /// A timed descriptor wins over a date when both are present.
    pub fn from_raw(raw: &RawTime) -> Option<Instant> {
        if let Some(ts) = &raw.date_time {
            NaiveDateTime::parse_from_str(ts, DATETIME_FORMAT)
                .ok()
                .map(Instant::DateTime)
        } else if let Some(d) = &raw.date {
            NaiveDate::parse_from_str(d, DATE_FORMAT)
                .ok()
                .map(Instant::Date)
        } else {
            None
        }
    }
}

/// One remote calendar entry as the cache holds it. The id is assigned by
/// the remote side and never changes; everything else may be patched.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub start: Instant,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl Event {
    /// Build from a wire row; `None` when the start descriptor is missing
    /// or unreadable.
    pub fn from_raw(raw: RawEvent) -> Option<Event> {
        let start = Instant::from_raw(&raw.start)?;
        let title = if raw.summary.is_empty() {
            "(No title)".to_string()
        } else {
            raw.summary
        };
        Some(Event {
            id: raw.id,
            title,
            start,
            location: raw.location,
            description: raw.description,
        })
    }
}
