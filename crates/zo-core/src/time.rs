//! Time model.
//!
//! # Design
//!
//! All dwell arithmetic runs on one wide integer type: `i64` milliseconds.
//! An absolute instant is a [`Timestamp`] — milliseconds since the calendar
//! epoch, derived from a `chrono::NaiveDate` plus a time-of-day.  Using a
//! plain integer as the canonical unit means all interval arithmetic is
//! exact and comparisons are O(1); `chrono` is only consulted at the
//! calendar boundaries (parsing, formatting, day arithmetic).
//!
//! The wire formats are those of the RFID logger: dates as `DD.MM.YYYY`,
//! times of day as `HH:MM:SS.hh` (hundredths of a second, so the effective
//! resolution is 10 ms).  A `,` is accepted as the fraction separator on
//! input since some logger exports use a decimal comma.

use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::error::{CoreError, CoreResult};

/// Milliseconds in one day.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

// ── Timestamp ─────────────────────────────────────────────────────────────────

/// An absolute instant: milliseconds since 0001-01-01 00:00 local time.
///
/// Built from a calendar date and a time-of-day; never from a system clock.
/// Cheap to copy, totally ordered, exact under subtraction.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Combine a calendar date with a time-of-day in milliseconds.
    ///
    /// `ms_of_day` may be `DAY_MS` to express the synthetic end-of-day
    /// instant `24:00:00.00` (equal to the next day's midnight).
    #[inline]
    pub fn from_parts(date: NaiveDate, ms_of_day: i64) -> Timestamp {
        Timestamp(date.num_days_from_ce() as i64 * DAY_MS + ms_of_day)
    }

    /// Midnight at the start of `date`.
    #[inline]
    pub fn day_start(date: NaiveDate) -> Timestamp {
        Timestamp::from_parts(date, 0)
    }

    /// The end-of-day instant `24:00:00.00` of `date`.
    #[inline]
    pub fn day_end(date: NaiveDate) -> Timestamp {
        Timestamp::from_parts(date, DAY_MS)
    }

    /// The calendar date this instant falls on.
    pub fn date(self) -> NaiveDate {
        let days = self.0.div_euclid(DAY_MS);
        // Round-trip of num_days_from_ce; only fails outside chrono's
        // ±262,000-year range, which no parseable input can reach.
        NaiveDate::from_num_days_from_ce_opt(days as i32).unwrap_or(NaiveDate::MIN)
    }

    /// Milliseconds since local midnight of [`Timestamp::date`].
    #[inline]
    pub fn ms_of_day(self) -> i64 {
        self.0.rem_euclid(DAY_MS)
    }

    /// Milliseconds elapsed from `earlier` to `self` (negative if reversed).
    #[inline]
    pub fn since(self, earlier: Timestamp) -> i64 {
        self.0 - earlier.0
    }
}

impl std::ops::Add<i64> for Timestamp {
    type Output = Timestamp;
    #[inline]
    fn add(self, rhs: i64) -> Timestamp {
        Timestamp(self.0 + rhs)
    }
}

impl std::ops::Sub for Timestamp {
    type Output = i64;
    #[inline]
    fn sub(self, rhs: Timestamp) -> i64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            format_date(self.date()),
            format_time_of_day(self.ms_of_day())
        )
    }
}

// ── Codecs ────────────────────────────────────────────────────────────────────

/// Parse a `DD.MM.YYYY` date.
pub fn parse_date(s: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%d.%m.%Y")
        .map_err(|e| CoreError::Parse(format!("invalid date {:?}: {e}", s)))
}

/// Format a date as `DD.MM.YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Parse a `HH:MM:SS[.hh]` time-of-day into milliseconds since midnight.
///
/// The fraction is hundredths of a second (one or two digits); `,` is
/// accepted in place of `.`.  Rejects out-of-range components and anything
/// at or past `24:00:00.00`.
pub fn parse_time_of_day(s: &str) -> CoreResult<i64> {
    let bad = || CoreError::Parse(format!("invalid time of day {:?}", s));

    let mut parts = s.trim().split(':');
    let (h, m, rest) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(m), Some(rest), None) => (h, m, rest),
        _ => return Err(bad()),
    };

    let (sec, frac) = match rest.split_once(['.', ',']) {
        Some((sec, frac)) => (sec, Some(frac)),
        None => (rest, None),
    };

    let hours: i64 = h.parse().map_err(|_| bad())?;
    let minutes: i64 = m.parse().map_err(|_| bad())?;
    let seconds: i64 = sec.parse().map_err(|_| bad())?;
    let hundredths: i64 = match frac {
        None => 0,
        Some(f) if f.len() == 1 || f.len() == 2 => {
            let n: i64 = f.parse().map_err(|_| bad())?;
            // A single digit is tenths: "12:00:00.5" == "12:00:00.50".
            if f.len() == 1 { n * 10 } else { n }
        }
        Some(_) => return Err(bad()),
    };

    if !(0..24).contains(&hours)
        || !(0..60).contains(&minutes)
        || !(0..60).contains(&seconds)
        || !(0..100).contains(&hundredths)
    {
        return Err(bad());
    }

    Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1000 + hundredths * 10)
}

/// Format a millisecond count as `HH:MM:SS.hh`.
///
/// Used both for times of day and for dwell totals, so the hour field is
/// unbounded (a cumulative total can exceed 24 hours).
pub fn format_time_of_day(ms: i64) -> String {
    let ms = ms.max(0);
    let hours = ms / 3_600_000;
    let minutes = ms % 3_600_000 / 60_000;
    let seconds = ms % 60_000 / 1000;
    let hundredths = ms % 1000 / 10;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{hundredths:02}")
}
