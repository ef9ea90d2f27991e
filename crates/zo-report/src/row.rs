//! Report rows and animal ordering.

use std::cmp::Ordering;

use chrono::NaiveDate;

use zo_core::{format_date, format_time_of_day};
use zo_tracker::{DaySummary, Totals};

/// What span of time a row accounts for.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Period {
    Day(NaiveDate),
    Total,
}

impl Period {
    /// The date column: `DD.MM.YYYY` or the literal `total`.
    pub fn label(self) -> String {
        match self {
            Period::Day(date) => format_date(date),
            Period::Total => "total".to_owned(),
        }
    }
}

/// One report row: an animal's zone changes and per-zone dwell over one
/// period.  Dwell is indexed by `ZoneId`, i.e. in zone-table file order,
/// which is also the report's column order.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReportRow {
    pub animal: String,
    pub period: Period,
    pub zone_changes: u64,
    pub dwell_ms: Vec<i64>,
}

impl ReportRow {
    pub fn day(animal: &str, summary: &DaySummary) -> ReportRow {
        ReportRow {
            animal: animal.to_owned(),
            period: Period::Day(summary.date),
            zone_changes: u64::from(summary.zone_changes),
            dwell_ms: summary.dwell_ms.clone(),
        }
    }

    pub fn total(animal: &str, totals: &Totals) -> ReportRow {
        ReportRow {
            animal: animal.to_owned(),
            period: Period::Total,
            zone_changes: totals.zone_changes,
            dwell_ms: totals.dwell_ms.clone(),
        }
    }

    /// The row as output fields: animal, period, change count, then one
    /// `HH:MM:SS.hh` dwell per zone.  Unvisited zones render `00:00:00.00`.
    pub fn fields(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(3 + self.dwell_ms.len());
        fields.push(self.animal.clone());
        fields.push(self.period.label());
        fields.push(self.zone_changes.to_string());
        fields.extend(self.dwell_ms.iter().map(|&ms| format_time_of_day(ms)));
        fields
    }
}

/// Report order for animal ids: numeric when both ids are numeric,
/// lexicographic otherwise, so `"2"` sorts before `"10"` but `"a10"` does
/// not sort before `"a2"`.
pub fn animal_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}
