//! The per-animal occupancy state machine.
//!
//! # Accounting model
//!
//! Each observation is processed in two steps.  Step one credits the time
//! since the previous credit point to the *committed* zone — attribution is
//! never retroactive, so a zone only starts earning dwell once it is
//! committed.  Step two runs the hysteresis decision: an observation in a
//! different zone opens (or continues) a pending candidacy, and the
//! candidate replaces the committed zone once it has been the observed zone
//! for a net `min_zone_time_ms` (downtime excluded).  Brief reads from an
//! antenna in a neighboring zone therefore never register as zone changes.
//!
//! The initial commitment at the first observation counts as one zone
//! change, so a change count is always the number of commitments.
//!
//! # Day boundaries
//!
//! Dwell and change counters are kept per calendar day and sealed into a
//! [`DaySummary`] when the tracker rolls past midnight.  Without
//! `fill_day`, a day's accounting spans its first to its last observation
//! and the overnight gap is credited to nobody; with `fill_day`, the
//! committed zone is credited through `24:00:00.00` and the new day is
//! anchored at its midnight, so nights belong to the day-end zone.

use chrono::NaiveDate;
use log::debug;

use zo_core::{Timestamp, ZoneId};

use crate::config::TrackerConfig;
use crate::error::{TrackerError, TrackerResult};

// ── Summaries ─────────────────────────────────────────────────────────────────

/// One sealed calendar day of a single animal.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DaySummary {
    pub date: NaiveDate,
    pub zone_changes: u32,
    /// Dwell milliseconds indexed by `ZoneId`.
    pub dwell_ms: Vec<i64>,
}

/// Lifetime aggregate of a single animal.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Totals {
    pub zone_changes: u64,
    /// Dwell milliseconds indexed by `ZoneId`.
    pub dwell_ms: Vec<i64>,
}

// ── ZoneTracker ───────────────────────────────────────────────────────────────

/// A zone whose candidacy is still under the debounce threshold.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
struct Pending {
    zone: ZoneId,
    /// First observation of the candidacy; net dwell is measured from here.
    since: Timestamp,
}

/// Occupancy accounting for one animal.
///
/// Observations must arrive in non-decreasing time order; two antennas
/// firing on the same hundredth tick are valid input.  The caller owns
/// cross-animal concerns (resolving antennas to zones, skipping events
/// inside downtimes, deciding when to create trackers).
#[derive(Clone, Debug)]
pub struct ZoneTracker {
    zone_count: usize,
    start_zone: Option<ZoneId>,
    end: Option<Timestamp>,

    committed: Option<ZoneId>,
    pending: Option<Pending>,
    /// Day currently being accumulated; `None` before the first observation
    /// and after `finish`.
    current_date: Option<NaiveDate>,
    /// Last instant dwell was credited up to; `None` while the current day
    /// is unanchored (no observation yet and `fill_day` off).
    credited_to: Option<Timestamp>,
    last_seen: Option<Timestamp>,
    ended: bool,

    day_changes: u32,
    day_ms: Vec<i64>,
    total_changes: u64,
    total_ms: Vec<i64>,
    sealed: Vec<DaySummary>,
}

impl ZoneTracker {
    /// `start_zone` is the zone the animal counts as occupying before its
    /// first detection; `end` is the instant after which observations are
    /// rejected.
    pub fn new(zone_count: usize, start_zone: Option<ZoneId>, end: Option<Timestamp>) -> Self {
        ZoneTracker {
            zone_count,
            start_zone,
            end,
            committed: None,
            pending: None,
            current_date: None,
            credited_to: None,
            last_seen: None,
            ended: false,
            day_changes: 0,
            day_ms: vec![0; zone_count],
            total_changes: 0,
            total_ms: vec![0; zone_count],
            sealed: Vec::new(),
        }
    }

    // ── Observation entry point ───────────────────────────────────────────

    /// Account one detection of this animal in `zone` at `ts`.
    ///
    /// An observation past the configured end credits the committed zone up
    /// to the end instant, marks the tracker ended, and is itself rejected.
    pub fn observe(&mut self, ts: Timestamp, zone: ZoneId, cfg: &TrackerConfig) -> TrackerResult<()> {
        if let Some(last) = self.last_seen
            && ts < last
        {
            return Err(TrackerError::OutOfOrder { last, observed: ts });
        }
        if let Some(end) = self.end {
            if self.ended {
                return Err(TrackerError::AfterEnd { end, observed: ts });
            }
            if ts > end {
                self.close_at(end, cfg);
                return Err(TrackerError::AfterEnd { end, observed: ts });
            }
        }

        if self.current_date.is_none() {
            self.start(ts, zone, cfg);
        } else {
            self.advance_to(ts.date(), cfg);
            self.credit_until(ts, cfg);
            self.transition(ts, zone, cfg);
        }
        self.last_seen = Some(ts);
        Ok(())
    }

    /// First observation: commit the configured start zone if there is one,
    /// otherwise the observed zone.  Either way the commitment is the first
    /// zone change.
    fn start(&mut self, ts: Timestamp, zone: ZoneId, cfg: &TrackerConfig) {
        let date = ts.date();
        self.current_date = Some(date);
        self.committed = Some(self.start_zone.unwrap_or(zone));
        self.record_change();
        self.credited_to = Some(if cfg.fill_day { Timestamp::day_start(date) } else { ts });
        self.credit_until(ts, cfg);
        self.transition(ts, zone, cfg);
    }

    // ── Step one: dwell credit ────────────────────────────────────────────

    /// Credit the committed zone from the last credit point to `ts`, net of
    /// downtime, and move the credit point forward.  An unanchored day is
    /// anchored at `ts` without crediting anything.
    fn credit_until(&mut self, ts: Timestamp, cfg: &TrackerConfig) {
        if let Some(zone) = self.committed
            && let Some(from) = self.credited_to
            && from < ts
        {
            let ms = ts.since(from) - cfg.downtimes.excluded_between(from, ts);
            self.day_ms[zone.index()] += ms;
            self.total_ms[zone.index()] += ms;
        }
        self.credited_to = Some(ts);
    }

    // ── Step two: hysteresis ──────────────────────────────────────────────

    fn transition(&mut self, ts: Timestamp, zone: ZoneId, cfg: &TrackerConfig) {
        let Some(committed) = self.committed else { return };

        if zone == committed {
            self.pending = None;
            return;
        }

        let since = match self.pending {
            Some(p) if p.zone == zone => p.since,
            _ => ts,
        };
        let net = ts.since(since) - cfg.downtimes.excluded_between(since, ts);
        if net >= cfg.min_zone_time_ms {
            debug!("zone change {committed} -> {zone} at {ts}");
            self.committed = Some(zone);
            self.pending = None;
            self.record_change();
        } else {
            self.pending = Some(Pending { zone, since });
        }
    }

    fn record_change(&mut self) {
        self.day_changes += 1;
        self.total_changes += 1;
    }

    // ── Day boundaries ────────────────────────────────────────────────────

    /// Roll forward until the accumulating day is `date`, sealing every day
    /// passed over.  A tracker with no observations yet does not move.
    pub fn advance_to(&mut self, date: NaiveDate, cfg: &TrackerConfig) {
        while self.current_date.is_some_and(|d| d < date) {
            self.roll_day(cfg);
        }
    }

    fn roll_day(&mut self, cfg: &TrackerConfig) {
        let Some(date) = self.current_date else { return };
        let day_end = Timestamp::day_end(date);
        if cfg.fill_day {
            self.credit_until(day_end, cfg);
        }
        self.seal_day(date);

        // day_end(d) is the same instant as day_start(d + 1).
        self.current_date = Some(day_end.date());
        self.credited_to = if cfg.fill_day { Some(day_end) } else { None };
    }

    fn seal_day(&mut self, date: NaiveDate) {
        let dwell_ms = std::mem::replace(&mut self.day_ms, vec![0; self.zone_count]);
        self.sealed.push(DaySummary { date, zone_changes: self.day_changes, dwell_ms });
        self.day_changes = 0;
    }

    /// Credit the committed zone up to `end` and stop accounting.
    fn close_at(&mut self, end: Timestamp, cfg: &TrackerConfig) {
        if self.current_date.is_some() {
            self.advance_to(end.date(), cfg);
            self.credit_until(end, cfg);
            self.last_seen = Some(end);
        }
        self.ended = true;
    }

    /// Seal the final day.  With `fill_day`, an animal still being tracked
    /// is credited through `24:00:00.00` first, so every sealed day sums to
    /// a full day; an ended animal stays credited only up to its end.
    pub fn finish(&mut self, cfg: &TrackerConfig) {
        if let Some(date) = self.current_date.take() {
            if cfg.fill_day && !self.ended {
                self.credit_until(Timestamp::day_end(date), cfg);
            }
            self.seal_day(date);
        }
    }

    // ── Results ───────────────────────────────────────────────────────────

    /// Sealed days in chronological order.
    pub fn days(&self) -> &[DaySummary] {
        &self.sealed
    }

    /// Take the sealed days accumulated so far, leaving the tracker running.
    pub fn drain_days(&mut self) -> Vec<DaySummary> {
        std::mem::take(&mut self.sealed)
    }

    /// Lifetime aggregate across all days, sealed or not.
    pub fn totals(&self) -> Totals {
        Totals { zone_changes: self.total_changes, dwell_ms: self.total_ms.clone() }
    }

    pub fn committed_zone(&self) -> Option<ZoneId> {
        self.committed
    }

    pub fn last_seen(&self) -> Option<Timestamp> {
        self.last_seen
    }

    /// Whether the configured end has been reached.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}
