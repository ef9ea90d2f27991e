//! Downtime intervals and their canonical merged list.
//!
//! A raw downtime list as read from input may be unordered, overlapping, or
//! nested.  [`Downtimes::merge`] produces the canonical form every consumer
//! relies on: ascending by start, no two intervals overlapping or touching.
//! On the canonical form, the overlap query used for downtime-aware elapsed
//! arithmetic ([`Downtimes::excluded_between`]) is a single ordered walk.

use crate::time::Timestamp;

// ── Interval ──────────────────────────────────────────────────────────────────

/// A half-open time span `[start, end)` during which the system was offline.
///
/// Invariant: `start < end`.  Constructed only through [`Interval::new`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    start: Timestamp,
    end: Timestamp,
}

impl Interval {
    /// Create an interval; returns `None` unless `start < end`.
    pub fn new(start: Timestamp, end: Timestamp) -> Option<Interval> {
        if start < end {
            Some(Interval { start, end })
        } else {
            None
        }
    }

    #[inline]
    pub fn start(&self) -> Timestamp {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Timestamp {
        self.end
    }

    /// Whether `t` falls inside this interval.
    #[inline]
    pub fn contains(&self, t: Timestamp) -> bool {
        self.start <= t && t < self.end
    }

    /// Milliseconds of overlap between this interval and `[from, to)`.
    pub fn overlap_ms(&self, from: Timestamp, to: Timestamp) -> i64 {
        let lo = self.start.max(from);
        let hi = self.end.min(to);
        (hi - lo).max(0)
    }
}

// ── Downtimes ─────────────────────────────────────────────────────────────────

/// The canonical downtime list: sorted ascending by start, non-overlapping,
/// non-touching.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Downtimes {
    intervals: Vec<Interval>,
}

impl Downtimes {
    /// An empty list (no downtime configured).
    pub fn none() -> Downtimes {
        Downtimes::default()
    }

    /// Merge a raw interval list into canonical form.
    ///
    /// Sorts by start, then walks the sorted list unioning any interval
    /// whose start is at or before the running union's end.  Nesting,
    /// partial overlap, and exact adjacency are all handled by that one
    /// rule.
    pub fn merge(mut raw: Vec<Interval>) -> Downtimes {
        raw.sort_by_key(Interval::start);

        let mut intervals: Vec<Interval> = Vec::with_capacity(raw.len());
        for iv in raw {
            match intervals.last_mut() {
                Some(last) if iv.start <= last.end => {
                    last.end = last.end.max(iv.end);
                }
                _ => intervals.push(iv),
            }
        }

        Downtimes { intervals }
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.intervals.iter()
    }

    /// The interval containing `t`, if any.
    pub fn containing(&self, t: Timestamp) -> Option<&Interval> {
        // partition_point: first interval with start > t.
        let idx = self.intervals.partition_point(|iv| iv.start() <= t);
        let candidate = self.intervals.get(idx.checked_sub(1)?)?;
        candidate.contains(t).then_some(candidate)
    }

    /// Total downtime milliseconds overlapping `[from, to)`.
    ///
    /// This is the quantity subtracted from every elapsed-time computation:
    /// offline spans never count toward any zone's dwell time.
    pub fn excluded_between(&self, from: Timestamp, to: Timestamp) -> i64 {
        if to <= from || self.intervals.is_empty() {
            return 0;
        }

        // Skip intervals entirely before the query window.
        let first = self.intervals.partition_point(|iv| iv.end() <= from);
        self.intervals[first..]
            .iter()
            .take_while(|iv| iv.start() < to)
            .map(|iv| iv.overlap_ms(from, to))
            .sum()
    }
}

impl From<Downtimes> for Vec<Interval> {
    fn from(d: Downtimes) -> Vec<Interval> {
        d.intervals
    }
}
