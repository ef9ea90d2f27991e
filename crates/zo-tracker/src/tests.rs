//! Unit tests for zo-tracker.

use chrono::NaiveDate;

use zo_core::{DAY_MS, Downtimes, Interval, Timestamp, ZoneId};

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::tracker::ZoneTracker;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Route tracker debug logs through env_logger when a test fails.
fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const A: ZoneId = ZoneId(0);
const B: ZoneId = ZoneId(1);
const C: ZoneId = ZoneId(2);

const SEC: i64 = 1000;
const HOUR: i64 = 3_600_000;

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 3, n).unwrap()
}

/// Instant `ms` into day `n` of the test month.
fn at(n: u32, ms: i64) -> Timestamp {
    Timestamp::from_parts(day(n), ms)
}

fn cfg(min_zone_time_ms: i64) -> TrackerConfig {
    TrackerConfig { min_zone_time_ms, ..TrackerConfig::default() }
}

fn fill_cfg(min_zone_time_ms: i64) -> TrackerConfig {
    TrackerConfig { min_zone_time_ms, fill_day: true, ..TrackerConfig::default() }
}

fn downtime_cfg(min_zone_time_ms: i64, spans: &[(Timestamp, Timestamp)]) -> TrackerConfig {
    let raw = spans.iter().map(|&(s, e)| Interval::new(s, e).unwrap()).collect();
    TrackerConfig {
        min_zone_time_ms,
        downtimes: Downtimes::merge(raw),
        ..TrackerConfig::default()
    }
}

fn tracker() -> ZoneTracker {
    ZoneTracker::new(3, None, None)
}

// ── Zone changes ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod changes {
    use super::*;

    #[test]
    fn initial_commitment_is_the_first_change() {
        let c = cfg(0);
        let mut t = tracker();
        t.observe(at(1, 0), A, &c).unwrap();
        assert_eq!(t.committed_zone(), Some(A));
        assert_eq!(t.totals().zone_changes, 1);
    }

    #[test]
    fn zero_threshold_commits_every_new_zone() {
        // A, B, B, A with no debounce: three commitments in total.
        let c = cfg(0);
        let mut t = tracker();
        t.observe(at(1, 0), A, &c).unwrap();
        t.observe(at(1, 10 * SEC), B, &c).unwrap();
        t.observe(at(1, 20 * SEC), B, &c).unwrap();
        t.observe(at(1, 30 * SEC), A, &c).unwrap();
        assert_eq!(t.totals().zone_changes, 3);
        assert_eq!(t.committed_zone(), Some(A));
    }

    #[test]
    fn large_threshold_never_commits_again() {
        // Same observations, debounce longer than the whole sequence.
        let c = cfg(DAY_MS);
        let mut t = tracker();
        t.observe(at(1, 0), A, &c).unwrap();
        t.observe(at(1, 10 * SEC), B, &c).unwrap();
        t.observe(at(1, 20 * SEC), B, &c).unwrap();
        t.observe(at(1, 30 * SEC), A, &c).unwrap();
        assert_eq!(t.totals().zone_changes, 1);
        assert_eq!(t.committed_zone(), Some(A));
    }

    #[test]
    fn bounce_shorter_than_threshold_is_ignored() {
        let c = cfg(5 * 60 * SEC);
        let mut t = tracker();
        t.observe(at(1, 0), A, &c).unwrap();
        t.observe(at(1, 60 * SEC), B, &c).unwrap();
        t.observe(at(1, 120 * SEC), A, &c).unwrap();
        t.observe(at(1, 180 * SEC), A, &c).unwrap();
        assert_eq!(t.totals().zone_changes, 1);
        assert_eq!(t.committed_zone(), Some(A));
    }

    #[test]
    fn sustained_zone_commits_once_threshold_is_met() {
        let c = cfg(5 * 60 * SEC);
        let mut t = tracker();
        t.observe(at(1, 0), A, &c).unwrap();
        t.observe(at(1, 60 * SEC), B, &c).unwrap();
        t.observe(at(1, 3 * 60 * SEC), B, &c).unwrap(); // 2 min in B: not yet
        assert_eq!(t.committed_zone(), Some(A));
        t.observe(at(1, 7 * 60 * SEC), B, &c).unwrap(); // 6 min in B: commit
        assert_eq!(t.committed_zone(), Some(B));
        assert_eq!(t.totals().zone_changes, 2);
    }

    #[test]
    fn candidacy_resets_when_the_committed_zone_reappears() {
        let c = cfg(5 * 60 * SEC);
        let mut t = tracker();
        t.observe(at(1, 0), A, &c).unwrap();
        t.observe(at(1, 60 * SEC), B, &c).unwrap();
        t.observe(at(1, 120 * SEC), A, &c).unwrap();
        // B again: the earlier candidacy is gone, the clock restarts.
        t.observe(at(1, 180 * SEC), B, &c).unwrap();
        t.observe(at(1, 5 * 60 * SEC), B, &c).unwrap(); // 2 min: not yet
        assert_eq!(t.committed_zone(), Some(A));
        t.observe(at(1, 9 * 60 * SEC), B, &c).unwrap(); // 6 min: commit
        assert_eq!(t.committed_zone(), Some(B));
    }

    #[test]
    fn switching_candidates_restarts_the_clock() {
        let c = cfg(5 * 60 * SEC);
        let mut t = tracker();
        t.observe(at(1, 0), A, &c).unwrap();
        t.observe(at(1, 60 * SEC), B, &c).unwrap();
        t.observe(at(1, 2 * 60 * SEC), C, &c).unwrap();
        t.observe(at(1, 6 * 60 * SEC), C, &c).unwrap(); // 4 min in C: not yet
        assert_eq!(t.committed_zone(), Some(A));
        t.observe(at(1, 8 * 60 * SEC), C, &c).unwrap(); // 6 min: commit
        assert_eq!(t.committed_zone(), Some(C));
        assert_eq!(t.totals().zone_changes, 2);
    }

    #[test]
    fn configured_start_zone_is_the_initial_commitment() {
        let c = cfg(0);
        let mut t = ZoneTracker::new(3, Some(B), None);
        t.observe(at(1, 0), A, &c).unwrap();
        // Commit B at creation, then immediately change to the observed A.
        assert_eq!(t.committed_zone(), Some(A));
        assert_eq!(t.totals().zone_changes, 2);
    }

    #[test]
    fn start_zone_matching_first_observation_is_one_change() {
        let c = cfg(0);
        let mut t = ZoneTracker::new(3, Some(A), None);
        t.observe(at(1, 0), A, &c).unwrap();
        assert_eq!(t.totals().zone_changes, 1);
    }
}

// ── Dwell attribution ─────────────────────────────────────────────────────────

#[cfg(test)]
mod dwell {
    use super::*;

    #[test]
    fn time_accrues_to_the_committed_zone() {
        let c = cfg(0);
        let mut t = tracker();
        t.observe(at(1, 0), A, &c).unwrap();
        t.observe(at(1, 60 * SEC), B, &c).unwrap();
        t.observe(at(1, 150 * SEC), B, &c).unwrap();
        let totals = t.totals();
        assert_eq!(totals.dwell_ms[A.index()], 60 * SEC);
        assert_eq!(totals.dwell_ms[B.index()], 90 * SEC);
        assert_eq!(totals.dwell_ms[C.index()], 0);
    }

    #[test]
    fn attribution_is_never_retroactive() {
        // B is pending from 60s but only commits at 400s; everything up to
        // the commit instant stays with A.
        let c = cfg(300 * SEC);
        let mut t = tracker();
        t.observe(at(1, 0), A, &c).unwrap();
        t.observe(at(1, 60 * SEC), B, &c).unwrap();
        t.observe(at(1, 400 * SEC), B, &c).unwrap();
        assert_eq!(t.committed_zone(), Some(B));
        let totals = t.totals();
        assert_eq!(totals.dwell_ms[A.index()], 400 * SEC);
        assert_eq!(totals.dwell_ms[B.index()], 0);
    }

    #[test]
    fn downtime_is_excluded_from_dwell() {
        let c = downtime_cfg(0, &[(at(1, 100 * SEC), at(1, 200 * SEC))]);
        let mut t = tracker();
        t.observe(at(1, 0), A, &c).unwrap();
        t.observe(at(1, 300 * SEC), A, &c).unwrap();
        assert_eq!(t.totals().dwell_ms[A.index()], 200 * SEC);
    }

    #[test]
    fn debounce_clock_is_net_of_downtime() {
        // Gross candidacy 200s, minus 100s downtime: exactly the threshold.
        let c = downtime_cfg(100 * SEC, &[(at(1, 60 * SEC), at(1, 160 * SEC))]);
        let mut t = tracker();
        t.observe(at(1, 0), A, &c).unwrap();
        t.observe(at(1, 50 * SEC), B, &c).unwrap();
        t.observe(at(1, 249 * SEC), B, &c).unwrap(); // net 99s: not yet
        assert_eq!(t.committed_zone(), Some(A));
        t.observe(at(1, 250 * SEC), B, &c).unwrap(); // net 100s: commit
        assert_eq!(t.committed_zone(), Some(B));
    }

    #[test]
    fn day_dwell_sums_to_first_to_last_minus_downtime() {
        let c = downtime_cfg(0, &[(at(1, 500 * SEC), at(1, 600 * SEC))]);
        let mut t = tracker();
        t.observe(at(1, 100 * SEC), A, &c).unwrap();
        t.observe(at(1, 450 * SEC), B, &c).unwrap();
        t.observe(at(1, 700 * SEC), A, &c).unwrap();
        t.observe(at(1, 900 * SEC), A, &c).unwrap();
        t.finish(&c);

        let days = t.days();
        assert_eq!(days.len(), 1);
        let total: i64 = days[0].dwell_ms.iter().sum();
        assert_eq!(total, (900 - 100 - 100) * SEC);
    }
}

// ── Day boundaries ────────────────────────────────────────────────────────────

#[cfg(test)]
mod days {
    use super::*;

    #[test]
    fn without_fill_day_a_day_spans_its_observations() {
        let c = cfg(0);
        let mut t = tracker();
        t.observe(at(1, 10 * HOUR), A, &c).unwrap();
        t.observe(at(1, 20 * HOUR), A, &c).unwrap();
        t.observe(at(2, 8 * HOUR), A, &c).unwrap();
        t.observe(at(2, 9 * HOUR), A, &c).unwrap();
        t.finish(&c);

        let days = t.days();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, day(1));
        assert_eq!(days[0].dwell_ms[A.index()], 10 * HOUR);
        // The overnight gap is credited to nobody.
        assert_eq!(days[1].dwell_ms[A.index()], 1 * HOUR);
    }

    #[test]
    fn fill_day_accounts_midnight_to_midnight() {
        let c = fill_cfg(0);
        let mut t = tracker();
        t.observe(at(1, 10 * HOUR), A, &c).unwrap();
        t.observe(at(2, 9 * HOUR), A, &c).unwrap();
        t.finish(&c);

        let days = t.days();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].dwell_ms[A.index()], DAY_MS);
        assert_eq!(days[1].dwell_ms[A.index()], DAY_MS);
    }

    #[test]
    fn fill_day_every_sealed_day_sums_to_a_full_day() {
        // The final day is extended to 24:00:00.00 like any other.
        let c = fill_cfg(0);
        let mut t = tracker();
        t.observe(at(1, 10 * HOUR), A, &c).unwrap();
        t.observe(at(1, 20 * HOUR), B, &c).unwrap();
        t.observe(at(2, 9 * HOUR), A, &c).unwrap();
        t.finish(&c);

        for summary in t.days() {
            let sum: i64 = summary.dwell_ms.iter().sum();
            assert_eq!(sum, DAY_MS, "day {}", summary.date);
        }
    }

    #[test]
    fn fill_day_credits_the_day_end_zone_overnight() {
        let c = fill_cfg(0);
        let mut t = tracker();
        t.observe(at(1, 10 * HOUR), A, &c).unwrap();
        t.observe(at(1, 20 * HOUR), B, &c).unwrap();
        t.observe(at(2, 6 * HOUR), B, &c).unwrap();
        t.finish(&c);

        let days = t.days();
        assert_eq!(days[0].dwell_ms[A.index()], 20 * HOUR);
        assert_eq!(days[0].dwell_ms[B.index()], 4 * HOUR);
        assert_eq!(days[1].dwell_ms[B.index()], DAY_MS);
    }

    #[test]
    fn fill_day_covers_days_with_no_observations() {
        let c = fill_cfg(0);
        let mut t = tracker();
        t.observe(at(1, 10 * HOUR), A, &c).unwrap();
        t.observe(at(3, 1 * HOUR), A, &c).unwrap();
        t.finish(&c);

        let days = t.days();
        assert_eq!(days.len(), 3);
        assert_eq!(days[1].date, day(2));
        assert_eq!(days[1].dwell_ms[A.index()], DAY_MS);
        assert_eq!(days[1].zone_changes, 0);
        assert_eq!(days[2].dwell_ms[A.index()], DAY_MS);
    }

    #[test]
    fn without_fill_day_a_skipped_day_is_empty() {
        let c = cfg(0);
        let mut t = tracker();
        t.observe(at(1, 10 * HOUR), A, &c).unwrap();
        t.observe(at(3, 1 * HOUR), A, &c).unwrap();
        t.observe(at(3, 2 * HOUR), A, &c).unwrap();
        t.finish(&c);

        let days = t.days();
        assert_eq!(days.len(), 3);
        assert!(days[1].dwell_ms.iter().all(|&ms| ms == 0));
        assert_eq!(days[2].dwell_ms[A.index()], 1 * HOUR);
    }

    #[test]
    fn day_change_counts_are_per_day() {
        let c = cfg(0);
        let mut t = tracker();
        t.observe(at(1, 10 * HOUR), A, &c).unwrap(); // initial commitment
        t.observe(at(1, 11 * HOUR), B, &c).unwrap();
        t.observe(at(2, 10 * HOUR), A, &c).unwrap();
        t.finish(&c);

        let days = t.days();
        assert_eq!(days[0].zone_changes, 2);
        assert_eq!(days[1].zone_changes, 1);
        assert_eq!(t.totals().zone_changes, 3);
    }

    #[test]
    fn pending_candidacy_survives_midnight() {
        let c = cfg(5 * 60 * SEC);
        let mut t = tracker();
        t.observe(at(1, 0), A, &c).unwrap();
        t.observe(at(1, DAY_MS - 60 * SEC), B, &c).unwrap();
        t.observe(at(2, 10 * 60 * SEC), B, &c).unwrap();
        assert_eq!(t.committed_zone(), Some(B));
    }

    #[test]
    fn finish_without_observations_produces_no_days() {
        let mut t = tracker();
        t.finish(&cfg(0));
        assert!(t.days().is_empty());
        assert_eq!(t.totals().zone_changes, 0);
    }

    #[test]
    fn drain_days_leaves_the_tracker_running() {
        let c = cfg(0);
        let mut t = tracker();
        t.observe(at(1, 10 * HOUR), A, &c).unwrap();
        t.observe(at(2, 10 * HOUR), A, &c).unwrap();
        assert_eq!(t.drain_days().len(), 1);
        assert!(t.days().is_empty());

        t.observe(at(2, 11 * HOUR), A, &c).unwrap();
        t.finish(&c);
        assert_eq!(t.days().len(), 1);
        assert_eq!(t.totals().dwell_ms[A.index()], 1 * HOUR);
    }
}

// ── Ordering and end-of-life ──────────────────────────────────────────────────

#[cfg(test)]
mod ends {
    use super::*;

    #[test]
    fn regressed_observations_are_rejected() {
        init_logs();
        let c = cfg(0);
        let mut t = tracker();
        t.observe(at(1, 100 * SEC), A, &c).unwrap();
        let err = t.observe(at(1, 50 * SEC), B, &c).unwrap_err();
        assert_eq!(
            err,
            TrackerError::OutOfOrder { last: at(1, 100 * SEC), observed: at(1, 50 * SEC) }
        );
        // The rejected observation changed nothing.
        assert_eq!(t.committed_zone(), Some(A));
        assert_eq!(t.last_seen(), Some(at(1, 100 * SEC)));
    }

    #[test]
    fn equal_instant_observations_are_accepted() {
        // Two antennas firing on the same hundredth tick are valid input;
        // the second read can still carry a zone change.
        let c = cfg(0);
        let mut t = tracker();
        t.observe(at(1, 100 * SEC), A, &c).unwrap();
        t.observe(at(1, 100 * SEC), B, &c).unwrap();
        assert_eq!(t.committed_zone(), Some(B));
        assert_eq!(t.totals().zone_changes, 2);

        t.observe(at(1, 200 * SEC), B, &c).unwrap();
        assert_eq!(t.totals().dwell_ms[B.index()], 100 * SEC);
        assert_eq!(t.totals().dwell_ms[A.index()], 0);
    }

    #[test]
    fn observation_at_the_end_instant_is_accepted() {
        let c = cfg(0);
        let end = at(1, 200 * SEC);
        let mut t = ZoneTracker::new(3, None, Some(end));
        t.observe(at(1, 0), A, &c).unwrap();
        t.observe(end, A, &c).unwrap();
        assert!(!t.is_ended());
    }

    #[test]
    fn observation_past_the_end_credits_up_to_the_end() {
        init_logs();
        let c = cfg(0);
        let end = at(1, 200 * SEC);
        let mut t = ZoneTracker::new(3, None, Some(end));
        t.observe(at(1, 0), A, &c).unwrap();

        let err = t.observe(at(1, 300 * SEC), B, &c).unwrap_err();
        assert_eq!(err, TrackerError::AfterEnd { end, observed: at(1, 300 * SEC) });
        assert!(t.is_ended());
        // Credited through the end instant, to the committed zone only.
        assert_eq!(t.totals().dwell_ms[A.index()], 200 * SEC);
        assert_eq!(t.totals().dwell_ms[B.index()], 0);

        // Ended for good.
        let err = t.observe(at(1, 400 * SEC), A, &c).unwrap_err();
        assert!(matches!(err, TrackerError::AfterEnd { .. }));
    }

    #[test]
    fn end_on_a_later_day_fills_the_days_between() {
        let c = fill_cfg(0);
        let end = at(2, 6 * HOUR);
        let mut t = ZoneTracker::new(3, None, Some(end));
        t.observe(at(1, 10 * HOUR), A, &c).unwrap();
        t.observe(at(3, 0), A, &c).unwrap_err();
        t.finish(&c);

        let days = t.days();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].dwell_ms[A.index()], DAY_MS);
        assert_eq!(days[1].dwell_ms[A.index()], 6 * HOUR);
    }
}
