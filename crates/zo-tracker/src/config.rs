use zo_core::Downtimes;

/// Knobs shared by every tracker in a run.  Plain data, passed by reference
/// into each call that needs it.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackerConfig {
    /// Minimum net dwell (downtime excluded) a newly observed zone must
    /// sustain before it replaces the committed zone.  Bounces shorter than
    /// this never count as zone changes.
    pub min_zone_time_ms: i64,

    /// When set, each day is accounted midnight to midnight: the day-end
    /// zone is credited through `24:00:00.00` and overnight spans belong to
    /// it.  When unset, a day spans its first to its last observation.
    pub fill_day: bool,

    /// Canonical downtime list; offline spans are excluded from all dwell
    /// and debounce arithmetic.
    pub downtimes: Downtimes,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            min_zone_time_ms: 5 * 60 * 1000,
            fill_day: false,
            downtimes: Downtimes::none(),
        }
    }
}
