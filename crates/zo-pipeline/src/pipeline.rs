//! The orchestrator.
//!
//! Mappings and downtimes are loaded eagerly; antenna events are streamed.
//! Per-event anomalies — unknown antennas, events inside downtimes, date
//! regressions across days, per-animal time regressions — are logged and
//! skipped, never fatal.  An unmapped transponder is the one exception that
//! gains state instead of losing it: it becomes its own ad-hoc animal so
//! its detections are preserved.
//!
//! Emission is day-major: whenever the stream moves to a new date, every
//! active tracker is rolled past the completed day(s) and their rows are
//! written before any later-day row.  The totals block follows at end of
//! stream, one row per tracked animal.

use chrono::NaiveDate;
use log::{debug, info, warn};

use zo_core::{AnimalId, Downtimes};
use zo_input::{AnimalTable, DetectionEvent, EventReader, ZoneTable};
use zo_report::{ReportRow, ReportWriter, animal_order};
use zo_tracker::{DaySummary, TrackerConfig, ZoneTracker};

use crate::error::{PipelineError, PipelineResult};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Per-run knobs; the downtime list joins them once it is loaded.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PipelineConfig {
    pub min_zone_time_ms: i64,
    pub fill_day: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let tracker = TrackerConfig::default();
        PipelineConfig {
            min_zone_time_ms: tracker.min_zone_time_ms,
            fill_day: tracker.fill_day,
        }
    }
}

impl PipelineConfig {
    fn tracker_config(&self, downtimes: Downtimes) -> TrackerConfig {
        TrackerConfig {
            min_zone_time_ms: self.min_zone_time_ms,
            fill_day: self.fill_day,
            downtimes,
        }
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Accumulated run state: the loaded tables plus one lazily created tracker
/// per animal that has produced at least one usable event.
pub struct Pipeline {
    zones: ZoneTable,
    animals: AnimalTable,
    tracker_cfg: TrackerConfig,
    trackers: Vec<Option<ZoneTracker>>,
    last_date: Option<NaiveDate>,
}

impl Pipeline {
    pub fn new(
        zones: ZoneTable,
        animals: AnimalTable,
        downtimes: Downtimes,
        cfg: &PipelineConfig,
    ) -> PipelineResult<Pipeline> {
        if zones.is_empty() {
            return Err(PipelineError::NoZones);
        }
        if animals.is_empty() {
            warn!("the animal table is empty; every transponder will be registered ad hoc");
        }
        info!(
            "pipeline ready: {} zones, {} animals, {} downtime intervals",
            zones.len(),
            animals.len(),
            downtimes.len()
        );

        let trackers = (0..animals.len()).map(|_| None).collect();
        Ok(Pipeline {
            zones,
            animals,
            tracker_cfg: cfg.tracker_config(downtimes),
            trackers,
            last_date: None,
        })
    }

    /// Drain an event stream into the trackers, writing each day's rows as
    /// soon as the stream moves past it.
    pub fn process<R, W>(&mut self, mut events: EventReader<R>, out: &mut W) -> PipelineResult<()>
    where
        R: std::io::BufRead,
        W: ReportWriter,
    {
        let mut seen = 0u64;
        while let Some(event) = events.next_event() {
            seen += 1;

            // The stream is expected to be day-ordered; a line from an
            // earlier day cannot be attributed once later days are
            // underway.
            if let Some(last) = self.last_date {
                if event.date < last {
                    warn!(
                        "antenna event at {} is from a day before {}, skipping it",
                        event.timestamp(),
                        zo_core::format_date(last)
                    );
                    continue;
                }
                if event.date > last {
                    let gap = event.date.signed_duration_since(last).num_days();
                    if gap > 1 {
                        warn!(
                            "no antenna events for {} whole day(s) before {}; treating the gap as implicit downtime",
                            gap - 1,
                            zo_core::format_date(event.date)
                        );
                    }
                    self.roll_all(event.date);
                    self.write_sealed_days(out)?;
                }
            }
            self.last_date = Some(event.date);

            self.handle(event);
        }
        info!("processed {seen} antenna events");
        Ok(())
    }

    fn handle(&mut self, event: DetectionEvent) {
        let ts = event.timestamp();

        if let Some(iv) = self.tracker_cfg.downtimes.containing(ts) {
            warn!(
                "antenna event at {ts} falls inside the downtime starting {}, skipping it",
                iv.start()
            );
            return;
        }

        let Some(zone) = self.zones.zone_for_antenna(&event.antenna) else {
            warn!(
                "antenna {:?} is not mapped to any zone, dropping the event at {ts}",
                event.antenna
            );
            return;
        };

        let animal = match self.animals.animal_for_transponder(&event.transponder) {
            Some(id) => id,
            None => {
                warn!(
                    "transponder {:?} is not mapped to any animal, registering it ad hoc",
                    event.transponder
                );
                self.animals.add_adhoc(&event.transponder)
            }
        };

        if self.trackers.len() < self.animals.len() {
            self.trackers.resize_with(self.animals.len(), || None);
        }
        let tracker = self.trackers[animal.index()].get_or_insert_with(|| {
            let def = self.animals.animal(animal);
            debug!("starting tracking for animal {:?}", def.id);
            ZoneTracker::new(self.zones.len(), def.start_zone, def.end)
        });

        if let Err(e) = tracker.observe(ts, zone, &self.tracker_cfg) {
            warn!("animal {:?}: {e}, skipping the event", self.animals.animal(animal).id);
        }
    }

    /// Roll every active tracker up to `date`, completing the days the
    /// stream has moved past.  Animals without events on those days are
    /// carried forward too, so `fill_day` keeps crediting them.
    fn roll_all(&mut self, date: NaiveDate) {
        for tracker in self.trackers.iter_mut().flatten() {
            tracker.advance_to(date, &self.tracker_cfg);
        }
    }

    /// Write every sealed-but-unwritten day, ordered by date and then by
    /// animal id.
    fn write_sealed_days<W: ReportWriter>(&mut self, out: &mut W) -> PipelineResult<()> {
        let mut rows: Vec<(String, DaySummary)> = Vec::new();
        for (index, slot) in self.trackers.iter_mut().enumerate() {
            if let Some(tracker) = slot {
                let id = &self.animals.animal(AnimalId(index as u32)).id;
                for day in tracker.drain_days() {
                    rows.push((id.clone(), day));
                }
            }
        }
        rows.sort_by(|(a, x), (b, y)| x.date.cmp(&y.date).then_with(|| animal_order(a, b)));

        for (id, day) in &rows {
            out.write_row(&ReportRow::day(id, day))?;
        }
        Ok(())
    }

    /// Seal every tracker, write the remaining day rows, then the totals
    /// block: one `total` row per tracked animal in animal id order.
    pub fn emit<W: ReportWriter>(&mut self, out: &mut W) -> PipelineResult<()> {
        if let Some(last) = self.last_date {
            self.roll_all(last);
        }
        for tracker in self.trackers.iter_mut().flatten() {
            tracker.finish(&self.tracker_cfg);
        }
        self.write_sealed_days(out)?;

        let mut tracked: Vec<(String, usize)> = self
            .trackers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_some())
            .map(|(i, _)| (self.animals.animal(AnimalId(i as u32)).id.clone(), i))
            .collect();
        tracked.sort_by(|(a, _), (b, _)| animal_order(a, b));

        for (id, index) in tracked {
            let Some(tracker) = &self.trackers[index] else { continue };
            out.write_row(&ReportRow::total(&id, &tracker.totals()))?;
        }
        out.flush()?;
        Ok(())
    }

    /// Table access for callers that want to inspect the run afterwards.
    pub fn zones(&self) -> &ZoneTable {
        &self.zones
    }

    pub fn animals(&self) -> &AnimalTable {
        &self.animals
    }
}

// ── One-shot entry point ──────────────────────────────────────────────────────

/// Wire the whole engine: read mappings and downtimes, stream the events,
/// write the CSV report into `out`, and hand the sink back.
pub fn run<Z, A, D, E, W>(
    zones_in: Z,
    animals_in: A,
    downtimes_in: Option<D>,
    events_in: E,
    out: W,
    cfg: &PipelineConfig,
) -> PipelineResult<W>
where
    Z: std::io::BufRead,
    A: std::io::BufRead,
    D: std::io::BufRead,
    E: std::io::BufRead,
    W: std::io::Write,
{
    let zones = zo_input::read_zones(zones_in);
    let animals = zo_input::read_animals(animals_in, &zones);
    let downtimes = match downtimes_in {
        Some(reader) => zo_input::read_downtimes(reader),
        None => Downtimes::none(),
    };

    let mut pipeline = Pipeline::new(zones, animals, downtimes, cfg)?;
    let mut writer = zo_report::CsvReportWriter::new(out, &pipeline.zones().zone_ids())?;
    pipeline.process(EventReader::new(events_in), &mut writer)?;
    pipeline.emit(&mut writer)?;
    Ok(writer.into_inner()?)
}
