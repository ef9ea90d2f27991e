//! Zone and animal mapping tables.
//!
//! # CSV formats
//!
//! Zones, one row per zone (optional header starting with `Bereich`/`Zone`):
//!
//! ```csv
//! zone id; [x = no food]; antenna id...
//! ```
//!
//! Animals, one row per animal (optional header starting with
//! `Tier`/`Animal`/`Turkey`):
//!
//! ```csv
//! animal id; [start zone]; [end time]; [end date]; transponder id...
//! ```
//!
//! The three bracketed animal columns are positional but optional: a token
//! is taken as the start zone only if it names a known zone, and as an end
//! time only if it parses as one.  An end time without an end date (or a
//! date without a time) is a logged anomaly treated as "no end configured".
//!
//! # Contract
//!
//! Duplicate entity ids keep the first row; duplicate member ids keep the
//! first owner; rows with no valid members are skipped.  Every problem is
//! logged and recovery is per-line.  An entirely empty input produces an
//! empty table, which is logged but is not an error.

use std::io::BufRead;

use log::{debug, error, info, warn};
use rustc_hash::FxHashMap;

use zo_core::{AnimalId, Timestamp, ZoneId, parse_date, parse_time_of_day};

use crate::line::{is_fraction, is_valid_id, looks_like_time_head, split_tokens};

// ── Definitions ───────────────────────────────────────────────────────────────

/// One zone: a named set of antennas.  Immutable after the table is built.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneDef {
    pub id: String,
    pub antennas: Vec<String>,
    /// `false` when the zone was marked `x` ("no food") in the mapping file.
    /// Long unconfirmed stays in food zones are plausible; elsewhere they
    /// hint at a lost transponder.
    pub has_food: bool,
}

/// One animal: a named set of transponders plus optional start zone and
/// terminal instant.  Immutable after the table is built.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimalDef {
    pub id: String,
    pub transponders: Vec<String>,
    /// Zone the animal counts as occupying before its first detection.
    pub start_zone: Option<ZoneId>,
    /// Instant after which observations for this animal are rejected.
    pub end: Option<Timestamp>,
}

// ── ZoneTable ─────────────────────────────────────────────────────────────────

/// All zones plus the `antenna id → zone` lookup.
#[derive(Clone, Debug, Default)]
pub struct ZoneTable {
    zones: Vec<ZoneDef>,
    by_antenna: FxHashMap<String, ZoneId>,
}

impl ZoneTable {
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn zone(&self, id: ZoneId) -> &ZoneDef {
        &self.zones[id.index()]
    }

    /// The zone whose antenna produced a detection, if the antenna is known.
    pub fn zone_for_antenna(&self, antenna: &str) -> Option<ZoneId> {
        self.by_antenna.get(antenna).copied()
    }

    /// Resolve a zone by its string id (start-zone column, report order).
    pub fn zone_by_name(&self, name: &str) -> Option<ZoneId> {
        self.iter().find(|(_, z)| z.id == name).map(|(id, _)| id)
    }

    /// Zone id strings in file order — the authoritative report column order.
    pub fn zone_ids(&self) -> Vec<String> {
        self.zones.iter().map(|z| z.id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ZoneId, &ZoneDef)> {
        self.zones.iter().enumerate().map(|(i, z)| (ZoneId(i as u32), z))
    }
}

// ── AnimalTable ───────────────────────────────────────────────────────────────

/// All animals plus the `transponder id → animal` lookup.
#[derive(Clone, Debug, Default)]
pub struct AnimalTable {
    animals: Vec<AnimalDef>,
    by_transponder: FxHashMap<String, AnimalId>,
}

impl AnimalTable {
    pub fn is_empty(&self) -> bool {
        self.animals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.animals.len()
    }

    pub fn animal(&self, id: AnimalId) -> &AnimalDef {
        &self.animals[id.index()]
    }

    pub fn animal_for_transponder(&self, transponder: &str) -> Option<AnimalId> {
        self.by_transponder.get(transponder).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnimalId, &AnimalDef)> {
        self.animals.iter().enumerate().map(|(i, a)| (AnimalId(i as u32), a))
    }

    /// Register an unmapped transponder as its own single-transponder animal
    /// so its detections are preserved rather than dropped.
    pub fn add_adhoc(&mut self, transponder: &str) -> AnimalId {
        let id = AnimalId(self.animals.len() as u32);
        self.animals.push(AnimalDef {
            id: transponder.to_owned(),
            transponders: vec![transponder.to_owned()],
            start_zone: None,
            end: None,
        });
        self.by_transponder.insert(transponder.to_owned(), id);
        id
    }
}

// ── Shared line loop ──────────────────────────────────────────────────────────

/// Feed every non-blank line of `reader` to `handle`.
///
/// A single read failure skips to the next line; two consecutive failures
/// treat the stream as exhausted (per-stream recovery rule).
pub(crate) fn for_each_line<R: BufRead>(mut reader: R, source: &str, mut handle: impl FnMut(&str)) {
    let mut buf = String::new();
    let mut last_failed = false;
    loop {
        buf.clear();
        match reader.read_line(&mut buf) {
            Ok(0) => break,
            Ok(_) => {
                last_failed = false;
                let line = buf.trim_end_matches(['\r', '\n']);
                if line.trim().is_empty() {
                    debug!("skipped an empty line in {source} input");
                    continue;
                }
                handle(line);
            }
            Err(e) if last_failed => {
                error!("reading {source} input failed twice in a row, treating the stream as exhausted: {e}");
                break;
            }
            Err(e) => {
                warn!("reading a {source} line failed, trying the next one: {e}");
                last_failed = true;
            }
        }
    }
}

fn is_header(first_token: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| first_token.eq_ignore_ascii_case(k))
}

// ── Zone reader ───────────────────────────────────────────────────────────────

const ZONE_HEADER_WORDS: &[&str] = &["bereich", "zone"];

/// Read the zone mapping table.
pub fn read_zones<R: BufRead>(reader: R) -> ZoneTable {
    let mut table = ZoneTable::default();

    for_each_line(reader, "zone mapping", |line| {
        let tokens = split_tokens(line);
        if is_header(tokens[0], ZONE_HEADER_WORDS) {
            info!("skipped zone mapping header line {line:?}");
            return;
        }
        if tokens.len() < 2 {
            warn!("zone mapping line {line:?} has fewer than two columns, skipping it");
            return;
        }

        let zone_id = tokens[0];
        if !is_valid_id(zone_id) {
            warn!("invalid zone id {zone_id:?} in line {line:?}, skipping it");
            return;
        }
        if table.zones.iter().any(|z| z.id == zone_id) {
            warn!("duplicate zone id {zone_id:?}, keeping the first definition");
            return;
        }

        // Column 2 is the optional no-food marker; anything else there is
        // the first antenna id.
        let mut rest = &tokens[1..];
        let mut has_food = true;
        match rest.first() {
            Some(&"") => rest = &rest[1..],
            Some(t) if t.eq_ignore_ascii_case("x") => {
                has_food = false;
                rest = &rest[1..];
            }
            _ => {}
        }

        let mut antennas: Vec<String> = Vec::with_capacity(rest.len());
        for antenna in rest {
            if !is_valid_id(antenna) {
                warn!("invalid antenna id {antenna:?} for zone {zone_id:?}, skipping the column");
            } else if table.by_antenna.contains_key(*antenna) {
                warn!("duplicate antenna id {antenna:?}, keeping it in its first zone");
            } else if antennas.iter().any(|a| a == antenna) {
                warn!("antenna id {antenna:?} listed twice for zone {zone_id:?}");
            } else {
                antennas.push((*antenna).to_owned());
            }
        }

        if antennas.is_empty() {
            warn!("zone mapping line {line:?} has no valid antenna, skipping it");
            return;
        }

        let id = ZoneId(table.zones.len() as u32);
        for antenna in &antennas {
            table.by_antenna.insert(antenna.clone(), id);
        }
        table.zones.push(ZoneDef { id: zone_id.to_owned(), antennas, has_food });
    });

    if table.is_empty() {
        warn!("zone mapping input contained no valid data");
    }
    table
}

// ── Animal reader ─────────────────────────────────────────────────────────────

const ANIMAL_HEADER_WORDS: &[&str] = &["tier", "animal", "turkey"];

/// Read the animal mapping table.  `zones` resolves the optional start-zone
/// column.
pub fn read_animals<R: BufRead>(reader: R, zones: &ZoneTable) -> AnimalTable {
    let mut table = AnimalTable::default();

    for_each_line(reader, "animal mapping", |line| {
        let tokens = split_tokens(line);
        if is_header(tokens[0], ANIMAL_HEADER_WORDS) {
            info!("skipped animal mapping header line {line:?}");
            return;
        }
        if tokens.len() < 2 {
            warn!("animal mapping line {line:?} has fewer than two columns, skipping it");
            return;
        }

        let animal_id = tokens[0];
        if !is_valid_id(animal_id) {
            warn!("invalid animal id {animal_id:?} in line {line:?}, skipping it");
            return;
        }
        if table.animals.iter().any(|a| a.id == animal_id) {
            warn!("duplicate animal id {animal_id:?}, keeping the first definition");
            return;
        }

        let (start_zone, end, members) = parse_optional_columns(&tokens[1..], zones, animal_id);

        let mut transponders: Vec<String> = Vec::with_capacity(members.len());
        for &transponder in members {
            if !is_valid_id(transponder) {
                warn!("invalid transponder id {transponder:?} for animal {animal_id:?}, skipping the column");
            } else if table.by_transponder.contains_key(transponder) {
                warn!("duplicate transponder id {transponder:?}, keeping it on its first animal");
            } else if transponders.iter().any(|t| t == transponder) {
                warn!("transponder id {transponder:?} listed twice for animal {animal_id:?}");
            } else {
                transponders.push(transponder.to_owned());
            }
        }

        if transponders.is_empty() {
            warn!("animal mapping line {line:?} has no valid transponder, skipping it");
            return;
        }

        let id = AnimalId(table.animals.len() as u32);
        for transponder in &transponders {
            table.by_transponder.insert(transponder.clone(), id);
        }
        table.animals.push(AnimalDef {
            id: animal_id.to_owned(),
            transponders,
            start_zone,
            end,
        });
    });

    if table.is_empty() {
        warn!("animal mapping input contained no valid data");
    }
    table
}

/// Consume the optional `[start zone] [end time] [end date]` prefix of an
/// animal row; the remainder is the transponder list.
fn parse_optional_columns<'a>(
    mut rest: &'a [&'a str],
    zones: &ZoneTable,
    animal_id: &str,
) -> (Option<ZoneId>, Option<Timestamp>, &'a [&'a str]) {
    // Empty tokens in the optional prefix are positional placeholders.
    let mut placeholders = 0;
    while placeholders < 3 && rest.first() == Some(&"") {
        rest = &rest[1..];
        placeholders += 1;
    }

    let mut start_zone = None;
    if let Some(&candidate) = rest.first() {
        if let Some(zone) = zones.zone_by_name(candidate) {
            start_zone = Some(zone);
            rest = &rest[1..];
            while placeholders < 3 && rest.first() == Some(&"") {
                rest = &rest[1..];
                placeholders += 1;
            }
        }
    }

    // End time possibly severed from its fraction by a decimal comma.
    let mut end_time: Option<(i64, String)> = None;
    if let [head, frac, tail @ ..] = rest
        && looks_like_time_head(head)
        && is_fraction(frac)
        && let Ok(ms) = parse_time_of_day(&format!("{head}.{frac}"))
    {
        end_time = Some((ms, format!("{head}.{frac}")));
        rest = tail;
    } else if let [head, tail @ ..] = rest
        && let Ok(ms) = parse_time_of_day(head)
    {
        end_time = Some((ms, (*head).to_owned()));
        rest = tail;
    }

    let mut end = None;
    if let Some((ms, shown)) = end_time {
        match rest.first().map(|d| parse_date(d)) {
            Some(Ok(date)) => {
                end = Some(Timestamp::from_parts(date, ms));
                rest = &rest[1..];
            }
            _ => warn!("animal {animal_id:?} has end time {shown:?} but no end date, ignoring it"),
        }
    } else if let Some(&d) = rest.first()
        && parse_date(d).is_ok()
    {
        warn!("animal {animal_id:?} has end date {d:?} but no end time, ignoring it");
        rest = &rest[1..];
    }

    (start_zone, end, rest)
}
