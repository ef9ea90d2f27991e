//! Lazy antenna event reader.
//!
//! Produces one [`DetectionEvent`] per [`EventReader::next_event`] call.
//! Malformed lines never fail the read: the line is logged, skipped, and
//! the reader advances.  The stream ends when the source is drained or
//! after two consecutive low-level read failures.
//!
//! # Row format
//!
//! Exactly four columns: transponder, date (`DD.MM.YYYY`), time of day
//! (`HH:MM:SS.hh`), antenna.  A header row containing `transponder` is
//! recognized and may reorder the columns for the rest of the file:
//! `datum`/`date`, `zeit`/`time`, `antenne`/`antenna` name the other three.

use std::io::BufRead;

use chrono::NaiveDate;
use log::{debug, error, info, warn};

use zo_core::{Timestamp, parse_date, parse_time_of_day};

use crate::line::split_row;

// ── DetectionEvent ────────────────────────────────────────────────────────────

/// One validated antenna detection.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectionEvent {
    pub transponder: String,
    pub date: NaiveDate,
    /// Milliseconds since local midnight, resolution 10 ms.
    pub time_of_day: i64,
    pub antenna: String,
}

impl DetectionEvent {
    /// The absolute instant of this detection.
    #[inline]
    pub fn timestamp(&self) -> Timestamp {
        Timestamp::from_parts(self.date, self.time_of_day)
    }
}

// ── EventReader ───────────────────────────────────────────────────────────────

/// Column positions of (transponder, date, time, antenna) within a row.
type ColumnOrder = [usize; 4];

const DEFAULT_ORDER: ColumnOrder = [0, 1, 2, 3];

/// Streaming reader over an antenna event log.
pub struct EventReader<R> {
    reader: R,
    order: ColumnOrder,
    buf: String,
    last_failed: bool,
    exhausted: bool,
}

impl<R: BufRead> EventReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            order: DEFAULT_ORDER,
            buf: String::new(),
            last_failed: false,
            exhausted: false,
        }
    }

    /// Read until the next valid event, or `None` once the stream is done.
    pub fn next_event(&mut self) -> Option<DetectionEvent> {
        while !self.exhausted {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => {
                    info!("antenna event input exhausted");
                    self.exhausted = true;
                    return None;
                }
                Err(e) if self.last_failed => {
                    error!("reading antenna events failed twice in a row, treating the stream as exhausted: {e}");
                    self.exhausted = true;
                    return None;
                }
                Err(e) => {
                    warn!("reading an antenna event line failed, trying the next one: {e}");
                    self.last_failed = true;
                    continue;
                }
                Ok(_) => self.last_failed = false,
            }

            let line = self.buf.trim_end_matches(['\r', '\n']).to_owned();
            if line.trim().is_empty() {
                debug!("skipped an empty antenna event line");
                continue;
            }

            let Some(tokens) = split_row(&line, 4, &[self.order[2]]) else {
                warn!("antenna event line {line:?} does not have exactly four columns, skipping it");
                continue;
            };

            if tokens.iter().any(|t| t.eq_ignore_ascii_case("transponder")) {
                info!("read antenna event header line {line:?}");
                self.apply_header(&tokens, &line);
                continue;
            }

            if let Some(empty_at) = tokens.iter().position(|t| t.is_empty()) {
                warn!("antenna event line {line:?} has an empty column at position {empty_at}, skipping it");
                continue;
            }

            let date = match parse_date(&tokens[self.order[1]]) {
                Ok(d) => d,
                Err(e) => {
                    warn!("skipping antenna event line {line:?}: {e}");
                    continue;
                }
            };
            let time_of_day = match parse_time_of_day(&tokens[self.order[2]]) {
                Ok(t) => t,
                Err(e) => {
                    warn!("skipping antenna event line {line:?}: {e}");
                    continue;
                }
            };

            return Some(DetectionEvent {
                transponder: tokens[self.order[0]].clone(),
                date,
                time_of_day,
                antenna: tokens[self.order[3]].clone(),
            });
        }
        None
    }

    /// Derive the column order from a header row; on any unrecognized
    /// column name the previous order is kept.
    fn apply_header(&mut self, tokens: &[String], line: &str) {
        let mut order = DEFAULT_ORDER;
        let mut seen = [false; 4];

        for (pos, token) in tokens.iter().enumerate() {
            let slot = match token.to_ascii_lowercase().as_str() {
                "transponder" => 0,
                "date" | "datum" => 1,
                "time" | "zeit" => 2,
                "antenna" | "antenne" => 3,
                other => {
                    warn!("unrecognized event header column {other:?} in {line:?}, keeping the previous column order");
                    return;
                }
            };
            order[slot] = pos;
            seen[slot] = true;
        }

        if seen != [true; 4] {
            warn!("event header {line:?} does not name all four columns, keeping the previous column order");
            return;
        }
        self.order = order;
    }
}
