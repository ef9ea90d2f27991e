//! Downtime CSV reader.
//!
//! Row format: `start date; start time; end date; end time`.  Rows that do
//! not parse, or whose end is not strictly after their start, are logged and
//! skipped.  Accepted rows are merged into the canonical non-overlapping
//! list by [`zo_core::Downtimes::merge`].

use std::io::BufRead;

use log::{info, warn};

use zo_core::{Downtimes, Interval, Timestamp, parse_date, parse_time_of_day};

use crate::line::split_row;
use crate::mappings::for_each_line;

/// Read and canonicalize the downtime list.
pub fn read_downtimes<R: BufRead>(reader: R) -> Downtimes {
    let mut raw: Vec<Interval> = Vec::new();

    for_each_line(reader, "downtime", |line| {
        let Some(tokens) = split_row(line, 4, &[1, 3]) else {
            warn!("downtime line {line:?} does not have exactly four columns, skipping it");
            return;
        };

        if tokens[0].to_ascii_lowercase().starts_with("start") {
            info!("skipped downtime header line {line:?}");
            return;
        }

        let start = match parse_endpoint(&tokens[0], &tokens[1]) {
            Ok(t) => t,
            Err(e) => {
                warn!("failed to parse the start of downtime line {line:?}: {e}");
                return;
            }
        };
        let end = match parse_endpoint(&tokens[2], &tokens[3]) {
            Ok(t) => t,
            Err(e) => {
                warn!("failed to parse the end of downtime line {line:?}: {e}");
                return;
            }
        };

        match Interval::new(start, end) {
            Some(iv) => raw.push(iv),
            None => warn!("downtime line {line:?} does not end after it starts, skipping it"),
        }
    });

    if raw.is_empty() {
        info!("downtime input contained no valid intervals");
    }
    Downtimes::merge(raw)
}

fn parse_endpoint(date: &str, time: &str) -> zo_core::CoreResult<Timestamp> {
    Ok(Timestamp::from_parts(parse_date(date)?, parse_time_of_day(time)?))
}
