//! Report output backends.

use std::io::Write;

use csv::WriterBuilder;

use crate::error::{ReportError, ReportResult};
use crate::row::ReportRow;

/// Sink for finished report rows.  The zone column set is fixed when the
/// writer is created; every row must carry exactly that many dwell values.
pub trait ReportWriter {
    fn write_row(&mut self, row: &ReportRow) -> ReportResult<()>;

    fn flush(&mut self) -> ReportResult<()>;
}

// ── CSV backend ───────────────────────────────────────────────────────────────

/// Semicolon-separated CSV with a header row:
/// `animal;date;zone changes;<zone id>...`.
pub struct CsvReportWriter<W: Write> {
    writer: csv::Writer<W>,
    zone_count: usize,
}

impl<W: Write> CsvReportWriter<W> {
    /// Write the header and return the writer.  `zone_ids` fixes the dwell
    /// column order for the whole report.
    pub fn new(inner: W, zone_ids: &[String]) -> ReportResult<CsvReportWriter<W>> {
        let mut writer = WriterBuilder::new().delimiter(b';').from_writer(inner);

        let mut header = vec!["animal".to_owned(), "date".to_owned(), "zone changes".to_owned()];
        header.extend(zone_ids.iter().cloned());
        writer.write_record(&header)?;

        Ok(CsvReportWriter { writer, zone_count: zone_ids.len() })
    }

    /// Flush and hand back the underlying sink.
    pub fn into_inner(self) -> ReportResult<W> {
        self.writer.into_inner().map_err(|e| ReportError::Io(e.into_error()))
    }
}

impl<W: Write> ReportWriter for CsvReportWriter<W> {
    fn write_row(&mut self, row: &ReportRow) -> ReportResult<()> {
        if row.dwell_ms.len() != self.zone_count {
            return Err(ReportError::ZoneCount {
                want: self.zone_count,
                got: row.dwell_ms.len(),
            });
        }
        self.writer.write_record(row.fields())?;
        Ok(())
    }

    fn flush(&mut self) -> ReportResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
