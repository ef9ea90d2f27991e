//! `zo-report` — turning sealed tracker output into report rows.
//!
//! | Module     | Contents                                             |
//! |------------|------------------------------------------------------|
//! | [`row`]    | [`ReportRow`], period labels, animal id ordering     |
//! | [`writer`] | the [`ReportWriter`] trait and its CSV backend       |
//! | [`error`]  | report emission errors                               |

pub mod error;
pub mod row;
pub mod writer;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{ReportError, ReportResult};
pub use row::{Period, ReportRow, animal_order};
pub use writer::{CsvReportWriter, ReportWriter};
