//! `zo-pipeline` — end-to-end orchestration of the zone-occupancy engine.
//!
//! Loads the zone/animal mappings and the downtime list, streams antenna
//! events through one [`zo_tracker::ZoneTracker`] per animal, and emits the
//! per-day and total report through a [`zo_report::ReportWriter`].
//!
//! | Module       | Contents                                    |
//! |--------------|---------------------------------------------|
//! | [`pipeline`] | [`Pipeline`], [`PipelineConfig`], [`run`]   |
//! | [`error`]    | fatal pipeline errors                       |

pub mod error;
pub mod pipeline;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{PipelineError, PipelineResult};
pub use pipeline::{Pipeline, PipelineConfig, run};
