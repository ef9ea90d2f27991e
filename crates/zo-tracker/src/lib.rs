//! `zo-tracker` — per-animal zone-occupancy accounting.
//!
//! One [`ZoneTracker`] per animal turns a strictly ordered stream of
//! (instant, zone) observations into per-day and lifetime dwell times and
//! zone-change counts.  The tracker owns debouncing (a zone must be
//! sustained for a configurable net time before it counts), day rollover,
//! and downtime-aware elapsed arithmetic; everything stream-shaped —
//! antenna resolution, downtime skipping, report emission — lives upstream
//! in `zo-pipeline`.
//!
//! | Module      | Contents                                      |
//! |-------------|-----------------------------------------------|
//! | [`config`]  | [`TrackerConfig`], the shared per-run knobs   |
//! | [`error`]   | rejected-observation errors                   |
//! | [`tracker`] | the state machine and its sealed-day output   |

pub mod config;
pub mod error;
pub mod tracker;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::TrackerConfig;
pub use error::{TrackerError, TrackerResult};
pub use tracker::{DaySummary, Totals, ZoneTracker};
