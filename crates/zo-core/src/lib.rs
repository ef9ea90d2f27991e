//! `zo-core` — foundational types for the zone-occupancy accounting engine.
//!
//! This crate is a dependency of every other `zo-*` crate.  It intentionally
//! has no `zo-*` dependencies and minimal external ones (only `chrono` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module       | Contents                                              |
//! |--------------|-------------------------------------------------------|
//! | [`ids`]      | `ZoneId`, `AnimalId`                                  |
//! | [`time`]     | `Timestamp`, time-of-day and date codecs              |
//! | [`interval`] | `Interval`, `Downtimes` (canonical merged list)       |
//! | [`error`]    | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|-----------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types. |

pub mod error;
pub mod ids;
pub mod interval;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{AnimalId, ZoneId};
pub use interval::{Downtimes, Interval};
pub use time::{DAY_MS, Timestamp, format_date, format_time_of_day, parse_date, parse_time_of_day};
