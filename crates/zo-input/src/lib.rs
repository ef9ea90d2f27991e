//! `zo-input` — line-oriented readers for the zone-occupancy engine.
//!
//! The RFID logger's CSV dialect is loose: any of `;`, `,`, `\t` acts as a
//! separator, mixed freely within one file, and some exports write times
//! with a decimal comma (`12:01:33,05`).  That rules out an off-the-shelf
//! CSV parser for *input*, so tokenizing lives here in [`line`]; report
//! *output* (fixed `;` dialect) uses the `csv` crate in `zo-report`.
//!
//! | Module        | Contents                                               |
//! |---------------|--------------------------------------------------------|
//! | [`line`]      | separator splitting, decimal-comma repair, id checks   |
//! | [`mappings`]  | zone and animal tables (`member id → entity` lookup)   |
//! | [`events`]    | lazy antenna [`DetectionEvent`] reader                 |
//! | [`downtimes`] | downtime rows → canonical [`zo_core::Downtimes`]       |
//!
//! All per-line problems are recovered locally: the offending line is logged
//! through the `log` facade and skipped, which is why the readers here are
//! infallible at the type level.  Only I/O failing twice in a row on the
//! same stream ends that stream early, and that too merely truncates the
//! stream.  Missing-data conditions (an empty table) are for the caller to
//! judge.

pub mod downtimes;
pub mod events;
pub mod line;
pub mod mappings;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use downtimes::read_downtimes;
pub use events::{DetectionEvent, EventReader};
pub use mappings::{AnimalDef, AnimalTable, ZoneDef, ZoneTable, read_animals, read_zones};
