use thiserror::Error;

use zo_core::Timestamp;

/// Observation preconditions the tracker refuses to violate silently.
///
/// Both conditions are recoverable at the stream level: the caller logs the
/// rejected observation and carries on with the next one.
#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum TrackerError {
    #[error("observation at {observed} is before the previous one at {last}")]
    OutOfOrder { last: Timestamp, observed: Timestamp },

    #[error("observation at {observed} is past the animal's end at {end}")]
    AfterEnd { end: Timestamp, observed: Timestamp },
}

pub type TrackerResult<T> = Result<T, TrackerError>;
