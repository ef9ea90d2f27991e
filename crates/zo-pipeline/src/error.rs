use thiserror::Error;

use zo_report::ReportError;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Without zones there is nothing to attribute dwell time to.
    #[error("the zone table is empty")]
    NoZones,

    #[error(transparent)]
    Report(#[from] ReportError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
