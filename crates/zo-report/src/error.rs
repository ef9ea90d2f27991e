use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("row carries {got} zone columns but the report has {want}")]
    ZoneCount { want: usize, got: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;
