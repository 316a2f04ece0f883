use thiserror::Error;

/// The error kinds a pipeline cycle can produce. Most are recorded and surfaced
/// rather than aborting the process; only `IntegrityFailure` is fatal.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("ingest failure: {0}")]
    IngestFailure(String),

    #[error("completion failure: {0}")]
    CompletionFailure(String),

    #[error("parse failure: {0}")]
    ParseFailure(String),

    #[error("validation rejection: {0}")]
    ValidationRejection(String),

    #[error("constitutional violation: {violations:?}")]
    ConstitutionalViolation { violations: Vec<String> },

    #[error("kill switch triggered: {0}")]
    KillSwitchTriggered(String),

    #[error("integrity failure: {0}")]
    IntegrityFailure(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
