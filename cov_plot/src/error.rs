use thiserror::Error;

/// Fatal input errors.  Everything else (bad colors, even window sizes)
/// is normalized in place rather than raised.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Format error: {0}")]
    Format(String),
    #[error("Validation error: {0}")]
    Validation(String),
}
