use thiserror::Error;

/// The single failure category of a numbering run.
///
/// Opening, extracting, drawing and saving all fail the same way: the run
/// stops and nothing is written.
#[derive(Debug, Error)]
pub enum NumberingError {
    #[error("processing failed: {0}")]
    ProcessingFailed(String),
}

impl NumberingError {
    pub fn failed(message: impl Into<String>) -> Self {
        NumberingError::ProcessingFailed(message.into())
    }
}

impl From<crate::config::ConfigError> for NumberingError {
    fn from(e: crate::config::ConfigError) -> Self {
        NumberingError::ProcessingFailed(e.to_string())
    }
}
