use thiserror::Error;

/// Errors that can cross the executor, storage and export boundaries.
///
/// The grid stages themselves never fail for well-formed input; only the
/// collaborators around them return these.
#[derive(Debug, Error)]
pub enum WorkbenchError {
    /// The executor rejected a query. The message is shown verbatim.
    #[error("{0}")]
    Execution(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl WorkbenchError {
    pub fn execution(message: impl Into<String>) -> Self {
        WorkbenchError::Execution(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        WorkbenchError::Storage(message.into())
    }

    /// True for failures raised by the query executor
    pub fn is_execution(&self) -> bool {
        matches!(self, WorkbenchError::Execution(_))
    }
}

pub type Result<T> = std::result::Result<T, WorkbenchError>;
