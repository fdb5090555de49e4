use std::time::Duration;

use thiserror::Error;

use crate::model::CompressionMethod;

/// Failure of a single backend attempt.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{tool} exited with status {code:?}: {stderr}")]
    Execution {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} timed out after {timeout:?}")]
    Timeout { tool: String, timeout: Duration },

    #[error("Failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse PDF document: {0}")]
    DocumentParse(#[source] lopdf::Error),

    #[error("Failed to write PDF document: {0}")]
    Serialize(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// True for failures of the external tool itself (non-zero exit, timeout, launch failure).
    pub fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            BackendError::Execution { .. } | BackendError::Timeout { .. } | BackendError::Spawn { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Compression failed ({method}): {source}")]
    CompressionFailure {
        method: CompressionMethod,
        #[source]
        source: BackendError,
    },
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}
