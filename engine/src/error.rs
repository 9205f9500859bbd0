//! Engine-specific error types

use thiserror::Error;
use shared::{MatchId, ParticipantId, SharedError};

use crate::core::import::ImportError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Storage operation failed: {operation}: {message}")]
    StorageError { operation: String, message: String },

    #[error("Snapshot commit for {participant} at {match_id} failed: {message}")]
    CommitFailed { participant: ParticipantId, match_id: MatchId, message: String },

    #[error("Reference data error: {message}")]
    ReferenceError { message: String },

    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Validation failed with {} error(s)", errors.len())]
    Validation { errors: Vec<ImportError> },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl EngineError {
    pub fn config(field: impl Into<String>) -> Self {
        EngineError::ConfigurationError { field: field.into() }
    }

    pub fn storage(operation: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::StorageError { operation: operation.into(), message: message.into() }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
