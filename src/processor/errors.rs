//! Processor error types
//!
//! The processor's own rejections cover the transition table: a key in
//! the wrong state for the requested change, or a change type the target
//! aspect kind does not execute. Validation, store, and journal failures
//! pass through with their original codes.

use thiserror::Error;

use crate::event::ChangeType;
use crate::journal::JournalError;
use crate::registry::RegistryError;
use crate::store::StoreError;

/// Failure to apply a change event.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// CREATE or CREATE_ENTITY hit a key that is already present.
    #[error("Aspect '{aspect}' already exists for entity '{entity}'")]
    AlreadyExists { entity: String, aspect: String },

    /// The change requires a present key and found none.
    #[error("Aspect '{aspect}' not found for entity '{entity}'")]
    NotFound { entity: String, aspect: String },

    /// The change type is reserved and never executes.
    #[error("Change type '{change_type}' is reserved and cannot be executed")]
    UnsupportedOperation { change_type: ChangeType },

    /// The change type does not apply to a time-series aspect.
    #[error("Change type '{change_type}' is not supported for time-series aspect '{aspect}'")]
    UnsupportedForTimeseries {
        change_type: ChangeType,
        aspect: String,
    },

    /// Validation rejection from the registry, code preserved.
    #[error("{}", .0.message())]
    Validation(#[from] RegistryError),

    /// Store integrity failure, code preserved.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Journal failure, code preserved.
    #[error("{}", .0.message())]
    Journal(#[from] JournalError),
}

impl ProcessorError {
    /// Returns the stable string code.
    pub fn code(&self) -> &'static str {
        match self {
            ProcessorError::AlreadyExists { .. } => "ADB_ALREADY_EXISTS",
            ProcessorError::NotFound { .. } => "ADB_NOT_FOUND",
            ProcessorError::UnsupportedOperation { .. } => "ADB_UNSUPPORTED_OPERATION",
            ProcessorError::UnsupportedForTimeseries { .. } => "ADB_UNSUPPORTED_FOR_TIMESERIES",
            ProcessorError::Validation(e) => e.code().code(),
            ProcessorError::Store(e) => e.code(),
            ProcessorError::Journal(e) => e.code().code(),
        }
    }

    /// Returns the human message without any code prefix.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Whether this failure must halt the process.
    ///
    /// Transition and validation rejections are ordinary REJECTs; store
    /// and journal integrity failures are FATAL.
    pub fn is_fatal(&self) -> bool {
        match self {
            ProcessorError::Validation(e) => e.is_fatal(),
            ProcessorError::Store(e) => e.is_fatal(),
            ProcessorError::Journal(e) => e.is_fatal(),
            _ => false,
        }
    }
}

/// Result type for processor operations.
pub type ProcessorResult<T> = Result<T, ProcessorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_codes() {
        let err = ProcessorError::AlreadyExists {
            entity: "urn:li:dataset:sales".into(),
            aspect: "datasetProperties".into(),
        };
        assert_eq!(err.code(), "ADB_ALREADY_EXISTS");
        assert!(!err.is_fatal());

        let err = ProcessorError::NotFound {
            entity: "urn:li:dataset:sales".into(),
            aspect: "datasetProperties".into(),
        };
        assert_eq!(err.code(), "ADB_NOT_FOUND");

        let err = ProcessorError::UnsupportedOperation {
            change_type: ChangeType::Update,
        };
        assert_eq!(err.code(), "ADB_UNSUPPORTED_OPERATION");
        assert!(err.message().contains("UPDATE"));

        let err = ProcessorError::UnsupportedForTimeseries {
            change_type: ChangeType::Delete,
            aspect: "datasetUsageStatistics".into(),
        };
        assert_eq!(err.code(), "ADB_UNSUPPORTED_FOR_TIMESERIES");
        assert!(err.message().contains("DELETE"));
    }

    #[test]
    fn test_validation_passes_code_through() {
        let err: ProcessorError = RegistryError::unknown_field("usage", "bogus").into();
        assert_eq!(err.code(), "ADB_UNKNOWN_FIELD");
        assert!(!err.is_fatal());
        assert!(err.message().contains("bogus"));
        assert!(!err.message().contains("REJECT"));
    }

    #[test]
    fn test_store_failure_is_fatal() {
        let err: ProcessorError = StoreError::LockPoisoned("versioned store").into();
        assert_eq!(err.code(), "ADB_INTERNAL");
        assert!(err.is_fatal());
    }
}
