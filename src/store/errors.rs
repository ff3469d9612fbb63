//! Store error types

use thiserror::Error;

/// Failures internal to the in-memory stores.
///
/// The only failure mode is a poisoned lock, meaning a writer panicked
/// mid-mutation; the stored state can no longer be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A store lock was poisoned by a panicking writer.
    #[error("Store lock poisoned in {0}")]
    LockPoisoned(&'static str),
}

impl StoreError {
    /// Returns the stable string code.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::LockPoisoned(_) => "ADB_INTERNAL",
        }
    }

    /// Store integrity failures always halt the process.
    pub fn is_fatal(&self) -> bool {
        true
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_and_severity() {
        let err = StoreError::LockPoisoned("versioned store");
        assert_eq!(err.code(), "ADB_INTERNAL");
        assert!(err.is_fatal());
        assert!(err.to_string().contains("versioned store"));
    }
}
