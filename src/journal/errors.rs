//! Journal error types
//!
//! Error codes:
//! - ADB_JOURNAL_APPEND_FAILED (REJECT severity)
//! - ADB_JOURNAL_FSYNC_FAILED (FATAL severity)
//! - ADB_JOURNAL_CORRUPTION (FATAL severity)

use std::fmt;
use std::io;

/// Severity levels for journal errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The change is rejected, the process continues.
    Reject,
    /// Durability can no longer be trusted; the process must terminate.
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Journal-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalErrorCode {
    /// Journal write failed before the fsync barrier.
    AppendFailed,
    /// Journal fsync failed; the on-disk state is unknown.
    FsyncFailed,
    /// Checksum, framing, or sequence violation in the journal file.
    Corruption,
}

impl JournalErrorCode {
    /// Returns the stable string code.
    pub fn code(&self) -> &'static str {
        match self {
            JournalErrorCode::AppendFailed => "ADB_JOURNAL_APPEND_FAILED",
            JournalErrorCode::FsyncFailed => "ADB_JOURNAL_FSYNC_FAILED",
            JournalErrorCode::Corruption => "ADB_JOURNAL_CORRUPTION",
        }
    }

    /// Returns the severity level for this error.
    pub fn severity(&self) -> Severity {
        match self {
            JournalErrorCode::AppendFailed => Severity::Reject,
            JournalErrorCode::FsyncFailed => Severity::Fatal,
            JournalErrorCode::Corruption => Severity::Fatal,
        }
    }
}

impl fmt::Display for JournalErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Journal error with full context.
#[derive(Debug)]
pub struct JournalError {
    /// Error code.
    code: JournalErrorCode,
    /// Human-readable message.
    message: String,
    /// Optional details about the error context.
    details: Option<String>,
    /// Underlying IO error if applicable.
    source: Option<io::Error>,
}

impl JournalError {
    /// Create a new journal append failed error.
    pub fn append_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: JournalErrorCode::AppendFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a new journal fsync failed error.
    pub fn fsync_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: JournalErrorCode::FsyncFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a new journal corruption error.
    pub fn corruption(message: impl Into<String>) -> Self {
        Self {
            code: JournalErrorCode::Corruption,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create a journal corruption error with byte offset context.
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            code: JournalErrorCode::Corruption,
            message: reason.into(),
            details: Some(format!("byte_offset: {}", offset)),
            source: None,
        }
    }

    /// Create a journal corruption error with sequence number context.
    pub fn corruption_at_sequence(sequence: u64, reason: impl Into<String>) -> Self {
        Self {
            code: JournalErrorCode::Corruption,
            message: reason.into(),
            details: Some(format!("sequence: {}", sequence)),
            source: None,
        }
    }

    /// Returns the error code.
    pub fn code(&self) -> JournalErrorCode {
        self.code
    }

    /// Returns the severity level.
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details.
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether this error requires process termination.
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for JournalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for JournalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for journal operations.
pub type JournalResult<T> = Result<T, JournalError>;
