//! API error types
//!
//! The handler layer invents no codes of its own beyond the two
//! envelope failures below. Everything else carries the originating
//! subsystem's code and message upward unchanged, so a caller sees the
//! same code whether a rule fired in the registry, the processor, or
//! the store underneath it.

use std::fmt;

use crate::processor::ProcessorError;
use crate::registry::RegistryError;
use crate::store::StoreError;
use crate::urn::UrnError;

const INVALID_REQUEST: &str = "ADB_INVALID_REQUEST";
const UNKNOWN_OPERATION: &str = "ADB_UNKNOWN_OPERATION";

/// How the caller should treat a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The request is rejected; the process continues
    Reject,
    /// System must halt
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Reject => "REJECT",
            Severity::Fatal => "FATAL",
        })
    }
}

/// An error surfaced through the response envelope.
///
/// Holds the code as a string rather than a typed enum: pass-through
/// codes originate in four different subsystems and the envelope only
/// ever renders them.
#[derive(Debug)]
pub struct ApiError {
    code: String,
    message: String,
    severity: Severity,
}

impl ApiError {
    fn reject(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: Severity::Reject,
        }
    }

    fn graded(code: impl Into<String>, message: impl Into<String>, fatal: bool) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: if fatal {
                Severity::Fatal
            } else {
                Severity::Reject
            },
        }
    }

    /// Request body malformed or missing an envelope field.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::reject(INVALID_REQUEST, reason)
    }

    /// Request named an operation the API does not serve.
    pub fn unknown_operation(op: impl Into<String>) -> Self {
        Self::reject(
            UNKNOWN_OPERATION,
            format!("Unknown operation: {}", op.into()),
        )
    }

    /// Read of a key holding no record.
    pub fn not_found(entity: &str, aspect: &str) -> Self {
        Self::reject(
            "ADB_NOT_FOUND",
            format!("Aspect '{}' not found for entity '{}'", aspect, entity),
        )
    }

    /// URN parse failure, code preserved.
    pub fn from_urn_error(err: UrnError) -> Self {
        Self::reject(err.code(), err.to_string())
    }

    /// Registry rejection or descriptor fault, code and severity preserved.
    pub fn from_registry_error(err: RegistryError) -> Self {
        Self::graded(err.code().code(), err.message(), err.is_fatal())
    }

    /// Processor rejection, code and severity preserved.
    pub fn from_processor_error(err: ProcessorError) -> Self {
        Self::graded(err.code(), err.message(), err.is_fatal())
    }

    /// Store fault. Always fatal: the store only fails on lock poisoning.
    pub fn from_store_error(err: StoreError) -> Self {
        Self::graded(err.code(), err.to_string(), err.is_fatal())
    }

    /// Returns the error code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the severity
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
