//! Registry error types
//!
//! Error codes:
//! - ADB_UNKNOWN_ASPECT (REJECT)
//! - ADB_DUPLICATE_ASPECT (REJECT)
//! - ADB_UNKNOWN_FIELD (REJECT)
//! - ADB_MISSING_REQUIRED_FIELD (REJECT)
//! - ADB_MALFORMED_DESCRIPTOR (FATAL, boot only)
//! - ADB_INVALID_PAYLOAD (REJECT)

use std::fmt;

/// Severity of a registry error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The change event is rejected; the process continues.
    Reject,
    /// Boot must halt (malformed descriptor files).
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

/// Registry-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryErrorCode {
    /// Aspect name not present in the registry.
    UnknownAspect,
    /// Aspect name registered twice.
    DuplicateAspect,
    /// Payload carries a field the descriptor does not declare.
    UnknownField,
    /// A non-optional field is absent from the payload.
    MissingRequiredField,
    /// Descriptor file could not be loaded (FATAL at boot).
    MalformedDescriptor,
    /// Payload is not a JSON object.
    InvalidPayload,
}

impl RegistryErrorCode {
    /// Returns the stable string code.
    pub fn code(&self) -> &'static str {
        match self {
            RegistryErrorCode::UnknownAspect => "ADB_UNKNOWN_ASPECT",
            RegistryErrorCode::DuplicateAspect => "ADB_DUPLICATE_ASPECT",
            RegistryErrorCode::UnknownField => "ADB_UNKNOWN_FIELD",
            RegistryErrorCode::MissingRequiredField => "ADB_MISSING_REQUIRED_FIELD",
            RegistryErrorCode::MalformedDescriptor => "ADB_MALFORMED_DESCRIPTOR",
            RegistryErrorCode::InvalidPayload => "ADB_INVALID_PAYLOAD",
        }
    }

    /// Returns the severity for this code.
    pub fn severity(&self) -> Severity {
        match self {
            RegistryErrorCode::MalformedDescriptor => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for RegistryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Registry error with full context.
#[derive(Debug, Clone)]
pub struct RegistryError {
    code: RegistryErrorCode,
    message: String,
    /// Aspect name if applicable.
    aspect: Option<String>,
    /// Offending field name if applicable.
    field: Option<String>,
}

impl RegistryError {
    /// Aspect name not found.
    pub fn unknown_aspect(aspect: impl Into<String>) -> Self {
        let aspect = aspect.into();
        Self {
            code: RegistryErrorCode::UnknownAspect,
            message: format!("Aspect '{}' is not registered", aspect),
            aspect: Some(aspect),
            field: None,
        }
    }

    /// Aspect name registered twice.
    pub fn duplicate_aspect(aspect: impl Into<String>) -> Self {
        let aspect = aspect.into();
        Self {
            code: RegistryErrorCode::DuplicateAspect,
            message: format!("Aspect '{}' is already registered", aspect),
            aspect: Some(aspect),
            field: None,
        }
    }

    /// Payload carries an undeclared field.
    pub fn unknown_field(aspect: impl Into<String>, field: impl Into<String>) -> Self {
        let aspect = aspect.into();
        let field = field.into();
        Self {
            code: RegistryErrorCode::UnknownField,
            message: format!("Aspect '{}' does not declare field '{}'", aspect, field),
            aspect: Some(aspect),
            field: Some(field),
        }
    }

    /// A required field is missing from the payload.
    pub fn missing_required_field(aspect: impl Into<String>, field: impl Into<String>) -> Self {
        let aspect = aspect.into();
        let field = field.into();
        Self {
            code: RegistryErrorCode::MissingRequiredField,
            message: format!(
                "Aspect '{}' requires field '{}' which is absent",
                aspect, field
            ),
            aspect: Some(aspect),
            field: Some(field),
        }
    }

    /// Descriptor file could not be parsed or violates structure rules.
    pub fn malformed_descriptor(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: RegistryErrorCode::MalformedDescriptor,
            message: format!("Malformed descriptor '{}': {}", path.into(), reason.into()),
            aspect: None,
            field: None,
        }
    }

    /// Payload is not a JSON object.
    pub fn invalid_payload(aspect: impl Into<String>, reason: impl Into<String>) -> Self {
        let aspect = aspect.into();
        Self {
            code: RegistryErrorCode::InvalidPayload,
            message: format!("Invalid payload for aspect '{}': {}", aspect, reason.into()),
            aspect: Some(aspect),
            field: None,
        }
    }

    /// Returns the error code.
    pub fn code(&self) -> RegistryErrorCode {
        self.code
    }

    /// Returns the severity.
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the aspect name if applicable.
    pub fn aspect(&self) -> Option<&str> {
        self.aspect.as_deref()
    }

    /// Returns the offending field name if applicable.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns whether this error must halt boot.
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for RegistryError {}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
