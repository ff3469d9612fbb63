//! CLI error types
//!
//! Any CLI error terminates the command: main prints the rendered code
//! and message to stderr and exits non-zero. A rejected one-shot apply
//! surfaces here too, so scripts can branch on the exit status.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Stable code for each CLI failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration could not be loaded or validated.
    ConfigError,
    /// stdin/stdout failed mid-command.
    IoError,
    /// `init` ran against a directory that already has descriptors.
    AlreadyInitialized,
    /// A serving command ran against an uninitialized directory.
    NotInitialized,
    /// Descriptor load, replay, or journal attach failed during boot.
    BootFailed,
    /// A one-shot `apply` printed an error envelope.
    ChangeRejected,
}

impl CliErrorCode {
    /// Returns the stable string code.
    pub fn code(&self) -> &'static str {
        match self {
            CliErrorCode::ConfigError => "ADB_CLI_CONFIG_ERROR",
            CliErrorCode::IoError => "ADB_CLI_IO_ERROR",
            CliErrorCode::AlreadyInitialized => "ADB_CLI_ALREADY_INITIALIZED",
            CliErrorCode::NotInitialized => "ADB_CLI_NOT_INITIALIZED",
            CliErrorCode::BootFailed => "ADB_CLI_BOOT_FAILED",
            CliErrorCode::ChangeRejected => "ADB_CLI_CHANGE_REJECTED",
        }
    }
}

/// A failed CLI command.
#[derive(Debug, Error)]
#[error("{}: {}", .code.code(), .message)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Configuration failure before boot.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, message)
    }

    /// stdin/stdout failure.
    pub fn io_error(message: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, message)
    }

    /// `init` against an initialized directory.
    pub fn already_initialized() -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            "Data directory already initialized",
        )
    }

    /// Serving command against an uninitialized directory.
    pub fn not_initialized() -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            "Data directory not initialized. Run 'aspectdb init' first.",
        )
    }

    /// Boot halted before serving.
    pub fn boot_failed(message: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, message)
    }

    /// One-shot apply rejected; carries the rejection code.
    pub fn change_rejected(code: &str) -> Self {
        Self::new(
            CliErrorCode::ChangeRejected,
            format!("Change rejected: {}", code),
        )
    }

    /// Returns the failure class.
    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    /// Returns the stable string code.
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Returns the message without the code prefix.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON line could not be processed: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(CliErrorCode::ConfigError.code(), "ADB_CLI_CONFIG_ERROR");
        assert_eq!(
            CliErrorCode::AlreadyInitialized.code(),
            "ADB_CLI_ALREADY_INITIALIZED"
        );
        assert_eq!(
            CliErrorCode::ChangeRejected.code(),
            "ADB_CLI_CHANGE_REJECTED"
        );
    }

    #[test]
    fn test_display_prefixes_the_code() {
        let err = CliError::boot_failed("Journal replay failed");
        assert_eq!(
            err.to_string(),
            "ADB_CLI_BOOT_FAILED: Journal replay failed"
        );
        assert_eq!(err.message(), "Journal replay failed");
    }

    #[test]
    fn test_change_rejected_carries_code() {
        let err = CliError::change_rejected("ADB_UNKNOWN_FIELD");
        assert_eq!(err.code(), CliErrorCode::ChangeRejected);
        assert!(err.message().contains("ADB_UNKNOWN_FIELD"));
    }

    #[test]
    fn test_config_error_converts() {
        let err: CliError = ConfigError::Invalid("data_dir must not be empty".into()).into();
        assert_eq!(err.code(), CliErrorCode::ConfigError);
        assert!(err.message().contains("data_dir"));
    }
}
