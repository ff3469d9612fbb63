//! URN vocabulary for entity identifiers
//!
//! Every entity in aspectdb is addressed by a structured URN of the form
//! `urn:li:<entityType>:<id>`, e.g.:
//! - `urn:li:container:008e111aa1d250dd52e0fd5d4b307b1a`
//! - `urn:li:dataset:(urn:li:dataPlatform:bigquery,covid19.staffing,PROD)`
//!
//! URNs are parsed and validated once at the boundary; the rest of the
//! system carries a typed `Urn` and never re-checks the format.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Required prefix for all entity URNs.
const URN_PREFIX: &str = "urn:li:";

/// Error produced when a string fails URN validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid URN '{input}': {reason}")]
pub struct UrnError {
    /// The rejected input string.
    pub input: String,
    /// Why it was rejected.
    pub reason: String,
}

impl UrnError {
    fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code for API responses.
    pub fn code(&self) -> &'static str {
        "ADB_INVALID_URN"
    }
}

/// A validated entity URN.
///
/// Construction goes through [`Urn::parse`]; an existing `Urn` is always
/// well-formed. Serializes as the plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Urn {
    raw: String,
    /// Byte offset of the entity type within `raw` (end exclusive).
    type_end: usize,
}

impl Urn {
    /// Parses and validates a URN string.
    ///
    /// Rules:
    /// - must start with `urn:li:`
    /// - entity type segment must be non-empty and contain only
    ///   ASCII alphanumerics
    /// - the id segment after the entity type must be non-empty
    pub fn parse(input: &str) -> Result<Self, UrnError> {
        let rest = input
            .strip_prefix(URN_PREFIX)
            .ok_or_else(|| UrnError::new(input, format!("must start with '{}'", URN_PREFIX)))?;

        let sep = rest
            .find(':')
            .ok_or_else(|| UrnError::new(input, "missing entity type separator"))?;

        let entity_type = &rest[..sep];
        if entity_type.is_empty() {
            return Err(UrnError::new(input, "empty entity type"));
        }
        if !entity_type.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(UrnError::new(
                input,
                format!("entity type '{}' must be alphanumeric", entity_type),
            ));
        }

        let id = &rest[sep + 1..];
        if id.is_empty() {
            return Err(UrnError::new(input, "empty id segment"));
        }

        Ok(Self {
            raw: input.to_string(),
            type_end: URN_PREFIX.len() + sep,
        })
    }

    /// Returns the entity type segment, e.g. `dataset` or `container`.
    pub fn entity_type(&self) -> &str {
        &self.raw[URN_PREFIX.len()..self.type_end]
    }

    /// Returns the id segment after the entity type.
    pub fn id(&self) -> &str {
        &self.raw[self.type_end + 1..]
    }

    /// Returns the full URN string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for Urn {
    type Error = UrnError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Urn::parse(&value)
    }
}

impl From<Urn> for String {
    fn from(urn: Urn) -> String {
        urn.raw
    }
}

impl std::str::FromStr for Urn {
    type Err = UrnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Urn::parse(s)
    }
}
