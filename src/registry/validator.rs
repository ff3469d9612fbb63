//! Payload validation against aspect descriptors
//!
//! Validation semantics:
//! - payload must be a JSON object
//! - every payload key must be declared by the descriptor
//! - every non-optional declared field must be present
//!
//! Declared value types inform index projection and documentation; payload
//! values are not type-checked here. Validation happens before any state
//! change, never mutates payloads, and is deterministic: unknown fields are
//! reported in payload key order, missing fields in declaration order.

use serde_json::Value;

use super::errors::{RegistryError, RegistryResult};
use super::registry::AspectRegistry;
use super::types::AspectDescriptor;

/// Validates change payloads against registered descriptors.
pub struct AspectValidator<'a> {
    registry: &'a AspectRegistry,
}

impl<'a> AspectValidator<'a> {
    /// Creates a validator backed by the given registry.
    pub fn new(registry: &'a AspectRegistry) -> Self {
        Self { registry }
    }

    /// Validates a payload against the named aspect.
    ///
    /// # Errors
    ///
    /// - `ADB_UNKNOWN_ASPECT` if the aspect is not registered
    /// - `ADB_INVALID_PAYLOAD` if the payload is not an object
    /// - `ADB_UNKNOWN_FIELD` if the payload carries an undeclared key
    /// - `ADB_MISSING_REQUIRED_FIELD` if a non-optional field is absent
    pub fn validate(&self, aspect_name: &str, payload: &Value) -> RegistryResult<()> {
        let descriptor = self.registry.describe(aspect_name)?;
        Self::validate_against(descriptor, payload)
    }

    /// Validates a payload against an already-resolved descriptor.
    pub fn validate_against(descriptor: &AspectDescriptor, payload: &Value) -> RegistryResult<()> {
        let object = payload.as_object().ok_or_else(|| {
            RegistryError::invalid_payload(
                &descriptor.name,
                format!("expected object, found {}", json_type_name(payload)),
            )
        })?;

        for key in object.keys() {
            if descriptor.field(key).is_none() {
                return Err(RegistryError::unknown_field(&descriptor.name, key));
            }
        }

        for field in &descriptor.fields {
            if !field.optional && !object.contains_key(&field.name) {
                return Err(RegistryError::missing_required_field(
                    &descriptor.name,
                    &field.name,
                ));
            }
        }

        Ok(())
    }
}

/// Returns the JSON type name for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::builtin;
    use serde_json::json;

    fn registry_with_builtins() -> AspectRegistry {
        let mut registry = AspectRegistry::new();
        for descriptor in builtin::all() {
            registry.register(descriptor).unwrap();
        }
        registry
    }

    #[test]
    fn test_valid_payload_accepted() {
        let registry = registry_with_builtins();
        let validator = AspectValidator::new(&registry);

        let payload = json!({
            "timestampMillis": 1714521600000u64,
            "uniqueUserCount": 12,
            "totalSqlQueries": 40
        });
        assert!(validator
            .validate("datasetUsageStatistics", &payload)
            .is_ok());
    }

    #[test]
    fn test_unknown_aspect_rejected() {
        let registry = registry_with_builtins();
        let validator = AspectValidator::new(&registry);

        let result = validator.validate("nonexistent", &json!({}));
        assert_eq!(result.unwrap_err().code().code(), "ADB_UNKNOWN_ASPECT");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let registry = registry_with_builtins();
        let validator = AspectValidator::new(&registry);

        let payload = json!({
            "timestampMillis": 1714521600000u64,
            "bogusField": true
        });
        let result = validator.validate("datasetUsageStatistics", &payload);
        let err = result.unwrap_err();
        assert_eq!(err.code().code(), "ADB_UNKNOWN_FIELD");
        assert_eq!(err.field(), Some("bogusField"));
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let registry = registry_with_builtins();
        let validator = AspectValidator::new(&registry);

        let payload = json!({"uniqueUserCount": 5});
        let result = validator.validate("datasetUsageStatistics", &payload);
        let err = result.unwrap_err();
        assert_eq!(err.code().code(), "ADB_MISSING_REQUIRED_FIELD");
        assert_eq!(err.field(), Some("timestampMillis"));
    }

    #[test]
    fn test_optional_fields_may_be_absent() {
        let registry = registry_with_builtins();
        let validator = AspectValidator::new(&registry);

        // aliases is optional, so the empty payload passes
        assert!(validator.validate("schemaFieldAliases", &json!({})).is_ok());
    }

    #[test]
    fn test_non_object_payload_rejected() {
        let registry = registry_with_builtins();
        let validator = AspectValidator::new(&registry);

        let result = validator.validate("schemaFieldAliases", &json!(["urn:li:x"]));
        let err = result.unwrap_err();
        assert_eq!(err.code().code(), "ADB_INVALID_PAYLOAD");
        assert!(err.message().contains("array"));
    }

    #[test]
    fn test_explicit_null_counts_as_present() {
        let registry = registry_with_builtins();
        let validator = AspectValidator::new(&registry);

        let payload = json!({
            "timestampMillis": 1714521600000u64,
            "uniqueUserCount": null
        });
        assert!(validator
            .validate("datasetUsageStatistics", &payload)
            .is_ok());
    }

    #[test]
    fn test_values_are_not_type_checked() {
        let registry = registry_with_builtins();
        let validator = AspectValidator::new(&registry);

        // Declared long, sent as string: accepted at this layer.
        let payload = json!({"timestampMillis": "not-a-number"});
        assert!(validator
            .validate("datasetUsageStatistics", &payload)
            .is_ok());
    }
}
