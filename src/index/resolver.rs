//! Search and time-series hint resolution
//!
//! Pure projection: inspects the descriptor's annotation hints and the
//! instance payload, and produces ordered index instructions. No side
//! effects; actual indexing happens externally.
//!
//! Ordering rules:
//! - instructions follow field declaration order
//! - array values expand to one instruction per element, preserving
//!   array order
//! - absent or null fields produce no instructions

use serde_json::Value;

use crate::registry::AspectDescriptor;

use super::ops::{IndexOp, TimeseriesProjection};

/// Derives search index instructions for one aspect instance.
///
/// One instruction per searchable field value. The hint's name override
/// wins over the declared field name.
pub fn derive_index_ops(descriptor: &AspectDescriptor, payload: &Value) -> Vec<IndexOp> {
    let mut ops = Vec::new();

    for field in &descriptor.fields {
        let hint = match &field.search {
            Some(hint) => hint,
            None => continue,
        };

        let value = match payload.get(&field.name) {
            Some(value) if !value.is_null() => value,
            _ => continue,
        };

        let field_name = field.projected_name();
        match value {
            Value::Array(elements) => {
                for element in elements {
                    ops.push(IndexOp {
                        field_name: field_name.to_string(),
                        field_type: hint.field_type,
                        query_by_default: hint.query_by_default,
                        value: element.clone(),
                    });
                }
            }
            scalar => {
                ops.push(IndexOp {
                    field_name: field_name.to_string(),
                    field_type: hint.field_type,
                    query_by_default: hint.query_by_default,
                    value: scalar.clone(),
                });
            }
        }
    }

    ops
}

/// Derives time-series index projections for one aspect instance.
///
/// Single-value hints project the field once; collection hints expand
/// array values element-wise, each carrying the collection key.
pub fn derive_timeseries_projection(
    descriptor: &AspectDescriptor,
    payload: &Value,
) -> Vec<TimeseriesProjection> {
    let mut projections = Vec::new();

    for field in &descriptor.fields {
        let hint = match &field.timeseries {
            Some(hint) => hint,
            None => continue,
        };

        let value = match payload.get(&field.name) {
            Some(value) if !value.is_null() => value,
            _ => continue,
        };

        if hint.is_collection {
            match value {
                Value::Array(elements) => {
                    for element in elements {
                        projections.push(TimeseriesProjection {
                            field_name: field.name.clone(),
                            collection_key: hint.collection_key.clone(),
                            value: element.clone(),
                        });
                    }
                }
                scalar => projections.push(TimeseriesProjection {
                    field_name: field.name.clone(),
                    collection_key: hint.collection_key.clone(),
                    value: scalar.clone(),
                }),
            }
        } else {
            projections.push(TimeseriesProjection {
                field_name: field.name.clone(),
                collection_key: None,
                value: value.clone(),
            });
        }
    }

    projections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::builtin;
    use crate::registry::{
        AspectDescriptor, FieldDescriptor, SearchFieldType, SearchHint, ValueType,
    };
    use serde_json::json;

    #[test]
    fn test_alias_array_expands_per_element() {
        let descriptor = builtin::schema_field_aliases();
        let payload = json!({"aliases": ["urn:li:x", "urn:li:y"]});

        let ops = derive_index_ops(&descriptor, &payload);
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].field_name, "schemaFieldAliases");
        assert_eq!(ops[0].field_type, SearchFieldType::Urn);
        assert!(!ops[0].query_by_default);
        assert_eq!(ops[0].value, json!("urn:li:x"));
        assert_eq!(ops[1].value, json!("urn:li:y"));
    }

    #[test]
    fn test_absent_and_null_fields_skipped() {
        let descriptor = builtin::schema_field_aliases();

        assert!(derive_index_ops(&descriptor, &json!({})).is_empty());
        assert!(derive_index_ops(&descriptor, &json!({"aliases": null})).is_empty());
    }

    #[test]
    fn test_declaration_order_preserved() {
        let descriptor = AspectDescriptor::versioned(
            "datasetProperties",
            vec![
                FieldDescriptor::required("name", ValueType::String)
                    .with_search(SearchHint::new(SearchFieldType::TextPartial).query_by_default()),
                FieldDescriptor::optional("description", ValueType::String)
                    .with_search(SearchHint::new(SearchFieldType::Text)),
                FieldDescriptor::optional("internal", ValueType::Boolean),
            ],
        );
        let payload = json!({
            "description": "daily sales rollup",
            "name": "sales",
            "internal": true
        });

        let ops = derive_index_ops(&descriptor, &payload);
        let names: Vec<&str> = ops.iter().map(|op| op.field_name.as_str()).collect();
        // Unhinted fields are skipped; hinted ones keep declaration order.
        assert_eq!(names, vec!["name", "description"]);
        assert!(ops[0].query_by_default);
        assert!(!ops[1].query_by_default);
    }

    #[test]
    fn test_scalar_value_projects_once() {
        let descriptor = AspectDescriptor::versioned(
            "status",
            vec![FieldDescriptor::required("removed", ValueType::Boolean)
                .with_search(SearchHint::new(SearchFieldType::Boolean))],
        );

        let ops = derive_index_ops(&descriptor, &json!({"removed": false}));
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].value, json!(false));
    }

    #[test]
    fn test_timeseries_projection_fields_and_collections() {
        let descriptor = builtin::dataset_usage_statistics();
        let payload = json!({
            "timestampMillis": 1714521600000u64,
            "uniqueUserCount": 2,
            "userCounts": [
                {"user": "urn:li:corpuser:jdoe", "count": 5},
                {"user": "urn:li:corpuser:asmith", "count": 3}
            ]
        });

        let projections = derive_timeseries_projection(&descriptor, &payload);
        assert_eq!(projections.len(), 3);

        assert_eq!(projections[0].field_name, "uniqueUserCount");
        assert_eq!(projections[0].collection_key, None);
        assert_eq!(projections[0].value, json!(2));

        assert_eq!(projections[1].field_name, "userCounts");
        assert_eq!(projections[1].collection_key.as_deref(), Some("user"));
        assert_eq!(projections[1].value["user"], json!("urn:li:corpuser:jdoe"));
        assert_eq!(projections[2].value["user"], json!("urn:li:corpuser:asmith"));
    }

    #[test]
    fn test_unhinted_payload_projects_nothing() {
        let descriptor = builtin::dataset_usage_statistics();
        // timestampMillis carries no hint; nothing else present.
        let payload = json!({"timestampMillis": 1714521600000u64});
        assert!(derive_timeseries_projection(&descriptor, &payload).is_empty());
    }
}
