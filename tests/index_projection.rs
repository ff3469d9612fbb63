//! Index Hint Projection Tests
//!
//! The hint resolver is a pure function from (descriptor, payload) to
//! index instructions. These tests drive it both directly and through
//! the processor, which must attach fresh instructions to every accepted
//! change:
//! - Hinted fields project under their override name
//! - Arrays expand element-wise in order
//! - Absent or null fields project nothing
//! - The same payload always projects the same instructions

use std::sync::Arc;

use aspectdb::event::ChangeEvent;
use aspectdb::index::{derive_index_ops, derive_timeseries_projection};
use aspectdb::processor::ChangeProcessor;
use aspectdb::registry::{builtin, AspectRegistry, SearchFieldType};
use aspectdb::urn::Urn;
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn entity() -> Urn {
    "urn:li:dataset:(urn:li:dataPlatform:hive,logs,PROD)"
        .parse()
        .unwrap()
}

fn setup_processor() -> ChangeProcessor {
    let mut registry = AspectRegistry::new();
    for descriptor in builtin::all() {
        registry.register(descriptor).unwrap();
    }
    ChangeProcessor::new(Arc::new(registry), 4)
}

// =============================================================================
// Search Hint Tests
// =============================================================================

/// Alias values index under the hint's override name, not the field name.
#[test]
fn test_override_name_wins() {
    let descriptor = builtin::schema_field_aliases();
    let payload = json!({"aliases": ["urn:li:schemaField:(urn:li:dataset:x,id)"]});

    let ops = derive_index_ops(&descriptor, &payload);
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].field_name, "schemaFieldAliases");
    assert_eq!(ops[0].field_type, SearchFieldType::Urn);
    assert!(!ops[0].query_by_default);
}

/// Array values expand to one instruction per element, order preserved.
#[test]
fn test_array_expands_in_order() {
    let descriptor = builtin::schema_field_aliases();
    let payload = json!({"aliases": ["urn:li:a", "urn:li:b", "urn:li:c"]});

    let ops = derive_index_ops(&descriptor, &payload);
    let values: Vec<&str> = ops.iter().map(|op| op.value.as_str().unwrap()).collect();
    assert_eq!(values, vec!["urn:li:a", "urn:li:b", "urn:li:c"]);
}

/// Absent and null hinted fields both project nothing.
#[test]
fn test_absent_and_null_project_nothing() {
    let descriptor = builtin::schema_field_aliases();

    assert!(derive_index_ops(&descriptor, &json!({})).is_empty());
    assert!(derive_index_ops(&descriptor, &json!({"aliases": null})).is_empty());
}

/// An empty array projects zero instructions, not an empty-valued one.
#[test]
fn test_empty_array_projects_nothing() {
    let descriptor = builtin::schema_field_aliases();
    assert!(derive_index_ops(&descriptor, &json!({"aliases": []})).is_empty());
}

/// Projection is deterministic across repeated calls.
#[test]
fn test_projection_is_deterministic() {
    let descriptor = builtin::schema_field_aliases();
    let payload = json!({"aliases": ["urn:li:a", "urn:li:b"]});

    let first = derive_index_ops(&descriptor, &payload);
    for _ in 0..100 {
        assert_eq!(derive_index_ops(&descriptor, &payload), first);
    }
}

// =============================================================================
// Time-Series Projection Tests
// =============================================================================

/// Single-value statistic fields project once, without a collection key.
#[test]
fn test_statistic_fields_project_once() {
    let descriptor = builtin::dataset_usage_statistics();
    let payload = json!({
        "timestampMillis": 1000,
        "uniqueUserCount": 12,
        "totalSqlQueries": 40
    });

    let projections = derive_timeseries_projection(&descriptor, &payload);
    assert_eq!(projections.len(), 2);
    assert_eq!(projections[0].field_name, "uniqueUserCount");
    assert_eq!(projections[0].collection_key, None);
    assert_eq!(projections[1].field_name, "totalSqlQueries");
}

/// Collection fields expand element-wise, each carrying the element key.
#[test]
fn test_collection_fields_expand_with_key() {
    let descriptor = builtin::dataset_usage_statistics();
    let payload = json!({
        "timestampMillis": 1000,
        "userCounts": [
            {"user": "urn:li:corpuser:jdoe", "count": 5},
            {"user": "urn:li:corpuser:asmith", "count": 3}
        ]
    });

    let projections = derive_timeseries_projection(&descriptor, &payload);
    assert_eq!(projections.len(), 2);
    for projection in &projections {
        assert_eq!(projection.field_name, "userCounts");
        assert_eq!(projection.collection_key.as_deref(), Some("user"));
    }
    assert_eq!(projections[0].value["count"], 5);
    assert_eq!(projections[1].value["count"], 3);
}

/// Unhinted fields never project, even when present.
#[test]
fn test_unhinted_fields_skipped() {
    let descriptor = builtin::dataset_usage_statistics();
    let payload = json!({
        "timestampMillis": 1000,
        "eventGranularity": {"unit": "DAY", "multiple": 1}
    });

    assert!(derive_timeseries_projection(&descriptor, &payload).is_empty());
}

// =============================================================================
// Processor Attachment Tests
// =============================================================================

/// Accepted versioned changes carry instructions for the written payload.
#[test]
fn test_versioned_apply_attaches_ops() {
    let processor = setup_processor();
    let event = ChangeEvent::upsert(
        entity(),
        "schemaFieldAliases",
        json!({"aliases": ["urn:li:a", "urn:li:b"]}),
    );

    let applied = processor.apply(&event).unwrap();
    assert_eq!(applied.index_ops.len(), 2);
    assert!(applied.projections.is_empty());
}

/// A patch derives instructions from the merged payload, not the diff.
#[test]
fn test_patch_projects_merged_payload() {
    let processor = setup_processor();
    processor
        .apply(&ChangeEvent::upsert(
            entity(),
            "schemaFieldAliases",
            json!({"aliases": ["urn:li:old"]}),
        ))
        .unwrap();

    let applied = processor
        .apply(&ChangeEvent::patch(
            entity(),
            "schemaFieldAliases",
            json!({"aliases": ["urn:li:new"]}),
        ))
        .unwrap();
    assert_eq!(applied.index_ops.len(), 1);
    assert_eq!(applied.index_ops[0].value, json!("urn:li:new"));
}

/// Deletes carry no index instructions.
#[test]
fn test_delete_attaches_no_ops() {
    let processor = setup_processor();
    processor
        .apply(&ChangeEvent::upsert(
            entity(),
            "schemaFieldAliases",
            json!({"aliases": ["urn:li:a"]}),
        ))
        .unwrap();

    let applied = processor
        .apply(&ChangeEvent::delete(entity(), "schemaFieldAliases"))
        .unwrap();
    assert!(applied.index_ops.is_empty());
    assert!(applied.projections.is_empty());
}

/// Time-series changes carry both search ops and bucket projections.
#[test]
fn test_timeseries_apply_attaches_projections() {
    let processor = setup_processor();
    let event = ChangeEvent::upsert(
        entity(),
        "datasetUsageStatistics",
        json!({
            "timestampMillis": 1000,
            "uniqueUserCount": 3,
            "fieldCounts": [{"fieldPath": "user_id", "count": 9}]
        }),
    );

    let applied = processor.apply(&event).unwrap();
    let names: Vec<&str> = applied
        .projections
        .iter()
        .map(|p| p.field_name.as_str())
        .collect();
    assert_eq!(names, vec!["uniqueUserCount", "fieldCounts"]);
    assert_eq!(
        applied.projections[1].collection_key.as_deref(),
        Some("fieldPath")
    );
}

/// The wire form of an instruction uses camelCase keys.
#[test]
fn test_instruction_wire_shape() {
    let descriptor = builtin::schema_field_aliases();
    let ops = derive_index_ops(&descriptor, &json!({"aliases": ["urn:li:a"]}));

    let rendered = serde_json::to_value(&ops[0]).unwrap();
    assert_eq!(
        rendered,
        json!({
            "fieldName": "schemaFieldAliases",
            "fieldType": "URN",
            "queryByDefault": false,
            "value": "urn:li:a"
        })
    );
}
