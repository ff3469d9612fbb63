//! Built-in aspect descriptors
//!
//! Two descriptors ship with the binary and are written out by `init`:
//! - `schemaFieldAliases` (versioned): alternative URN identities for a
//!   schema field, projected into the search index under the aspect name.
//! - `datasetUsageStatistics` (timeseries): per-bucket usage rollups with
//!   single-value statistic fields and keyed collection fields.

use crate::registry::types::{
    AspectDescriptor, FieldDescriptor, SearchFieldType, SearchHint, TimeseriesHint, ValueType,
};

/// Versioned aspect holding alternative URN identities of a schema field.
pub fn schema_field_aliases() -> AspectDescriptor {
    AspectDescriptor::versioned(
        "schemaFieldAliases",
        vec![
            FieldDescriptor::optional("aliases", ValueType::array(ValueType::Urn))
                .with_search(SearchHint::named("schemaFieldAliases", SearchFieldType::Urn)),
        ],
    )
}

/// Time-series aspect holding per-bucket dataset usage rollups.
pub fn dataset_usage_statistics() -> AspectDescriptor {
    AspectDescriptor::timeseries(
        "datasetUsageStatistics",
        vec![
            FieldDescriptor::required("timestampMillis", ValueType::Long),
            FieldDescriptor::optional("eventGranularity", ValueType::Record),
            FieldDescriptor::optional("uniqueUserCount", ValueType::Int)
                .with_timeseries(TimeseriesHint::field()),
            FieldDescriptor::optional("totalSqlQueries", ValueType::Int)
                .with_timeseries(TimeseriesHint::field()),
            FieldDescriptor::optional("topSqlQueries", ValueType::array(ValueType::String))
                .with_timeseries(TimeseriesHint::field()),
            FieldDescriptor::optional("userCounts", ValueType::array(ValueType::Record))
                .with_timeseries(TimeseriesHint::collection("user")),
            FieldDescriptor::optional("fieldCounts", ValueType::array(ValueType::Record))
                .with_timeseries(TimeseriesHint::collection("fieldPath")),
        ],
    )
}

/// All built-in descriptors in registration order.
pub fn all() -> Vec<AspectDescriptor> {
    vec![schema_field_aliases(), dataset_usage_statistics()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::types::AspectKind;

    #[test]
    fn test_builtins_are_structurally_valid() {
        for descriptor in all() {
            assert!(
                descriptor.validate_structure().is_ok(),
                "built-in '{}' failed structure validation",
                descriptor.name
            );
        }
    }

    #[test]
    fn test_schema_field_aliases_shape() {
        let descriptor = schema_field_aliases();
        assert_eq!(descriptor.kind, AspectKind::Versioned);
        let aliases = descriptor.field("aliases").unwrap();
        assert!(aliases.optional);
        assert_eq!(aliases.projected_name(), "schemaFieldAliases");
        let hint = aliases.search.as_ref().unwrap();
        assert_eq!(hint.field_type, SearchFieldType::Urn);
        assert!(!hint.query_by_default);
    }

    #[test]
    fn test_usage_statistics_shape() {
        let descriptor = dataset_usage_statistics();
        assert_eq!(descriptor.kind, AspectKind::Timeseries);
        assert!(!descriptor.field("timestampMillis").unwrap().optional);

        let user_counts = descriptor.field("userCounts").unwrap();
        let hint = user_counts.timeseries.as_ref().unwrap();
        assert!(hint.is_collection);
        assert_eq!(hint.collection_key.as_deref(), Some("user"));

        let unique_users = descriptor.field("uniqueUserCount").unwrap();
        assert!(unique_users.timeseries.as_ref().unwrap().is_field);
    }

    #[test]
    fn test_builtin_names_are_distinct() {
        let names: Vec<String> = all().into_iter().map(|d| d.name).collect();
        assert_eq!(names.len(), 2);
        assert_ne!(names[0], names[1]);
    }
}
