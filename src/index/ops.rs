//! Index instruction types
//!
//! The hint resolver emits these; an external indexing collaborator
//! consumes them. Wire keys are camelCase to match the annotation
//! vocabulary of the source declarations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::SearchFieldType;

/// One index-update instruction for the external search indexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexOp {
    /// Name the value is indexed under.
    pub field_name: String,
    /// Index target type.
    pub field_type: SearchFieldType,
    /// Whether the field participates in unqualified queries.
    pub query_by_default: bool,
    /// The value to index.
    pub value: Value,
}

/// One value projected for the external time-series index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesProjection {
    /// Declared field name.
    pub field_name: String,
    /// Element key for collection fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_key: Option<String>,
    /// The projected value.
    pub value: Value,
}
