//! Change event model
//!
//! Every mutation enters the system as a `ChangeEvent`: entity URN, aspect
//! name, a `ChangeType` tag, and an optional payload or patch diff. The
//! type tags form a closed set dispatched in the processor's transition
//! table; there is no open-ended string dispatch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::urn::Urn;

/// Run identifier recorded when the producer supplies none.
pub const DEFAULT_RUN_ID: &str = "no-run-id-provided";

/// Closed set of mutation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    /// Create if absent, replace and bump version if present.
    Upsert,
    /// Create only; fails if the aspect is already present.
    Create,
    /// Reserved tag; never executable.
    Update,
    /// Remove the aspect; idempotent.
    Delete,
    /// Shallow merge of a diff into the existing payload.
    Patch,
    /// Re-emit the current state for downstream consumers without a new
    /// logical version.
    Restate,
    /// Create the first aspect of a new entity; fails if present.
    CreateEntity,
}

impl ChangeType {
    /// Returns the wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Upsert => "UPSERT",
            ChangeType::Create => "CREATE",
            ChangeType::Update => "UPDATE",
            ChangeType::Delete => "DELETE",
            ChangeType::Patch => "PATCH",
            ChangeType::Restate => "RESTATE",
            ChangeType::CreateEntity => "CREATE_ENTITY",
        }
    }

    /// Whether this tag is reserved and never executable.
    pub fn is_reserved(&self) -> bool {
        matches!(self, ChangeType::Update)
    }

    /// Whether a time-series aspect accepts this tag as an append.
    pub fn appends_to_timeseries(&self) -> bool {
        matches!(
            self,
            ChangeType::Upsert | ChangeType::Restate | ChangeType::Create
        )
    }

    /// Whether this tag carries a full payload on the wire.
    pub fn carries_payload(&self) -> bool {
        !matches!(self, ChangeType::Delete | ChangeType::Patch)
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Provenance attached to every stored instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMetadata {
    /// Wall-clock time the change was observed, in epoch milliseconds.
    pub last_observed_millis: i64,
    /// Producer run identifier.
    #[serde(default = "default_run_id")]
    pub run_id: String,
}

fn default_run_id() -> String {
    DEFAULT_RUN_ID.to_string()
}

impl SystemMetadata {
    /// Metadata observed at the given time with the default run id.
    pub fn observed_at(last_observed_millis: i64) -> Self {
        Self {
            last_observed_millis,
            run_id: default_run_id(),
        }
    }

    /// Attach a producer run id.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }
}

/// A single typed mutation against one (entity, aspect) key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Target entity.
    pub entity: Urn,
    /// Target aspect name.
    pub aspect: String,
    /// Mutation kind.
    pub change_type: ChangeType,
    /// Full payload; absent for DELETE and PATCH.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Patch diff; present only for PATCH.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Value>,
    /// Explicit bucket timestamp for time-series appends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_millis: Option<i64>,
    /// Producer run identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// Fully resolved provenance; supplied on replay, otherwise derived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_metadata: Option<SystemMetadata>,
}

impl ChangeEvent {
    /// Creates an event with the given type and payload.
    pub fn new(
        entity: Urn,
        aspect: impl Into<String>,
        change_type: ChangeType,
        payload: Option<Value>,
    ) -> Self {
        Self {
            entity,
            aspect: aspect.into(),
            change_type,
            payload,
            patch: None,
            timestamp_millis: None,
            run_id: None,
            system_metadata: None,
        }
    }

    /// UPSERT event.
    pub fn upsert(entity: Urn, aspect: impl Into<String>, payload: Value) -> Self {
        Self::new(entity, aspect, ChangeType::Upsert, Some(payload))
    }

    /// CREATE event.
    pub fn create(entity: Urn, aspect: impl Into<String>, payload: Value) -> Self {
        Self::new(entity, aspect, ChangeType::Create, Some(payload))
    }

    /// CREATE_ENTITY event.
    pub fn create_entity(entity: Urn, aspect: impl Into<String>, payload: Value) -> Self {
        Self::new(entity, aspect, ChangeType::CreateEntity, Some(payload))
    }

    /// DELETE event (no payload).
    pub fn delete(entity: Urn, aspect: impl Into<String>) -> Self {
        Self::new(entity, aspect, ChangeType::Delete, None)
    }

    /// PATCH event carrying a diff.
    pub fn patch(entity: Urn, aspect: impl Into<String>, diff: Value) -> Self {
        let mut event = Self::new(entity, aspect, ChangeType::Patch, None);
        event.patch = Some(diff);
        event
    }

    /// RESTATE event.
    pub fn restate(entity: Urn, aspect: impl Into<String>, payload: Value) -> Self {
        Self::new(entity, aspect, ChangeType::Restate, Some(payload))
    }

    /// Attach an explicit bucket timestamp.
    pub fn at_bucket(mut self, timestamp_millis: i64) -> Self {
        self.timestamp_millis = Some(timestamp_millis);
        self
    }

    /// Attach a producer run id.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Attach resolved provenance (used on journal replay).
    pub fn with_system_metadata(mut self, metadata: SystemMetadata) -> Self {
        self.system_metadata = Some(metadata);
        self
    }

    /// Bucket timestamp for a time-series append: the explicit field wins,
    /// then a `timestampMillis` payload field.
    pub fn bucket_millis(&self) -> Option<i64> {
        if let Some(millis) = self.timestamp_millis {
            return Some(millis);
        }
        self.payload
            .as_ref()
            .and_then(|payload| payload.get("timestampMillis"))
            .and_then(Value::as_i64)
    }

    /// Resolves provenance: explicit metadata wins, then the run id field,
    /// then the default run id, observed at the given time.
    pub fn resolve_metadata(&self, observed_millis: i64) -> SystemMetadata {
        if let Some(metadata) = &self.system_metadata {
            return metadata.clone();
        }
        let mut metadata = SystemMetadata::observed_at(observed_millis);
        if let Some(run_id) = &self.run_id {
            metadata.run_id = run_id.clone();
        }
        metadata
    }
}
