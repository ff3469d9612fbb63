//! Change event processor
//!
//! Single write path for every change event. Each apply runs under the
//! shard lock for its (entity, aspect) key and follows a fixed sequence:
//! resolve the descriptor, decide the transition, validate the payload,
//! append to the journal, mutate the store, derive index output. Any
//! rejection fires before the journal append, so the journal holds only
//! accepted changes.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::{Map, Value};

use crate::event::{ChangeEvent, ChangeType, SystemMetadata};
use crate::index::{
    derive_index_ops, derive_timeseries_projection, IndexOp, TimeseriesProjection,
};
use crate::journal::{ApplyChange, ChangeRecord, JournalWriter};
use crate::processor::errors::{ProcessorError, ProcessorResult};
use crate::processor::locks::ShardLocks;
use crate::registry::{AspectDescriptor, AspectKind, AspectRegistry, AspectValidator, RegistryError};
use crate::store::{AspectKey, StoreError, VersionedStore};
use crate::timeseries::TimeseriesStore;

/// Outcome of a successfully applied change event.
#[derive(Debug, Clone)]
pub struct Applied {
    /// Aspect name resolved from the registry.
    pub aspect: String,
    /// Storage kind of the aspect.
    pub kind: AspectKind,
    /// Resulting store state.
    pub state: AppliedState,
    /// Whether the change was a restatement.
    pub restated: bool,
    /// Search index operations derived from the written payload.
    pub index_ops: Vec<IndexOp>,
    /// Time-series projections derived from the written payload.
    pub projections: Vec<TimeseriesProjection>,
    /// Journal sequence assigned to the change, when journaling ran.
    pub journal_sequence: Option<u64>,
}

/// Store state produced by an applied change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedState {
    /// A versioned record now holds this version.
    Versioned { version: u64 },
    /// The key is absent; `existed` says whether a record was removed.
    Removed { existed: bool },
    /// An append-only entry landed in this bucket.
    Timeseries { bucket_millis: i64, sequence: u64 },
}

/// Applies change events against the registry and both stores.
///
/// The processor owns the stores and the shard lock pool. An optional
/// journal writer makes accepted changes durable before they become
/// visible; replay runs through the same code with journaling off.
pub struct ChangeProcessor {
    registry: Arc<AspectRegistry>,
    versioned: VersionedStore,
    timeseries: TimeseriesStore,
    locks: ShardLocks,
    journal: Option<Mutex<JournalWriter>>,
}

impl ChangeProcessor {
    /// Creates a processor without a journal.
    pub fn new(registry: Arc<AspectRegistry>, shard_count: usize) -> Self {
        ChangeProcessor {
            registry,
            versioned: VersionedStore::new(),
            timeseries: TimeseriesStore::new(),
            locks: ShardLocks::new(shard_count),
            journal: None,
        }
    }

    /// Attaches a journal writer. Every change applied afterwards is
    /// appended and fsynced before the store mutation.
    pub fn with_journal(mut self, writer: JournalWriter) -> Self {
        self.journal = Some(Mutex::new(writer));
        self
    }

    /// Registry the processor validates against.
    pub fn registry(&self) -> &AspectRegistry {
        &self.registry
    }

    /// Versioned latest-state store.
    pub fn versioned(&self) -> &VersionedStore {
        &self.versioned
    }

    /// Append-only time-series store.
    pub fn timeseries(&self) -> &TimeseriesStore {
        &self.timeseries
    }

    /// Applies a change event, journaling it when a writer is attached.
    pub fn apply(&self, event: &ChangeEvent) -> ProcessorResult<Applied> {
        self.apply_event(event, true)
    }

    fn apply_event(&self, event: &ChangeEvent, journal: bool) -> ProcessorResult<Applied> {
        // 1. Resolve the descriptor; an unknown aspect rejects before
        //    anything else runs.
        let descriptor = self.registry.describe(&event.aspect)?;

        // 2. Resolve provenance once, outside the lock.
        let metadata = event.resolve_metadata(Utc::now().timestamp_millis());

        // 3. Hold the shard lock across decide, journal, and mutate so
        //    the sequence is atomic per key.
        let key = AspectKey::new(event.entity.clone(), event.aspect.as_str());
        let _guard = self.locks.lock(&key)?;

        if descriptor.is_timeseries() {
            self.apply_timeseries(event, descriptor, key, metadata, journal)
        } else {
            self.apply_versioned(event, descriptor, key, metadata, journal)
        }
    }

    fn apply_versioned(
        &self,
        event: &ChangeEvent,
        descriptor: &AspectDescriptor,
        key: AspectKey,
        metadata: SystemMetadata,
        journal: bool,
    ) -> ProcessorResult<Applied> {
        match event.change_type {
            ChangeType::Upsert => {
                // Validate, journal, then insert-or-replace.
                let payload = event.payload.clone().unwrap_or(Value::Null);
                AspectValidator::validate_against(descriptor, &payload)?;
                let journal_sequence = self.journal_append(journal, event, &metadata)?;
                let version = self.versioned.upsert(key, payload.clone(), metadata)?;
                Ok(self.applied_versioned(descriptor, version, false, &payload, journal_sequence))
            }
            ChangeType::Create | ChangeType::CreateEntity => {
                let payload = event.payload.clone().unwrap_or(Value::Null);
                AspectValidator::validate_against(descriptor, &payload)?;
                // Presence decides before the journal append; a create
                // that loses is never journaled.
                if self.versioned.get(&key)?.is_some() {
                    return Err(self.already_exists(event, descriptor));
                }
                let journal_sequence = self.journal_append(journal, event, &metadata)?;
                match self.versioned.insert_new(key, payload.clone(), metadata)? {
                    Some(version) => Ok(self.applied_versioned(
                        descriptor,
                        version,
                        false,
                        &payload,
                        journal_sequence,
                    )),
                    None => Err(self.already_exists(event, descriptor)),
                }
            }
            ChangeType::Update => {
                // Reserved tag. Presence decides which rejection fires.
                match self.versioned.get(&key)? {
                    Some(_) => Err(ProcessorError::UnsupportedOperation {
                        change_type: event.change_type,
                    }),
                    None => Err(self.not_found(event, descriptor)),
                }
            }
            ChangeType::Delete => {
                // Deletes journal even when the key is absent; the
                // journal records every accepted change, including
                // idempotent no-ops.
                let journal_sequence = self.journal_append(journal, event, &metadata)?;
                let existed = self.versioned.remove(&key)?;
                Ok(Applied {
                    aspect: descriptor.name.clone(),
                    kind: descriptor.kind,
                    state: AppliedState::Removed { existed },
                    restated: false,
                    index_ops: Vec::new(),
                    projections: Vec::new(),
                    journal_sequence,
                })
            }
            ChangeType::Patch => {
                let diff = match &event.patch {
                    Some(Value::Object(map)) => map.clone(),
                    Some(_) => {
                        return Err(RegistryError::invalid_payload(
                            &descriptor.name,
                            "patch diff must be a JSON object",
                        )
                        .into())
                    }
                    None => Map::new(),
                };
                let current = match self.versioned.get(&key)? {
                    Some(record) => record,
                    None => return Err(self.not_found(event, descriptor)),
                };
                // Merge first, then validate the merged result; a bad
                // merge leaves the stored record untouched.
                let merged = shallow_merge(&current.payload, &diff);
                AspectValidator::validate_against(descriptor, &merged)?;
                let journal_sequence = self.journal_append(journal, event, &metadata)?;
                match self.versioned.bump(&key, merged.clone(), metadata)? {
                    Some(version) => Ok(self.applied_versioned(
                        descriptor,
                        version,
                        false,
                        &merged,
                        journal_sequence,
                    )),
                    None => Err(self.not_found(event, descriptor)),
                }
            }
            ChangeType::Restate => {
                let payload = event.payload.clone().unwrap_or(Value::Null);
                AspectValidator::validate_against(descriptor, &payload)?;
                if self.versioned.get(&key)?.is_none() {
                    return Err(self.not_found(event, descriptor));
                }
                let journal_sequence = self.journal_append(journal, event, &metadata)?;
                match self.versioned.restate(&key, payload.clone(), metadata)? {
                    Some(version) => Ok(self.applied_versioned(
                        descriptor,
                        version,
                        true,
                        &payload,
                        journal_sequence,
                    )),
                    None => Err(self.not_found(event, descriptor)),
                }
            }
        }
    }

    fn apply_timeseries(
        &self,
        event: &ChangeEvent,
        descriptor: &AspectDescriptor,
        key: AspectKey,
        metadata: SystemMetadata,
        journal: bool,
    ) -> ProcessorResult<Applied> {
        // 1. Gate on change type: reserved tags reject everywhere,
        //    state-mutating tags have no meaning on append-only storage.
        if event.change_type.is_reserved() {
            return Err(ProcessorError::UnsupportedOperation {
                change_type: event.change_type,
            });
        }
        if !event.change_type.appends_to_timeseries() {
            return Err(ProcessorError::UnsupportedForTimeseries {
                change_type: event.change_type,
                aspect: descriptor.name.clone(),
            });
        }

        // 2. Validate the payload, then resolve the bucket.
        let payload = event.payload.clone().unwrap_or(Value::Null);
        AspectValidator::validate_against(descriptor, &payload)?;
        let bucket_millis = match event.bucket_millis() {
            Some(millis) => millis,
            None => {
                return Err(RegistryError::missing_required_field(
                    &descriptor.name,
                    "timestampMillis",
                )
                .into())
            }
        };

        // 3. Journal, then append; prior entries are never touched.
        let restated = event.change_type == ChangeType::Restate;
        let journal_sequence = self.journal_append(journal, event, &metadata)?;
        let entry = self
            .timeseries
            .append(key, bucket_millis, payload.clone(), restated, metadata)?;

        // 4. Derive search index ops and per-bucket projections.
        Ok(Applied {
            aspect: descriptor.name.clone(),
            kind: descriptor.kind,
            state: AppliedState::Timeseries {
                bucket_millis: entry.bucket_millis,
                sequence: entry.sequence,
            },
            restated,
            index_ops: derive_index_ops(descriptor, &payload),
            projections: derive_timeseries_projection(descriptor, &payload),
            journal_sequence,
        })
    }

    fn journal_append(
        &self,
        journal: bool,
        event: &ChangeEvent,
        metadata: &SystemMetadata,
    ) -> ProcessorResult<Option<u64>> {
        if !journal {
            return Ok(None);
        }
        match &self.journal {
            Some(writer) => {
                let mut writer = match writer.lock() {
                    Ok(guard) => guard,
                    Err(_) => return Err(StoreError::LockPoisoned("journal writer").into()),
                };
                let sequence = writer.append(ChangeRecord::from_event(event, metadata.clone()))?;
                Ok(Some(sequence))
            }
            None => Ok(None),
        }
    }

    fn applied_versioned(
        &self,
        descriptor: &AspectDescriptor,
        version: u64,
        restated: bool,
        payload: &Value,
        journal_sequence: Option<u64>,
    ) -> Applied {
        Applied {
            aspect: descriptor.name.clone(),
            kind: descriptor.kind,
            state: AppliedState::Versioned { version },
            restated,
            index_ops: derive_index_ops(descriptor, payload),
            projections: Vec::new(),
            journal_sequence,
        }
    }

    fn already_exists(&self, event: &ChangeEvent, descriptor: &AspectDescriptor) -> ProcessorError {
        ProcessorError::AlreadyExists {
            entity: event.entity.to_string(),
            aspect: descriptor.name.clone(),
        }
    }

    fn not_found(&self, event: &ChangeEvent, descriptor: &AspectDescriptor) -> ProcessorError {
        ProcessorError::NotFound {
            entity: event.entity.to_string(),
            aspect: descriptor.name.clone(),
        }
    }
}

impl ApplyChange for ChangeProcessor {
    fn apply_replayed(&self, event: &ChangeEvent) -> Result<(), String> {
        match self.apply_event(event, false) {
            Ok(_) => Ok(()),
            Err(err) => Err(err.message()),
        }
    }
}

/// Shallow merge of a patch diff into a stored payload.
///
/// Top-level keys only: a null diff value removes the key, any other
/// value replaces it. Stored payloads always validated as objects, so a
/// non-object base starts from empty.
fn shallow_merge(base: &Value, diff: &Map<String, Value>) -> Value {
    let mut merged = match base {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    for (field, value) in diff {
        if value.is_null() {
            merged.remove(field);
        } else {
            merged.insert(field.clone(), value.clone());
        }
    }
    Value::Object(merged)
}
