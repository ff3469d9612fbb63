//! API handler
//!
//! Parses request lines, dispatches to the processor or registry, and
//! renders the response envelope. Change handling logs the lifecycle
//! events; reads stay silent.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::observability::{Event, Logger};
use crate::processor::{Applied, AppliedState, ChangeProcessor};
use crate::registry::AspectRegistry;
use crate::store::AspectKey;
use crate::timeseries::TimeRange;
use crate::urn::Urn;

use super::errors::{ApiError, ApiResult};
use super::request::{ApplyRequest, Request};
use super::response::Response;

/// Request dispatcher over the registry and processor.
///
/// Write serialization lives in the processor's shard locks, so the
/// handler itself holds no lock and can be shared across callers.
pub struct ApiHandler {
    registry: Arc<AspectRegistry>,
    processor: ChangeProcessor,
}

impl ApiHandler {
    /// Create a new API handler
    pub fn new(registry: Arc<AspectRegistry>, processor: ChangeProcessor) -> Self {
        Self {
            registry,
            processor,
        }
    }

    /// Processor behind this handler.
    pub fn processor(&self) -> &ChangeProcessor {
        &self.processor
    }

    /// Handle a raw JSON request string
    pub fn handle(&self, json_request: &str) -> Response {
        // Parse request
        let request = match Request::parse(json_request) {
            Ok(r) => r,
            Err(e) => return Response::error(&e),
        };

        // Dispatch to appropriate handler
        let result = match request {
            Request::Apply(r) => self.handle_apply(r),
            Request::Describe { aspect } => self.handle_describe(&aspect),
            Request::Get { entity, aspect } => self.handle_get(&entity, &aspect),
            Request::Query {
                entity,
                aspect,
                start_millis,
                end_millis,
                latest_only,
            } => self.handle_query(&entity, &aspect, start_millis, end_millis, latest_only),
        };

        match result {
            Ok(data) => Response::success(data),
            Err(e) => Response::error(&e),
        }
    }

    /// Handle apply operation
    ///
    /// Flow:
    /// 1. Log receipt
    /// 2. Apply through the processor (validate, journal, mutate)
    /// 3. Log the outcome
    /// 4. Render the applied state
    fn handle_apply(&self, req: ApplyRequest) -> ApiResult<Value> {
        let event = &req.event;
        let entity = event.entity.to_string();

        // 1. Receipt, before any decision.
        Logger::trace(
            Event::ChangeReceived.as_str(),
            &[
                ("aspect", event.aspect.as_str()),
                ("change_type", event.change_type.as_str()),
                ("entity", entity.as_str()),
            ],
        );

        // 2. The processor runs the full apply sequence.
        let applied = match self.processor.apply(event) {
            Ok(applied) => applied,
            Err(err) => {
                let api_err = ApiError::from_processor_error(err);
                Logger::warn(
                    Event::ChangeRejected.as_str(),
                    &[
                        ("aspect", event.aspect.as_str()),
                        ("code", api_err.code()),
                        ("entity", entity.as_str()),
                    ],
                );
                return Err(api_err);
            }
        };

        // 3. Outcome trail: journal, store, index.
        if let Some(sequence) = applied.journal_sequence {
            let sequence = sequence.to_string();
            Logger::trace(
                Event::JournalAppend.as_str(),
                &[
                    ("aspect", applied.aspect.as_str()),
                    ("sequence", sequence.as_str()),
                ],
            );
        }
        self.log_applied(&entity, &applied);
        if !applied.index_ops.is_empty() {
            let count = applied.index_ops.len().to_string();
            Logger::trace(
                Event::IndexOpsDerived.as_str(),
                &[
                    ("aspect", applied.aspect.as_str()),
                    ("count", count.as_str()),
                ],
            );
        }

        // 4. Render.
        Ok(render_applied(&entity, &applied))
    }

    /// Handle describe operation
    fn handle_describe(&self, aspect: &str) -> ApiResult<Value> {
        let descriptor = self
            .registry
            .describe(aspect)
            .map_err(ApiError::from_registry_error)?;
        serde_json::to_value(descriptor)
            .map_err(|e| ApiError::invalid_request(format!("Descriptor render failed: {}", e)))
    }

    /// Handle get operation (versioned aspects only)
    fn handle_get(&self, entity: &Urn, aspect: &str) -> ApiResult<Value> {
        let descriptor = self
            .registry
            .describe(aspect)
            .map_err(ApiError::from_registry_error)?;
        if descriptor.is_timeseries() {
            return Err(ApiError::invalid_request(format!(
                "Aspect '{}' is a time-series aspect; use the query operation",
                aspect
            )));
        }

        let key = AspectKey::new(entity.clone(), aspect);
        let record = self
            .processor
            .versioned()
            .get(&key)
            .map_err(ApiError::from_store_error)?;

        match record {
            Some(record) => Ok(json!({
                "entity": entity.as_str(),
                "aspect": aspect,
                "version": record.version,
                "payload": record.payload,
                "metadata": record.metadata,
            })),
            None => Err(ApiError::not_found(entity.as_str(), aspect)),
        }
    }

    /// Handle query operation (time-series aspects only)
    fn handle_query(
        &self,
        entity: &Urn,
        aspect: &str,
        start_millis: Option<i64>,
        end_millis: Option<i64>,
        latest_only: bool,
    ) -> ApiResult<Value> {
        let descriptor = self
            .registry
            .describe(aspect)
            .map_err(ApiError::from_registry_error)?;
        if !descriptor.is_timeseries() {
            return Err(ApiError::invalid_request(format!(
                "Aspect '{}' is a versioned aspect; the query operation reads time-series aspects",
                aspect
            )));
        }

        let key = AspectKey::new(entity.clone(), aspect);
        let range = TimeRange::new(
            start_millis.unwrap_or(i64::MIN),
            end_millis.unwrap_or(i64::MAX),
        );
        let entries = if latest_only {
            self.processor.timeseries().latest_per_bucket(&key, range)
        } else {
            self.processor.timeseries().query(&key, range)
        }
        .map_err(ApiError::from_store_error)?;

        Ok(json!({
            "entity": entity.as_str(),
            "aspect": aspect,
            "count": entries.len(),
            "entries": entries,
        }))
    }

    fn log_applied(&self, entity: &str, applied: &Applied) {
        match &applied.state {
            AppliedState::Versioned { version } => {
                let version = version.to_string();
                Logger::info(
                    Event::ChangeApplied.as_str(),
                    &[
                        ("aspect", applied.aspect.as_str()),
                        ("entity", entity),
                        ("version", version.as_str()),
                    ],
                );
            }
            AppliedState::Removed { existed } => {
                let existed = existed.to_string();
                Logger::info(
                    Event::ChangeApplied.as_str(),
                    &[
                        ("aspect", applied.aspect.as_str()),
                        ("deleted", existed.as_str()),
                        ("entity", entity),
                    ],
                );
            }
            AppliedState::Timeseries {
                bucket_millis,
                sequence,
            } => {
                let bucket = bucket_millis.to_string();
                let sequence = sequence.to_string();
                Logger::trace(
                    Event::TimeseriesAppend.as_str(),
                    &[
                        ("aspect", applied.aspect.as_str()),
                        ("bucket_millis", bucket.as_str()),
                        ("sequence", sequence.as_str()),
                    ],
                );
                Logger::info(
                    Event::ChangeApplied.as_str(),
                    &[
                        ("aspect", applied.aspect.as_str()),
                        ("bucket_millis", bucket.as_str()),
                        ("entity", entity),
                    ],
                );
            }
        }
    }
}

/// Renders an applied change into the response data object.
fn render_applied(entity: &str, applied: &Applied) -> Value {
    match &applied.state {
        AppliedState::Versioned { version } => json!({
            "entity": entity,
            "aspect": applied.aspect,
            "kind": applied.kind.kind_name(),
            "version": version,
            "restated": applied.restated,
            "index_ops": applied.index_ops,
        }),
        AppliedState::Removed { existed } => json!({
            "entity": entity,
            "aspect": applied.aspect,
            "kind": applied.kind.kind_name(),
            "deleted": existed,
        }),
        AppliedState::Timeseries {
            bucket_millis,
            sequence,
        } => json!({
            "entity": entity,
            "aspect": applied.aspect,
            "kind": applied.kind.kind_name(),
            "bucket_millis": bucket_millis,
            "sequence": sequence,
            "restated": applied.restated,
            "index_ops": applied.index_ops,
            "timeseries_projections": applied.projections,
        }),
    }
}
