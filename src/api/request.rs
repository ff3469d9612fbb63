//! API request types
//!
//! JSON request parsing for all supported operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::{ChangeEvent, ChangeType};
use crate::urn::Urn;

use super::errors::{ApiError, ApiResult};

/// Apply request: one change event against one (entity, aspect) key
#[derive(Debug, Clone)]
pub struct ApplyRequest {
    pub event: ChangeEvent,
}

/// Unified request envelope
#[derive(Debug, Clone)]
pub enum Request {
    Apply(ApplyRequest),
    Describe {
        aspect: String,
    },
    Get {
        entity: Urn,
        aspect: String,
    },
    Query {
        entity: Urn,
        aspect: String,
        start_millis: Option<i64>,
        end_millis: Option<i64>,
        latest_only: bool,
    },
}

/// Raw request for parsing
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRequest {
    op: String,
    #[serde(default)]
    entity: Option<String>,
    #[serde(default)]
    aspect: Option<String>,
    #[serde(default)]
    change_type: Option<String>,
    #[serde(default)]
    payload: Option<Value>,
    #[serde(default)]
    patch: Option<Value>,
    #[serde(default)]
    timestamp_millis: Option<i64>,
    #[serde(default)]
    run_id: Option<String>,
    #[serde(default)]
    start_millis: Option<i64>,
    #[serde(default)]
    end_millis: Option<i64>,
    #[serde(default)]
    latest_only: Option<bool>,
}

impl RawRequest {
    fn entity(&self) -> ApiResult<Urn> {
        let raw = self
            .entity
            .as_deref()
            .ok_or_else(|| ApiError::invalid_request("Missing entity"))?;
        Urn::parse(raw).map_err(ApiError::from_urn_error)
    }

    fn aspect(&self) -> ApiResult<String> {
        self.aspect
            .clone()
            .ok_or_else(|| ApiError::invalid_request("Missing aspect"))
    }
}

impl Request {
    /// Parse a request from JSON string
    pub fn parse(json: &str) -> ApiResult<Self> {
        let raw: RawRequest = serde_json::from_str(json)
            .map_err(|e| ApiError::invalid_request(format!("Invalid JSON: {}", e)))?;

        match raw.op.as_str() {
            "apply" => {
                let entity = raw.entity()?;
                let aspect = raw.aspect()?;
                let tag = raw
                    .change_type
                    .clone()
                    .ok_or_else(|| ApiError::invalid_request("Missing change_type"))?;
                let change_type: ChangeType = serde_json::from_value(Value::String(tag.clone()))
                    .map_err(|_| {
                        ApiError::invalid_request(format!("Unknown change type '{}'", tag))
                    })?;

                Ok(Request::Apply(ApplyRequest {
                    event: ChangeEvent {
                        entity,
                        aspect,
                        change_type,
                        payload: raw.payload,
                        patch: raw.patch,
                        timestamp_millis: raw.timestamp_millis,
                        run_id: raw.run_id,
                        system_metadata: None,
                    },
                }))
            }
            "describe" => {
                let aspect = raw.aspect()?;
                Ok(Request::Describe { aspect })
            }
            "get" => {
                let entity = raw.entity()?;
                let aspect = raw.aspect()?;
                Ok(Request::Get { entity, aspect })
            }
            "query" => {
                let entity = raw.entity()?;
                let aspect = raw.aspect()?;
                Ok(Request::Query {
                    entity,
                    aspect,
                    start_millis: raw.start_millis,
                    end_millis: raw.end_millis,
                    latest_only: raw.latest_only.unwrap_or(false),
                })
            }
            other => Err(ApiError::unknown_operation(other)),
        }
    }
}
