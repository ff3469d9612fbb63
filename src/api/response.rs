//! Response envelope
//!
//! Every operation answers with exactly one JSON object tagged by
//! `status`: `ok` carries a `data` payload, `error` carries the stable
//! code and a human-readable message. Rejected changes and read misses
//! use the same error envelope as malformed requests; the code is the
//! contract, the message is advisory.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::ApiError;

/// One response line on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    /// `{"status":"ok","data":...}`
    Ok { data: Value },
    /// `{"status":"error","code":...,"message":...}`
    Error { code: String, message: String },
}

impl Response {
    /// Wraps operation output in a success envelope.
    pub fn success(data: Value) -> Self {
        Response::Ok { data }
    }

    /// Renders an API error as an error envelope.
    pub fn error(err: &ApiError) -> Self {
        Response::Error {
            code: err.code().to_string(),
            message: err.message().to_string(),
        }
    }

    /// Serializes the envelope to its wire line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("response envelope serialization cannot fail")
    }

    /// Whether this is a success envelope.
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Ok { .. })
    }
}
