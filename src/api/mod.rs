//! API layer
//!
//! Line-oriented JSON request handling over the registry and processor.
//!
//! # Design Principles
//!
//! - One request line in, one response line out
//! - Error codes passed through unchanged from the subsystems
//! - Writes serialize per key in the processor, reads run concurrently
//! - No timestamps, no generated IDs beyond resolved provenance
//!
//! # Supported Operations
//!
//! - apply
//! - describe
//! - get
//! - query

mod errors;
mod handler;
mod request;
mod response;

pub use errors::{ApiError, ApiResult};
pub use handler::ApiHandler;
pub use request::{ApplyRequest, Request};
pub use response::Response;
