//! Aspect Schema Registry subsystem
//!
//! Holds typed descriptors for aspects (field lists plus search and
//! time-series annotation hints) and validates change payloads against
//! them.
//!
//! # Design Principles
//!
//! - Populated once at boot; immutable afterward
//! - Descriptor names unique within the registry
//! - Every change validates before any state mutation
//! - Malformed descriptor files are FATAL at boot
//! - Deterministic validation, no coercion, no defaults

pub mod builtin;
mod errors;
mod loader;
#[allow(clippy::module_inception)]
mod registry;
mod types;
mod validator;

pub use errors::{RegistryError, RegistryErrorCode, RegistryResult, Severity};
pub use loader::DescriptorLoader;
pub use registry::AspectRegistry;
pub use types::{
    AspectDescriptor, AspectKind, FieldDescriptor, SearchFieldType, SearchHint, TimeseriesHint,
    ValueType,
};
pub use validator::AspectValidator;
