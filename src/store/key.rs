//! Store key type

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::urn::Urn;

/// Identity of one aspect on one entity.
///
/// Both stores and the processor's shard locks key on this pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AspectKey {
    /// Entity URN.
    pub entity: Urn,
    /// Aspect name.
    pub aspect: String,
}

impl AspectKey {
    /// Creates a key from an entity and aspect name.
    pub fn new(entity: Urn, aspect: impl Into<String>) -> Self {
        Self {
            entity,
            aspect: aspect.into(),
        }
    }
}

impl fmt::Display for AspectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity, self.aspect)
    }
}
