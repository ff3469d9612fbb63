//! In-memory aspect registry
//!
//! The registry is populated once during boot (built-ins plus descriptor
//! files) and treated as read-only for the rest of the process lifetime.
//! Callers share it behind `Arc` with no locking.

use std::collections::HashMap;

use super::errors::{RegistryError, RegistryResult};
use super::types::AspectDescriptor;

/// Holds every registered aspect descriptor, keyed by aspect name.
pub struct AspectRegistry {
    /// Descriptors indexed by aspect name.
    descriptors: HashMap<String, AspectDescriptor>,
    /// Registration order, for deterministic listings.
    order: Vec<String>,
}

impl AspectRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            descriptors: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Registers a descriptor.
    ///
    /// Fails with `ADB_MALFORMED_DESCRIPTOR` if the descriptor is
    /// structurally invalid and `ADB_DUPLICATE_ASPECT` if the name is taken.
    pub fn register(&mut self, descriptor: AspectDescriptor) -> RegistryResult<()> {
        descriptor
            .validate_structure()
            .map_err(|reason| RegistryError::malformed_descriptor("<in-memory>", reason))?;

        if self.descriptors.contains_key(&descriptor.name) {
            return Err(RegistryError::duplicate_aspect(&descriptor.name));
        }

        self.order.push(descriptor.name.clone());
        self.descriptors.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Returns the descriptor for an aspect name.
    pub fn describe(&self, name: &str) -> RegistryResult<&AspectDescriptor> {
        self.descriptors
            .get(name)
            .ok_or_else(|| RegistryError::unknown_aspect(name))
    }

    /// Returns the descriptor if registered.
    pub fn get(&self, name: &str) -> Option<&AspectDescriptor> {
        self.descriptors.get(name)
    }

    /// Checks whether an aspect name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    /// Registered aspect names in registration order.
    pub fn aspect_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|name| name.as_str())
    }

    /// Number of registered aspects.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the registry holds no descriptors.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for AspectRegistry {
    fn default() -> Self {
        Self::new()
    }
}
