//! aspectdb - A strict, deterministic aspect registry and change-event store
//!
//! Entities are addressed by URN; their state is a set of named aspects
//! described by registered descriptors. Changes arrive as typed events,
//! are validated against the registry, journaled, and applied to the
//! versioned or time-series store with search index hints derived on
//! every accepted write.

pub mod api;
pub mod cli;
pub mod config;
pub mod event;
pub mod index;
pub mod journal;
pub mod observability;
pub mod processor;
pub mod registry;
pub mod store;
pub mod timeseries;
pub mod urn;
