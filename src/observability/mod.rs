//! Observability subsystem
//!
//! One JSON line per event on stderr, nothing else. stdout belongs to
//! the response stream, so a consumer can pipe requests through `start`
//! and parse both streams independently. Emission is synchronous and
//! deterministic: fixed event names, alphabetical field order, no
//! timestamps or generated ids in the lines themselves.
//!
//! ```ignore
//! use aspectdb::observability::{log_event_with_fields, Event, Logger};
//!
//! Logger::warn("CHANGE_REJECTED", &[("code", "ADB_UNKNOWN_FIELD")]);
//! log_event_with_fields(Event::ReplayComplete, &[("records", "12")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Emits a lifecycle event at INFO, or FATAL for fatal events.
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Emits a lifecycle event with context fields.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
