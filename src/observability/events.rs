//! Observability events
//!
//! Every log line names one of these events, covering boot, replay,
//! serving, change handling, and shutdown. The wire name of each event
//! is a stable contract; renaming one breaks log consumers.

use std::fmt;

use super::logger::Severity;

/// Observable events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Startup and shutdown
    /// Startup begins
    BootStart,
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Descriptors loaded into the registry
    DescriptorsLoaded,
    /// Journal replay begins
    ReplayStart,
    /// Journal replay complete
    ReplayComplete,
    /// Startup complete, stores rebuilt
    BootComplete,
    /// Ready to serve requests
    Serving,
    /// Shutdown begins
    ShutdownStart,
    /// Clean exit
    ShutdownComplete,

    // Change handling
    /// Change event received
    ChangeReceived,
    /// Change applied and acknowledged
    ChangeApplied,
    /// Change rejected
    ChangeRejected,
    /// Time-series entry appended
    TimeseriesAppend,
    /// Index operations derived from an accepted change
    IndexOpsDerived,

    // Journal
    /// Journal record appended and fsynced
    JournalAppend,
    /// Journal corruption detected (FATAL)
    JournalCorruption,
}

impl Event {
    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::DescriptorsLoaded => "DESCRIPTORS_LOADED",
            Event::ReplayStart => "REPLAY_START",
            Event::ReplayComplete => "REPLAY_COMPLETE",
            Event::BootComplete => "BOOT_COMPLETE",
            Event::Serving => "SERVING",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
            Event::ChangeReceived => "CHANGE_RECEIVED",
            Event::ChangeApplied => "CHANGE_APPLIED",
            Event::ChangeRejected => "CHANGE_REJECTED",
            Event::TimeseriesAppend => "TIMESERIES_APPEND",
            Event::IndexOpsDerived => "INDEX_OPS_DERIVED",
            Event::JournalAppend => "JOURNAL_APPEND",
            Event::JournalCorruption => "JOURNAL_CORRUPTION",
        }
    }

    /// Default severity this event is logged at.
    ///
    /// Journal corruption is the one fatal event; the process halts
    /// after reporting it.
    pub fn severity(&self) -> Severity {
        match self {
            Event::JournalCorruption => Severity::Fatal,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
