//! Observability for checksummed I/O
//!
//! - Structured logging (JSON lines on stderr)
//! - Lifecycle events for writers, readers and merges
//! - Cumulative timers split between I/O and checksum work
//!
//! Observability is read-only: nothing here changes what an operation does,
//! and a failing log sink never fails an operation.
//!
//! ```ignore
//! use fastcksum::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::ManifestAppend, &[("manifest", "out.bin.crc32")]);
//! ```

mod events;
mod logger;
mod scope;
mod timer;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;
pub use timer::{CumulativeTimer, IoTimings, Timer};

/// Failures also returned as an error log at INFO; the caller reports them.
/// Only a failure with no caller to return to logs at ERROR.
fn event_severity(event: Event) -> Severity {
    if event.is_unreturnable_failure() {
        Severity::Error
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event_severity(event), event.as_str(), fields);
}

/// Log a per-file event at TRACE level
pub fn trace_event(event: Event, fields: &[(&str, &str)]) {
    Logger::trace(event.as_str(), fields);
}
