//! Observability for clinicdb
//!
//! Structured JSON logging of typed events. No metrics, no background
//! threads; a log call either writes one line to stderr or is filtered
//! out by the configured minimum severity.
//!
//! ```ignore
//! use clinicdb::observability::{Event, Logger};
//!
//! Logger::info(Event::RecordInsert, &[("kind", "doctor"), ("key", "D1")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
