//! Event emission for observability.
//!
//! The engine emits an event for every staleness marking, edge mutation and
//! evaluation attempt; UI layers and tests subscribe through an
//! [`EventSink`].

mod sink;

pub use sink::{CollectingEventSink, EventSink, FlowEvent, LoggingEventSink, NoOpEventSink};
