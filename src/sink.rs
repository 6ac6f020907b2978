//! Observability sink
//!
//! This module defines the trait through which the engine reports structured
//! events (phase switches, registrations, assignment results, swallowed
//! messages). The sink abstraction keeps the core free of any process-wide
//! logger: callers inject whatever collector suits them — a log adapter, a
//! test recorder, or nothing at all.

use super::Event;

/// Trait for receiving structured engine events
///
/// Implementations might forward events to a logging framework, persist
/// them for auditing, or fan them out to spectators. Emission must not
/// block the dispatch loop for longer than the caller can afford.
pub trait EventSink {
    /// Receives one engine event
    ///
    /// # Arguments
    ///
    /// * `event` - The event being reported
    fn emit(&self, event: &Event);
}

/// Discards every event; useful when observability is not wired up
impl EventSink for () {
    fn emit(&self, _event: &Event) {}
}
