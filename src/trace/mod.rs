//! Fire-and-forget instrumentation hooks.
//!
//! The engine notifies a [`Tracer`] at every documented point of a
//! dispatch: entry, guard rejection, event-not-found, each state exit
//! and entry, each transition segment, completion synthesis,
//! condition-not-found, and depth-ceiling violation (immediately before
//! the panic). Every hook has a no-op default, so a tracer implements
//! only what it cares about; the engine is agnostic to the rest.
//!
//! Tracers are held by the machine instance as explicit context state;
//! there are no process-wide mutable tables.

mod recorder;

pub use recorder::{TraceEvent, TraceRecord, TraceRecorder};

use crate::core::Signal;

/// Receiver for engine trace notifications.
pub trait Tracer: Send {
    /// An external event reached `dispatch` while `current` was active.
    fn dispatched(&mut self, _signal: Signal, _current: &'static str) {}

    /// A syntactically matching table entry was disabled by its guard.
    fn guard_rejected(&mut self, _state: &'static str) {}

    /// No table entry matched at any ancestor level; state unchanged.
    fn event_not_found(&mut self, _signal: Signal) {}

    /// A state's entry action point was reached.
    fn state_entered(&mut self, _state: &'static str) {}

    /// A state's exit action point was reached.
    fn state_exited(&mut self, _state: &'static str) {}

    /// A new transition segment began, targeting `target`.
    fn segment(&mut self, _count: usize, _target: &'static str) {}

    /// A completion event was synthesized after stabilizing in `state`.
    fn completion_synthesized(&mut self, _state: &'static str) {}

    /// A choice/junction branch table had no matching guard and no ELSE.
    fn condition_not_found(&mut self, _state: &'static str) {}

    /// The hierarchical-depth ceiling was exceeded; the engine panics
    /// right after this notification.
    fn depth_exceeded(&mut self, _detail: &'static str) {}

    /// The machine entered its initial configuration.
    fn initialized(&mut self, _state: &'static str) {}
}

/// Tracer that discards every notification. The default.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {}
