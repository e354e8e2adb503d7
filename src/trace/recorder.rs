//! In-memory trace recording.
//!
//! `TraceRecorder` keeps an ordered, timestamped log of every
//! notification it receives. It doubles as the test suite's ordering
//! oracle: two runs over the same tables and event sequence must
//! produce identical event logs.

use super::Tracer;
use crate::core::Signal;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One trace notification, without its timestamp.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum TraceEvent {
    Dispatched {
        signal: Signal,
        state: &'static str,
    },
    GuardRejected {
        state: &'static str,
    },
    EventNotFound {
        signal: Signal,
    },
    Entered {
        state: &'static str,
    },
    Exited {
        state: &'static str,
    },
    Segment {
        count: usize,
        target: &'static str,
    },
    CompletionSynthesized {
        state: &'static str,
    },
    ConditionNotFound {
        state: &'static str,
    },
    DepthExceeded {
        detail: &'static str,
    },
    Initialized {
        state: &'static str,
    },
}

/// A recorded notification and when it arrived.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct TraceRecord {
    pub at: DateTime<Utc>,
    pub event: TraceEvent,
}

/// Tracer that records notifications in arrival order.
///
/// # Example
///
/// ```rust
/// use strata::trace::{TraceEvent, TraceRecorder, Tracer};
///
/// let mut recorder = TraceRecorder::new();
/// recorder.state_entered("idle");
/// recorder.state_exited("idle");
///
/// assert_eq!(
///     recorder.events(),
///     vec![
///         TraceEvent::Entered { state: "idle" },
///         TraceEvent::Exited { state: "idle" },
///     ]
/// );
/// ```
#[derive(Debug, Default)]
pub struct TraceRecorder {
    records: Vec<TraceRecord>,
}

impl TraceRecorder {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records, in arrival order.
    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    /// The recorded events without their timestamps.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.records.iter().map(|r| r.event).collect()
    }

    /// Drop all records.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    fn push(&mut self, event: TraceEvent) {
        self.records.push(TraceRecord {
            at: Utc::now(),
            event,
        });
    }
}

impl Tracer for TraceRecorder {
    fn dispatched(&mut self, signal: Signal, state: &'static str) {
        self.push(TraceEvent::Dispatched { signal, state });
    }

    fn guard_rejected(&mut self, state: &'static str) {
        self.push(TraceEvent::GuardRejected { state });
    }

    fn event_not_found(&mut self, signal: Signal) {
        self.push(TraceEvent::EventNotFound { signal });
    }

    fn state_entered(&mut self, state: &'static str) {
        self.push(TraceEvent::Entered { state });
    }

    fn state_exited(&mut self, state: &'static str) {
        self.push(TraceEvent::Exited { state });
    }

    fn segment(&mut self, count: usize, target: &'static str) {
        self.push(TraceEvent::Segment { count, target });
    }

    fn completion_synthesized(&mut self, state: &'static str) {
        self.push(TraceEvent::CompletionSynthesized { state });
    }

    fn condition_not_found(&mut self, state: &'static str) {
        self.push(TraceEvent::ConditionNotFound { state });
    }

    fn depth_exceeded(&mut self, detail: &'static str) {
        self.push(TraceEvent::DepthExceeded { detail });
    }

    fn initialized(&mut self, state: &'static str) {
        self.push(TraceEvent::Initialized { state });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_preserve_arrival_order() {
        let mut recorder = TraceRecorder::new();
        recorder.state_exited("a");
        recorder.state_entered("b");
        recorder.state_entered("c");

        assert_eq!(
            recorder.events(),
            vec![
                TraceEvent::Exited { state: "a" },
                TraceEvent::Entered { state: "b" },
                TraceEvent::Entered { state: "c" },
            ]
        );
    }

    #[test]
    fn clear_empties_the_log() {
        let mut recorder = TraceRecorder::new();
        recorder.initialized("root");
        assert_eq!(recorder.records().len(), 1);

        recorder.clear();
        assert!(recorder.records().is_empty());
    }

    #[test]
    fn records_are_timestamped_monotonically() {
        let mut recorder = TraceRecorder::new();
        recorder.state_entered("a");
        recorder.state_entered("b");

        let records = recorder.records();
        assert!(records[0].at <= records[1].at);
    }

    #[test]
    fn log_serializes_to_json() {
        let mut recorder = TraceRecorder::new();
        recorder.dispatched(Signal::new(5), "idle");

        let json = serde_json::to_string(recorder.records()).unwrap();
        assert!(json.contains("idle"));
    }
}
