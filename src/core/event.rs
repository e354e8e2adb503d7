//! Signals and events.
//!
//! A signal is a small integer drawn from a closed, compile-time-known
//! set. Two values at the top of the signal space are reserved: the
//! completion signal, synthesized by the engine when a region finishes,
//! and the creation signal, supplied to guards and effects while a
//! machine enters its initial configuration. Neither may be posted
//! externally.

use serde::{Deserialize, Serialize};

/// Identifier of an event within a machine's signal space.
///
/// # Example
///
/// ```rust
/// use strata::core::Signal;
///
/// const POWER_ON: Signal = Signal::new(1);
/// const POWER_OFF: Signal = Signal::new(2);
///
/// assert_ne!(POWER_ON, POWER_OFF);
/// assert!(!POWER_ON.is_reserved());
/// assert!(Signal::COMPLETION.is_reserved());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Signal(u16);

impl Signal {
    /// Synthesized when a region completes; never posted externally.
    pub const COMPLETION: Signal = Signal(u16::MAX);

    /// Carried by the pseudo-event dispatched during initialization.
    pub const CREATION: Signal = Signal(u16::MAX - 1);

    /// Create a signal from its raw value.
    pub const fn new(value: u16) -> Self {
        Signal(value)
    }

    /// The raw signal value.
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Whether this is one of the engine-reserved signals.
    pub const fn is_reserved(self) -> bool {
        self.0 >= Self::CREATION.0
    }
}

/// A dispatched event: a signal plus an optional machine-agnostic payload.
///
/// The payload type is a crate-level generic (default `()`); the engine
/// never inspects it, only hands it through to guards and effects.
///
/// # Example
///
/// ```rust
/// use strata::core::{Event, Signal};
///
/// let plain: Event = Event::new(Signal::new(7));
/// assert!(plain.payload().is_none());
///
/// let keyed = Event::with_payload(Signal::new(8), 42u32);
/// assert_eq!(keyed.payload(), Some(&42));
/// ```
#[derive(Clone, Debug)]
pub struct Event<P = ()> {
    signal: Signal,
    payload: Option<P>,
}

impl<P> Event<P> {
    /// An event with no payload.
    pub fn new(signal: Signal) -> Self {
        Event {
            signal,
            payload: None,
        }
    }

    /// An event carrying a payload.
    pub fn with_payload(signal: Signal, payload: P) -> Self {
        Event {
            signal,
            payload: Some(payload),
        }
    }

    /// The event's signal.
    pub fn signal(&self) -> Signal {
        self.signal
    }

    /// The event's payload, if any.
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    pub(crate) fn completion() -> Self {
        Event::new(Signal::COMPLETION)
    }

    pub(crate) fn creation() -> Self {
        Event::new(Signal::CREATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_signals_sit_at_the_top_of_the_space() {
        assert!(Signal::COMPLETION.is_reserved());
        assert!(Signal::CREATION.is_reserved());
        assert!(!Signal::new(0).is_reserved());
        assert!(!Signal::new(1000).is_reserved());
    }

    #[test]
    fn reserved_signals_are_distinct() {
        assert_ne!(Signal::COMPLETION, Signal::CREATION);
    }

    #[test]
    fn event_exposes_signal_and_payload() {
        let event = Event::with_payload(Signal::new(3), "door");
        assert_eq!(event.signal(), Signal::new(3));
        assert_eq!(event.payload(), Some(&"door"));

        let bare: Event = Event::new(Signal::new(3));
        assert!(bare.payload().is_none());
    }

    #[test]
    fn synthesized_events_carry_reserved_signals() {
        let completion: Event = Event::completion();
        let creation: Event = Event::creation();
        assert_eq!(completion.signal(), Signal::COMPLETION);
        assert_eq!(creation.signal(), Signal::CREATION);
    }

    #[test]
    fn signal_serializes_correctly() {
        let signal = Signal::new(17);
        let json = serde_json::to_string(&signal).unwrap();
        let back: Signal = serde_json::from_str(&json).unwrap();
        assert_eq!(signal, back);
    }
}
