//! Guard predicates and action functions.
//!
//! Guards are pure boolean functions over the machine context and the
//! triggering event; they decide whether a transition or branch is
//! enabled. Actions are the application-supplied entry/exit/effect
//! callbacks. Both are stored behind `Arc` so the static tables they
//! live in can be shared read-only across machine instances.

use super::event::Event;
use std::sync::Arc;

/// Entry/exit/effect callback: `(context, event)`.
///
/// Actions may have arbitrary side effects on the context but must not
/// call back into `dispatch` for the same machine instance.
pub type ActionFn<C, P> = Arc<dyn Fn(&mut C, &Event<P>) + Send + Sync>;

/// Pure predicate that determines whether a transition is enabled.
///
/// Guards are evaluated in declaration order and evaluation stops at the
/// first true guard, so a guard must never assume that every guard in its
/// table runs.
///
/// # Example
///
/// ```rust
/// use strata::core::{Event, Guard, Signal};
///
/// struct Counter {
///     count: u32,
/// }
///
/// let below_limit: Guard<Counter> = Guard::new(|c, _| c.count < 3);
///
/// assert!(below_limit.check(&Counter { count: 0 }, &Event::new(Signal::new(1))));
/// assert!(!below_limit.check(&Counter { count: 3 }, &Event::new(Signal::new(1))));
/// ```
pub struct Guard<C, P = ()> {
    predicate: Arc<dyn Fn(&C, &Event<P>) -> bool + Send + Sync>,
}

impl<C, P> Guard<C, P> {
    /// Create a guard from a predicate over `(context, event)`.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C, &Event<P>) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Evaluate the guard. No side effects.
    pub fn check(&self, context: &C, event: &Event<P>) -> bool {
        (self.predicate)(context, event)
    }
}

impl<C, P> Clone for Guard<C, P> {
    fn clone(&self) -> Self {
        Guard {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Signal;

    struct Ctx {
        armed: bool,
    }

    #[test]
    fn guard_reads_context() {
        let guard: Guard<Ctx> = Guard::new(|c, _| c.armed);
        let event = Event::new(Signal::new(1));

        assert!(guard.check(&Ctx { armed: true }, &event));
        assert!(!guard.check(&Ctx { armed: false }, &event));
    }

    #[test]
    fn guard_reads_event_signal() {
        let guard: Guard<Ctx> = Guard::new(|_, e| e.signal() == Signal::new(9));

        assert!(guard.check(&Ctx { armed: false }, &Event::new(Signal::new(9))));
        assert!(!guard.check(&Ctx { armed: false }, &Event::new(Signal::new(8))));
    }

    #[test]
    fn guard_reads_event_payload() {
        let guard: Guard<Ctx, u32> = Guard::new(|_, e| e.payload().copied().unwrap_or(0) > 10);

        assert!(guard.check(&Ctx { armed: false }, &Event::with_payload(Signal::new(1), 11)));
        assert!(!guard.check(&Ctx { armed: false }, &Event::new(Signal::new(1))));
    }

    #[test]
    fn guard_is_deterministic() {
        let guard: Guard<Ctx> = Guard::new(|c, _| c.armed);
        let ctx = Ctx { armed: true };
        let event = Event::new(Signal::new(2));

        assert_eq!(guard.check(&ctx, &event), guard.check(&ctx, &event));
    }

    #[test]
    fn guard_clones_share_the_predicate() {
        let guard: Guard<Ctx> = Guard::new(|c, _| c.armed);
        let copy = guard.clone();
        let event = Event::new(Signal::new(3));

        assert_eq!(
            guard.check(&Ctx { armed: true }, &event),
            copy.check(&Ctx { armed: true }, &event)
        );
    }
}
