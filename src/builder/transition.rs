//! Builders for transition and branch table rows.

use crate::builder::error::BuildError;
use crate::core::{Branch, Event, Guard, Signal, Transition, TransitionKind, Trigger, VertexId};
use std::sync::Arc;

/// Builder for one row of a state's transition table.
///
/// # Example
///
/// ```rust
/// use strata::builder::{TopologyBuilder, TransitionBuilder};
/// use strata::core::Signal;
///
/// const GO: Signal = Signal::new(1);
///
/// let mut t = TopologyBuilder::<u32>::new();
/// let idle = t.basic("idle", None);
/// let busy = t.basic("busy", None);
/// t.initial(idle);
/// t.transition(
///     TransitionBuilder::new()
///         .source(idle)
///         .on(GO)
///         .when(|count, _| *count < 10)
///         .effect(|count, _| *count += 1)
///         .target(busy),
/// )
/// .unwrap();
/// let topology = t.build().unwrap();
/// ```
pub struct TransitionBuilder<C, P = ()> {
    source: Option<VertexId>,
    trigger: Option<Trigger>,
    kind: TransitionKind,
    guard: Option<Guard<C, P>>,
    effect: Option<Arc<dyn Fn(&mut C, &Event<P>) + Send + Sync>>,
    target: Option<VertexId>,
}

impl<C, P> TransitionBuilder<C, P> {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self {
            source: None,
            trigger: None,
            kind: TransitionKind::External,
            guard: None,
            effect: None,
            target: None,
        }
    }

    /// Set the declaring state (required).
    pub fn source(mut self, state: VertexId) -> Self {
        self.source = Some(state);
        self
    }

    /// Trigger on a specific signal (required, or use
    /// [`on_any`](Self::on_any) / [`on_completion`](Self::on_completion)).
    pub fn on(mut self, signal: Signal) -> Self {
        self.trigger = Some(if signal == Signal::COMPLETION {
            Trigger::Completion
        } else {
            Trigger::On(signal)
        });
        self
    }

    /// Trigger on any dispatched signal.
    pub fn on_any(mut self) -> Self {
        self.trigger = Some(Trigger::Any);
        self
    }

    /// Trigger on the declaring state's region completing.
    pub fn on_completion(mut self) -> Self {
        self.trigger = Some(Trigger::Completion);
        self
    }

    /// Add a guard predicate from a closure (optional).
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&C, &Event<P>) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    /// Add a pre-built guard (optional).
    pub fn guard(mut self, guard: Guard<C, P>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Set the effect action (optional).
    pub fn effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(&mut C, &Event<P>) + Send + Sync + 'static,
    {
        self.effect = Some(Arc::new(effect));
        self
    }

    /// Set the target vertex (required for external transitions).
    pub fn target(mut self, vertex: VertexId) -> Self {
        self.target = Some(vertex);
        self
    }

    /// Mark the transition internal: only its effect runs, the state is
    /// never exited or entered. Takes no target.
    pub fn internal(mut self) -> Self {
        self.kind = TransitionKind::Internal;
        self
    }

    /// Mark the transition a self-loop: the state is fully exited and
    /// re-entered. Takes no target.
    pub fn loop_back(mut self) -> Self {
        self.kind = TransitionKind::Loop;
        self
    }

    pub(crate) fn finish(self) -> Result<(VertexId, Transition<C, P>), BuildError> {
        let source = self.source.ok_or(BuildError::MissingSource)?;
        let trigger = self.trigger.ok_or(BuildError::MissingTrigger)?;

        if let Trigger::On(signal) = trigger {
            if signal.is_reserved() {
                return Err(BuildError::ReservedSignal {
                    signal: signal.value(),
                });
            }
        }

        let target = match self.kind {
            TransitionKind::External => self.target.ok_or(BuildError::MissingTarget)?,
            // Internal and loop transitions stay on the declaring state.
            TransitionKind::Internal | TransitionKind::Loop => source,
        };

        Ok((
            source,
            Transition {
                trigger,
                kind: self.kind,
                guard: self.guard,
                effect: self.effect,
                target,
            },
        ))
    }
}

impl<C, P> Default for TransitionBuilder<C, P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for one outgoing branch of a choice or junction.
///
/// A branch built without a guard is the ELSE branch; it matches
/// unconditionally and must be the last branch of its table.
pub struct BranchBuilder<C, P = ()> {
    guard: Option<Guard<C, P>>,
    effect: Option<Arc<dyn Fn(&mut C, &Event<P>) + Send + Sync>>,
    target: Option<VertexId>,
}

impl<C, P> BranchBuilder<C, P> {
    /// Create a new branch builder.
    pub fn new() -> Self {
        Self {
            guard: None,
            effect: None,
            target: None,
        }
    }

    /// Add a guard predicate from a closure.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&C, &Event<P>) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    /// Add a pre-built guard.
    pub fn guard(mut self, guard: Guard<C, P>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Set the effect action (optional).
    pub fn effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(&mut C, &Event<P>) + Send + Sync + 'static,
    {
        self.effect = Some(Arc::new(effect));
        self
    }

    /// Set the branch target (required).
    pub fn target(mut self, vertex: VertexId) -> Self {
        self.target = Some(vertex);
        self
    }

    pub(crate) fn finish(self) -> Result<Branch<C, P>, BuildError> {
        let target = self.target.ok_or(BuildError::MissingBranchTarget)?;
        Ok(Branch {
            guard: self.guard,
            effect: self.effect,
            target,
        })
    }
}

impl<C, P> Default for BranchBuilder<C, P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Signal = Signal::new(1);

    #[test]
    fn builder_validates_missing_source() {
        let result = TransitionBuilder::<(), ()>::new().on(TICK).finish();
        assert!(matches!(result, Err(BuildError::MissingSource)));
    }

    #[test]
    fn builder_validates_missing_trigger() {
        let result = TransitionBuilder::<(), ()>::new()
            .source(VertexId(0))
            .target(VertexId(1))
            .finish();
        assert!(matches!(result, Err(BuildError::MissingTrigger)));
    }

    #[test]
    fn builder_validates_missing_target() {
        let result = TransitionBuilder::<(), ()>::new()
            .source(VertexId(0))
            .on(TICK)
            .finish();
        assert!(matches!(result, Err(BuildError::MissingTarget)));
    }

    #[test]
    fn creation_signal_is_rejected_as_trigger() {
        let result = TransitionBuilder::<(), ()>::new()
            .source(VertexId(0))
            .on(Signal::CREATION)
            .target(VertexId(1))
            .finish();
        assert!(matches!(result, Err(BuildError::ReservedSignal { .. })));
    }

    #[test]
    fn completion_signal_normalizes_to_completion_trigger() {
        let (_, transition) = TransitionBuilder::<(), ()>::new()
            .source(VertexId(0))
            .on(Signal::COMPLETION)
            .target(VertexId(1))
            .finish()
            .unwrap();
        assert_eq!(transition.trigger, Trigger::Completion);
    }

    #[test]
    fn internal_transitions_need_no_target() {
        let (source, transition) = TransitionBuilder::<(), ()>::new()
            .source(VertexId(3))
            .on(TICK)
            .internal()
            .finish()
            .unwrap();
        assert_eq!(source, VertexId(3));
        assert_eq!(transition.kind, TransitionKind::Internal);
        assert_eq!(transition.target, VertexId(3));
    }

    #[test]
    fn loop_transitions_stay_on_their_source() {
        let (_, transition) = TransitionBuilder::<(), ()>::new()
            .source(VertexId(2))
            .on(TICK)
            .loop_back()
            .finish()
            .unwrap();
        assert_eq!(transition.kind, TransitionKind::Loop);
        assert_eq!(transition.target, VertexId(2));
    }

    #[test]
    fn branch_without_guard_is_else() {
        let branch = BranchBuilder::<(), ()>::new()
            .target(VertexId(1))
            .finish()
            .unwrap();
        assert!(branch.guard.is_none());
    }

    #[test]
    fn branch_requires_a_target() {
        let result = BranchBuilder::<(), ()>::new()
            .when(|_: &(), _| true)
            .finish();
        assert!(matches!(result, Err(BuildError::MissingBranchTarget)));
    }
}
