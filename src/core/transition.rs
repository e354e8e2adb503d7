//! Transition and branch table entries.
//!
//! Tables are immutable after build, statically associated with their
//! declaring vertex, and shared read-only across all instances of a
//! topology. They are scanned in declaration order and the first entry
//! whose trigger matches and whose guard passes wins.

use super::event::Signal;
use super::guard::{ActionFn, Guard};
use super::vertex::VertexId;

/// What fires a transition.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Trigger {
    /// A specific external signal.
    On(Signal),
    /// Matches any dispatched signal.
    Any,
    /// The synthesized completion event of the declaring state's region.
    Completion,
}

impl Trigger {
    /// Syntactic match against a dispatched signal, before guards run.
    pub(crate) fn matches(self, signal: Signal) -> bool {
        match self {
            Trigger::On(s) => s == signal,
            Trigger::Any => true,
            Trigger::Completion => signal == Signal::COMPLETION,
        }
    }
}

/// How a transition relates to its declaring state.
///
/// The distinction is an explicit field rather than an inference from
/// target identity: an `Internal` transition runs only its effect and
/// never exits or enters anything, while a `Loop` always exits and
/// re-enters its state.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TransitionKind {
    #[default]
    External,
    Internal,
    Loop,
}

/// One row of a state's transition table.
pub struct Transition<C, P = ()> {
    pub(crate) trigger: Trigger,
    pub(crate) kind: TransitionKind,
    pub(crate) guard: Option<Guard<C, P>>,
    pub(crate) effect: Option<ActionFn<C, P>>,
    pub(crate) target: VertexId,
}

impl<C, P> Clone for Transition<C, P> {
    fn clone(&self) -> Self {
        Transition {
            trigger: self.trigger,
            kind: self.kind,
            guard: self.guard.clone(),
            effect: self.effect.clone(),
            target: self.target,
        }
    }
}

/// One outgoing edge of a choice or junction pseudostate.
///
/// A branch without a guard is the ELSE branch: it matches
/// unconditionally and must be the last entry of its table.
pub struct Branch<C, P = ()> {
    pub(crate) guard: Option<Guard<C, P>>,
    pub(crate) effect: Option<ActionFn<C, P>>,
    pub(crate) target: VertexId,
}

impl<C, P> Clone for Branch<C, P> {
    fn clone(&self) -> Self {
        Branch {
            guard: self.guard.clone(),
            effect: self.effect.clone(),
            target: self.target,
        }
    }
}

/// Continuation taken when a region's exit point is reached through a
/// particular submachine reference.
pub struct ExitConnection<C, P = ()> {
    pub(crate) effect: Option<ActionFn<C, P>>,
    pub(crate) target: VertexId,
}

impl<C, P> Clone for ExitConnection<C, P> {
    fn clone(&self) -> Self {
        ExitConnection {
            effect: self.effect.clone(),
            target: self.target,
        }
    }
}
