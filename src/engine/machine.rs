//! Machine instances.

use crate::core::{Event, Topology, VertexId};
use crate::engine::DispatchOutcome;
use crate::trace::{NoopTracer, Tracer};
use std::sync::Arc;
use uuid::Uuid;

/// One running instance of a topology.
///
/// The topology is shared read-only; the instance owns the only mutable
/// state the resolver touches: the current leaf vertex, one cell per
/// history vertex, and one cell per submachine region. Dispatch takes
/// `&mut self`, so re-entrant dispatch on the same instance is ruled
/// out at compile time; serializing dispatch across threads is the
/// caller's (scheduler's) concern.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use strata::builder::{TopologyBuilder, TransitionBuilder};
/// use strata::core::{Event, Signal};
/// use strata::engine::{DispatchOutcome, Machine};
///
/// const KICK: Signal = Signal::new(1);
///
/// let mut t = TopologyBuilder::<u32>::new();
/// let idle = t.basic("idle", None);
/// let busy = t.basic("busy", None);
/// t.initial(idle);
/// t.transition(
///     TransitionBuilder::new()
///         .source(idle)
///         .on(KICK)
///         .effect(|count, _| *count += 1)
///         .target(busy),
/// )
/// .unwrap();
/// let topology = Arc::new(t.build().unwrap());
///
/// let mut machine = Machine::new(topology, 0u32);
/// machine.init();
/// assert_eq!(machine.current_state(), Some(idle));
///
/// let outcome = machine.dispatch(&Event::new(KICK));
/// assert_eq!(outcome, DispatchOutcome::Processed);
/// assert_eq!(machine.current_state(), Some(busy));
/// assert_eq!(*machine.context(), 1);
/// ```
pub struct Machine<C, P = (), T = NoopTracer> {
    pub(crate) topology: Arc<Topology<C, P>>,
    pub(crate) id: Uuid,
    pub(crate) context: C,
    pub(crate) current: Option<VertexId>,
    pub(crate) history: Vec<Option<VertexId>>,
    pub(crate) active_refs: Vec<Option<VertexId>>,
    pub(crate) tracer: T,
}

impl<C, P> Machine<C, P, NoopTracer> {
    /// Create an uninitialized instance with no tracing.
    pub fn new(topology: Arc<Topology<C, P>>, context: C) -> Self {
        Self::with_tracer(topology, context, NoopTracer)
    }
}

impl<C, P, T: Tracer> Machine<C, P, T> {
    /// Create an uninitialized instance that reports to `tracer`.
    pub fn with_tracer(topology: Arc<Topology<C, P>>, context: C, tracer: T) -> Self {
        let history = vec![None; topology.history_slots];
        let active_refs = vec![None; topology.region_slots];
        Machine {
            topology,
            id: Uuid::new_v4(),
            context,
            current: None,
            history,
            active_refs,
            tracer,
        }
    }

    /// This instance's identity, used for trace and snapshot
    /// attribution only.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The shared topology.
    pub fn topology(&self) -> &Topology<C, P> {
        &self.topology
    }

    /// The instance's application context.
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Mutable access to the application context.
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// The tracer this instance reports to.
    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    /// Mutable access to the tracer.
    pub fn tracer_mut(&mut self) -> &mut T {
        &mut self.tracer
    }

    /// The current leaf vertex; `None` until [`init`](Self::init) runs.
    ///
    /// Between dispatches this is always a basic or final state, never
    /// a pseudostate.
    pub fn current_state(&self) -> Option<VertexId> {
        self.current
    }

    /// The current leaf vertex's name.
    pub fn current_state_name(&self) -> Option<&'static str> {
        self.current.map(|v| self.topology.name_of(v))
    }

    /// Whether the machine rests in a final state.
    pub fn is_final(&self) -> bool {
        self.current.map(|v| self.topology.is_final(v)).unwrap_or(false)
    }

    /// Drive the machine from uninitialized to its first stable leaf
    /// configuration, expanding default-child and pseudostate chains
    /// from the configured initial vertex. Guards and effects on the
    /// initial chain see the reserved creation event. A completion
    /// cascade may follow immediately.
    ///
    /// Call exactly once, before any dispatch.
    ///
    /// # Panics
    ///
    /// Panics if called twice, or if the initial chain exceeds the
    /// depth ceiling.
    pub fn init(&mut self) {
        if self.current.is_some() {
            panic!("strata: machine initialized twice");
        }
        let topology = Arc::clone(&self.topology);
        self.tracer.initialized(topology.name_of(topology.initial()));
        let event = Event::creation();
        let first = self.creation_step(&topology, &event);
        let _ = self.settle(&topology, first);
    }

    /// Dispatch one event, resolving the compound transition it
    /// triggers (if any) and any completion cascade that follows.
    ///
    /// The call is synchronous and runs to a stable configuration
    /// before returning; actions invoked from it must not dispatch to
    /// this instance again.
    ///
    /// # Panics
    ///
    /// Panics if the machine was never initialized, or if resolution
    /// exceeds the depth ceiling (a static-table defect, never a
    /// run-time condition).
    pub fn dispatch(&mut self, event: &Event<P>) -> DispatchOutcome {
        if self.current.is_none() {
            panic!("strata: dispatch called before init");
        }
        let topology = Arc::clone(&self.topology);
        let first = self.step(&topology, event);
        self.settle(&topology, first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{TopologyBuilder, TransitionBuilder};
    use crate::core::Signal;

    const GO: Signal = Signal::new(1);
    const NOP: Signal = Signal::new(2);

    fn two_state_topology() -> (Arc<Topology<Vec<String>>>, VertexId, VertexId) {
        let mut t = TopologyBuilder::<Vec<String>>::new();
        let a = t.basic("a", None);
        let b = t.basic("b", None);
        t.initial(a);
        t.transition(TransitionBuilder::new().source(a).on(GO).target(b))
            .unwrap();
        (Arc::new(t.build().unwrap()), a, b)
    }

    #[test]
    fn init_enters_the_initial_state() {
        let (topology, a, _) = two_state_topology();
        let mut machine = Machine::new(topology, Vec::new());
        assert_eq!(machine.current_state(), None);

        machine.init();
        assert_eq!(machine.current_state(), Some(a));
        assert_eq!(machine.current_state_name(), Some("a"));
    }

    #[test]
    fn dispatch_moves_between_states() {
        let (topology, _, b) = two_state_topology();
        let mut machine = Machine::new(topology, Vec::new());
        machine.init();

        assert_eq!(machine.dispatch(&Event::new(GO)), DispatchOutcome::Processed);
        assert_eq!(machine.current_state(), Some(b));
    }

    #[test]
    fn unmatched_events_are_reported_not_fatal() {
        let (topology, a, _) = two_state_topology();
        let mut machine = Machine::new(topology, Vec::new());
        machine.init();

        assert_eq!(machine.dispatch(&Event::new(NOP)), DispatchOutcome::NotFound);
        assert_eq!(machine.current_state(), Some(a));
    }

    #[test]
    #[should_panic(expected = "before init")]
    fn dispatch_before_init_panics() {
        let (topology, _, _) = two_state_topology();
        let mut machine = Machine::new(topology, Vec::new());
        machine.dispatch(&Event::new(GO));
    }

    #[test]
    #[should_panic(expected = "initialized twice")]
    fn double_init_panics() {
        let (topology, _, _) = two_state_topology();
        let mut machine = Machine::new(topology, Vec::new());
        machine.init();
        machine.init();
    }

    #[test]
    fn instances_have_distinct_ids() {
        let (topology, _, _) = two_state_topology();
        let m1 = Machine::new(Arc::clone(&topology), Vec::new());
        let m2 = Machine::new(topology, Vec::new());
        assert_ne!(m1.id(), m2.id());
    }

    #[test]
    fn instances_do_not_share_mutable_state() {
        let (topology, a, b) = two_state_topology();
        let mut m1 = Machine::new(Arc::clone(&topology), Vec::new());
        let mut m2 = Machine::new(topology, Vec::new());
        m1.init();
        m2.init();

        m1.dispatch(&Event::new(GO));
        assert_eq!(m1.current_state(), Some(b));
        assert_eq!(m2.current_state(), Some(a));
    }

    #[test]
    fn is_final_reflects_the_current_leaf() {
        let mut t = TopologyBuilder::<()>::new();
        let a = t.basic("a", None);
        let end = t.final_state("end", None);
        t.initial(a);
        t.transition(TransitionBuilder::new().source(a).on(GO).target(end))
            .unwrap();
        let mut machine = Machine::new(Arc::new(t.build().unwrap()), ());
        machine.init();
        assert!(!machine.is_final());

        machine.dispatch(&Event::new(GO));
        assert!(machine.is_final());
    }

    #[test]
    fn context_is_reachable_from_outside() {
        let (topology, _, _) = two_state_topology();
        let mut machine = Machine::new(topology, Vec::new());
        machine.context_mut().push("external".to_string());
        assert_eq!(machine.context().len(), 1);
    }
}
