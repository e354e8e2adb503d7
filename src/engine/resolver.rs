//! Compound-transition resolution.
//!
//! One dispatch resolves as follows: select the firing transition by
//! walking the active configuration leaf-upward (first matching trigger
//! with a passing guard wins), find the least common ancestor of the
//! declaring state and the target, exit leaf-to-LCA (recording history
//! on the way out), run the transition effect, then enter LCA-to-target
//! ancestor-first, expanding default children, substituting history,
//! and evaluating choice/junction branches segment by segment until a
//! stable leaf is reached. Completion events cascade from there.
//!
//! Every walk is an explicit loop checked against the topology's depth
//! ceiling; a malformed table panics deterministically instead of
//! recursing without bound.

use crate::core::{ActionFn, Event, Topology, TransitionKind, Trigger, VertexId, VertexKind};
use crate::engine::machine::Machine;
use crate::engine::DispatchOutcome;
use crate::trace::Tracer;

/// Outcome of one resolution step, before completion cascading.
pub(crate) enum Step {
    Processed { completion: bool },
    NotFound,
    ConditionNotFound,
}

impl<C, P, T: Tracer> Machine<C, P, T> {
    /// Resolve one external or synthesized event against the current
    /// configuration.
    pub(crate) fn step(&mut self, topology: &Topology<C, P>, event: &Event<P>) -> Step {
        let leaf = match self.current {
            Some(leaf) => leaf,
            None => panic!("strata: dispatch called before init"),
        };
        self.tracer.dispatched(event.signal(), topology.name_of(leaf));

        // Select the firing transition, walking the active
        // configuration from the leaf upward.
        let mut level = 0usize;
        let mut scan = Some(leaf);
        let (declaring, transition) = loop {
            let vertex = match scan {
                Some(v) => v,
                None => {
                    self.tracer.event_not_found(event.signal());
                    return Step::NotFound;
                }
            };
            if level > topology.max_depth() {
                self.fatal("transition lookup walked past the depth ceiling");
            }
            let mut selected = None;
            for row in &topology.vertex(vertex).transitions {
                if !row.trigger.matches(event.signal()) {
                    continue;
                }
                match &row.guard {
                    Some(guard) if !guard.check(&self.context, event) => {
                        self.tracer.guard_rejected(topology.name_of(vertex));
                    }
                    _ => {
                        selected = Some(row);
                        break;
                    }
                }
            }
            if let Some(row) = selected {
                break (vertex, row);
            }
            scan = self.effective_parent(topology, vertex);
            level += 1;
        };

        // An internal transition runs only its effect; the
        // configuration is untouched.
        if transition.kind == TransitionKind::Internal {
            if let Some(effect) = &transition.effect {
                (effect)(&mut self.context, event);
            }
            return Step::Processed { completion: false };
        }

        // Exit points redirect the transition out of their region
        // before the exit set is computed.
        let mut target = transition.target;
        let mut continuations: Vec<ActionFn<C, P>> = Vec::new();
        let mut hops = 0usize;
        while let VertexKind::ExitPoint { region, index } = topology.kind(target) {
            hops += 1;
            if hops > topology.max_depth() {
                self.fatal("exit point chain exceeded the depth ceiling");
            }
            let (effect, outer) = self.exit_connection(topology, region, index);
            if let Some(e) = effect {
                continuations.push(e);
            }
            target = outer;
        }

        let lca = self.lca(topology, declaring, target);
        self.exit_to(topology, lca, event);

        if let Some(effect) = &transition.effect {
            (effect)(&mut self.context, event);
        }
        for effect in &continuations {
            (effect)(&mut self.context, event);
        }

        self.descend(topology, event, lca, target)
    }

    /// Resolve the virtual creation transition: no exits, the
    /// topology's initial effect, then entry from the root.
    pub(crate) fn creation_step(&mut self, topology: &Topology<C, P>, event: &Event<P>) -> Step {
        if let Some(effect) = &topology.initial_effect {
            (effect)(&mut self.context, event);
        }
        self.descend(topology, event, None, topology.initial())
    }

    /// Run completion cascades until the machine is stable, counting
    /// each cascade against the depth ceiling.
    pub(crate) fn settle(&mut self, topology: &Topology<C, P>, first: Step) -> DispatchOutcome {
        let mut step = first;
        let mut cascaded = false;
        let mut cascades = 0usize;
        loop {
            match step {
                Step::NotFound => {
                    // A cascade with no handler is a normal end; the
                    // original event was still processed.
                    return if cascaded {
                        DispatchOutcome::Processed
                    } else {
                        DispatchOutcome::NotFound
                    };
                }
                Step::ConditionNotFound => return DispatchOutcome::ConditionNotFound,
                Step::Processed { completion: false } => return DispatchOutcome::Processed,
                Step::Processed { completion: true } => {
                    cascades += 1;
                    if cascades > topology.max_depth() {
                        self.fatal("completion cascade exceeded the depth ceiling");
                    }
                    if let Some(leaf) = self.current {
                        self.tracer.completion_synthesized(topology.name_of(leaf));
                    }
                    cascaded = true;
                    let event = Event::completion();
                    step = self.step(topology, &event);
                }
            }
        }
    }

    /// Enter from `frontier` (exclusive) toward `target`, expanding
    /// default chains and pseudostates until a stable leaf is reached.
    fn descend(
        &mut self,
        topology: &Topology<C, P>,
        event: &Event<P>,
        mut frontier: Option<VertexId>,
        mut target: VertexId,
    ) -> Step {
        let mut segments = 0usize;
        loop {
            match topology.kind(target) {
                VertexKind::Basic | VertexKind::Final => {
                    self.enter_chain(topology, frontier, target, true, event);
                    self.current = Some(target);
                    let completion = topology.is_final(target)
                        || topology
                            .vertex(target)
                            .transitions
                            .iter()
                            .any(|t| t.trigger == Trigger::Completion);
                    return Step::Processed { completion };
                }
                VertexKind::Composite { default_child, .. } => {
                    self.enter_chain(topology, frontier, target, true, event);
                    if let Some(effect) = &topology.vertex(target).forward_effect {
                        (effect)(&mut self.context, event);
                    }
                    frontier = Some(target);
                    target = default_child;
                }
                VertexKind::Submachine { region } => {
                    self.enter_chain(topology, frontier, target, true, event);
                    if let Some(effect) = &topology.vertex(region).forward_effect {
                        (effect)(&mut self.context, event);
                    }
                    let default_child = match topology.kind(region) {
                        VertexKind::SubmachineRegion { default_child, .. } => default_child,
                        _ => panic!("strata: submachine reference without a region"),
                    };
                    frontier = Some(target);
                    target = default_child;
                }
                VertexKind::Choice | VertexKind::Junction => {
                    self.enter_chain(topology, frontier, target, false, event);
                    self.bump_segment(topology, &mut segments, target);
                    let name = topology.name_of(target);
                    let mut selected = None;
                    for branch in &topology.vertex(target).branches {
                        match &branch.guard {
                            Some(guard) if !guard.check(&self.context, event) => {
                                self.tracer.guard_rejected(name);
                            }
                            _ => {
                                selected = Some(branch);
                                break;
                            }
                        }
                    }
                    let branch = match selected {
                        Some(b) => b,
                        None => {
                            self.tracer.condition_not_found(name);
                            return Step::ConditionNotFound;
                        }
                    };
                    if let Some(effect) = &branch.effect {
                        (effect)(&mut self.context, event);
                    }
                    // Inner segments never exit: only entry continues.
                    frontier = self.lca(topology, target, branch.target);
                    target = branch.target;
                }
                VertexKind::ShallowHistory {
                    owner,
                    slot,
                    default,
                }
                | VertexKind::DeepHistory {
                    owner,
                    slot,
                    default,
                } => {
                    self.enter_chain(topology, frontier, target, false, event);
                    self.bump_segment(topology, &mut segments, target);
                    match self.history[slot] {
                        Some(recorded) => target = recorded,
                        None => match default {
                            Some(fallback) => {
                                if let Some(effect) = &topology.vertex(target).forward_effect {
                                    (effect)(&mut self.context, event);
                                }
                                target = fallback;
                            }
                            // No record and no configured default:
                            // the owner's default chain applies.
                            None => target = owner,
                        },
                    }
                    frontier = Some(owner);
                }
                VertexKind::EntryPoint { target: inner } => {
                    self.enter_chain(topology, frontier, target, false, event);
                    self.bump_segment(topology, &mut segments, target);
                    if let Some(effect) = &topology.vertex(target).forward_effect {
                        (effect)(&mut self.context, event);
                    }
                    // The entry point's parent is the referencing
                    // submachine state, just entered above.
                    frontier = topology.parent_of(target);
                    target = inner;
                }
                VertexKind::ExitPoint { region, index } => {
                    self.enter_chain(topology, frontier, target, false, event);
                    self.bump_segment(topology, &mut segments, target);
                    let (effect, outer) = self.exit_connection(topology, region, index);
                    if let Some(e) = effect {
                        (e)(&mut self.context, event);
                    }
                    frontier = self.lca(topology, target, outer);
                    target = outer;
                }
                VertexKind::SubmachineRegion { .. } => {
                    panic!("strata: a submachine region cannot be entered directly");
                }
            }
        }
    }

    fn bump_segment(&mut self, topology: &Topology<C, P>, segments: &mut usize, at: VertexId) {
        *segments += 1;
        if *segments > topology.max_depth() {
            self.fatal("pseudostate segments exceeded the depth ceiling");
        }
        self.tracer.segment(*segments, topology.name_of(at));
    }

    /// Enter every vertex from `frontier` (exclusive) down to `target`,
    /// ancestor-first. Pseudostate targets are skipped when
    /// `include_target` is false; they have no entry actions.
    fn enter_chain(
        &mut self,
        topology: &Topology<C, P>,
        frontier: Option<VertexId>,
        target: VertexId,
        include_target: bool,
        event: &Event<P>,
    ) {
        let path = self.entry_path(topology, frontier, target);
        let count = if include_target {
            path.len()
        } else {
            path.len().saturating_sub(1)
        };
        for &vertex in &path[..count] {
            self.enter_vertex(topology, vertex, event);
        }
    }

    fn entry_path(
        &mut self,
        topology: &Topology<C, P>,
        frontier: Option<VertexId>,
        target: VertexId,
    ) -> Vec<VertexId> {
        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(vertex) = cursor {
            if Some(vertex) == frontier {
                break;
            }
            path.push(vertex);
            if path.len() > topology.max_depth() {
                self.fatal("entry path exceeded the depth ceiling");
            }
            cursor = self.effective_parent(topology, vertex);
        }
        path.reverse();
        path
    }

    fn enter_vertex(&mut self, topology: &Topology<C, P>, vertex: VertexId, event: &Event<P>) {
        // Entering a submachine state activates its region for every
        // later walk out of it.
        if let VertexKind::Submachine { region } = topology.kind(vertex) {
            if let VertexKind::SubmachineRegion { slot, .. } = topology.kind(region) {
                self.active_refs[slot] = Some(vertex);
            }
        }
        if let Some(action) = &topology.vertex(vertex).entry {
            (action)(&mut self.context, event);
        }
        self.tracer.state_entered(topology.name_of(vertex));
    }

    /// Exit from the current leaf up to `lca` (exclusive), leaf-first,
    /// recording shallow history at each level left and deep history
    /// for the leaf actually being abandoned.
    fn exit_to(&mut self, topology: &Topology<C, P>, lca: Option<VertexId>, event: &Event<P>) {
        let mut cursor = match self.current {
            Some(leaf) => leaf,
            None => return,
        };
        self.write_deep_history(topology, cursor);
        let mut exited = 0usize;
        while Some(cursor) != lca {
            if exited > topology.max_depth() {
                self.fatal("exit path exceeded the depth ceiling");
            }
            if let Some(action) = &topology.vertex(cursor).exit {
                (action)(&mut self.context, event);
            }
            if let Some(parent) = self.effective_parent(topology, cursor) {
                if let VertexKind::Composite {
                    history: Some(h), ..
                } = topology.kind(parent)
                {
                    if let VertexKind::ShallowHistory { slot, .. } = topology.kind(h) {
                        self.history[slot] = Some(cursor);
                    }
                }
            }
            self.tracer.state_exited(topology.name_of(cursor));
            exited += 1;
            match self.effective_parent(topology, cursor) {
                Some(parent) => cursor = parent,
                None => break,
            }
        }
    }

    fn write_deep_history(&mut self, topology: &Topology<C, P>, leaf: VertexId) {
        let mut levels = 0usize;
        let mut up = self.effective_parent(topology, leaf);
        while let Some(ancestor) = up {
            if levels > topology.max_depth() {
                self.fatal("ancestor walk exceeded the depth ceiling");
            }
            if let VertexKind::Composite {
                history: Some(h), ..
            } = topology.kind(ancestor)
            {
                if let VertexKind::DeepHistory { slot, .. } = topology.kind(h) {
                    self.history[slot] = Some(leaf);
                }
            }
            levels += 1;
            up = self.effective_parent(topology, ancestor);
        }
    }

    /// Least common ancestor of two vertices, treating a vertex as its
    /// own ancestor. A self-pair resolves to the vertex's parent, which
    /// turns a self-transition into a full exit and re-entry.
    fn lca(&mut self, topology: &Topology<C, P>, a: VertexId, b: VertexId) -> Option<VertexId> {
        if a == b {
            return self.effective_parent(topology, a);
        }
        let mut b_chain = Vec::new();
        let mut cursor = Some(b);
        while let Some(vertex) = cursor {
            b_chain.push(vertex);
            if b_chain.len() > topology.max_depth() {
                self.fatal("ancestor chain exceeded the depth ceiling");
            }
            cursor = self.effective_parent(topology, vertex);
        }
        let mut cursor = Some(a);
        let mut levels = 0usize;
        while let Some(vertex) = cursor {
            if b_chain.contains(&vertex) {
                return Some(vertex);
            }
            levels += 1;
            if levels > topology.max_depth() {
                self.fatal("ancestor chain exceeded the depth ceiling");
            }
            cursor = self.effective_parent(topology, vertex);
        }
        None
    }

    /// The run-time parent: walks out of a submachine region through
    /// the referencing state recorded by the instance.
    pub(crate) fn effective_parent(
        &self,
        topology: &Topology<C, P>,
        vertex: VertexId,
    ) -> Option<VertexId> {
        let parent = topology.parent_of(vertex)?;
        match topology.kind(parent) {
            VertexKind::SubmachineRegion { slot, .. } => self.active_refs[slot],
            _ => Some(parent),
        }
    }

    fn exit_connection(
        &mut self,
        topology: &Topology<C, P>,
        region: VertexId,
        index: usize,
    ) -> (Option<ActionFn<C, P>>, VertexId) {
        let slot = match topology.kind(region) {
            VertexKind::SubmachineRegion { slot, .. } => slot,
            _ => panic!("strata: exit point outside a submachine region"),
        };
        let active = match self.active_refs[slot] {
            Some(active) => active,
            None => panic!(
                "strata: exit point of '{}' reached while the region is inactive",
                topology.name_of(region)
            ),
        };
        match topology
            .vertex(active)
            .exit_connections
            .get(index)
            .and_then(|c| c.as_ref())
        {
            Some(connection) => (connection.effect.clone(), connection.target),
            None => panic!(
                "strata: '{}' has no connection for exit point {index}",
                topology.name_of(active)
            ),
        }
    }

    pub(crate) fn fatal(&mut self, detail: &'static str) -> ! {
        self.tracer.depth_exceeded(detail);
        panic!("strata: exceeded hierarchical level: {detail}");
    }
}
