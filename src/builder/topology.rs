//! Builder for state topologies.
//!
//! Vertices are declared first (each declaration returns the new
//! vertex's id), then wired together: default children, transitions,
//! branches, history defaults, submachine connections. `build()`
//! validates the whole graph and freezes it into an immutable
//! [`Topology`]; every malformed-table condition the resolver would
//! otherwise hit at dispatch time is reported here as a [`BuildError`].

use crate::builder::error::BuildError;
use crate::builder::transition::{BranchBuilder, TransitionBuilder};
use crate::core::{
    ActionFn, Branch, Event, ExitConnection, Topology, Transition, VertexId, DEFAULT_MAX_DEPTH,
};
use crate::core::{Vertex, VertexKind};
use std::sync::Arc;

#[derive(Clone, Copy)]
enum DraftKind {
    Basic,
    Final,
    Choice,
    Junction,
    Composite {
        default_child: Option<VertexId>,
        history: Option<VertexId>,
    },
    ShallowHistory {
        owner: VertexId,
        slot: usize,
        default: Option<VertexId>,
    },
    DeepHistory {
        owner: VertexId,
        slot: usize,
        default: Option<VertexId>,
    },
    EntryPoint {
        target: VertexId,
    },
    ExitPoint {
        region: VertexId,
        index: usize,
    },
    Submachine {
        region: VertexId,
    },
    SubmachineRegion {
        default_child: Option<VertexId>,
        slot: usize,
        exit_points: usize,
    },
}

struct DraftVertex<C, P> {
    name: &'static str,
    parent: Option<VertexId>,
    kind: DraftKind,
    entry: Option<ActionFn<C, P>>,
    exit: Option<ActionFn<C, P>>,
    forward_effect: Option<ActionFn<C, P>>,
    transitions: Vec<Transition<C, P>>,
    branches: Vec<Branch<C, P>>,
    exit_connections: Vec<Option<ExitConnection<C, P>>>,
}

/// Builder for a [`Topology`].
///
/// # Example
///
/// ```rust
/// use strata::builder::{TopologyBuilder, TransitionBuilder};
/// use strata::core::Signal;
///
/// const OPEN: Signal = Signal::new(1);
///
/// let mut t = TopologyBuilder::<()>::new();
/// let closed = t.basic("closed", None);
/// let opened = t.composite("opened", None);
/// let ajar = t.basic("ajar", Some(opened));
/// t.default_child(opened, ajar);
/// t.initial(closed);
/// t.transition(
///     TransitionBuilder::new()
///         .source(closed)
///         .on(OPEN)
///         .target(opened),
/// )
/// .unwrap();
///
/// let topology = t.build().unwrap();
/// assert_eq!(topology.initial(), closed);
/// ```
pub struct TopologyBuilder<C, P = ()> {
    vertices: Vec<DraftVertex<C, P>>,
    initial: Option<VertexId>,
    initial_effect: Option<ActionFn<C, P>>,
    max_depth: usize,
    history_slots: usize,
    region_slots: usize,
    defects: Vec<BuildError>,
}

impl<C, P> TopologyBuilder<C, P> {
    /// Create an empty builder with the default depth ceiling.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            initial: None,
            initial_effect: None,
            max_depth: DEFAULT_MAX_DEPTH,
            history_slots: 0,
            region_slots: 0,
            defects: Vec::new(),
        }
    }

    /// Override the hierarchical-depth ceiling for this topology.
    ///
    /// The ceiling bounds nesting depth, pseudostate segments per
    /// compound transition, and completion cascades per dispatch.
    pub fn max_depth(&mut self, depth: usize) -> &mut Self {
        self.max_depth = depth;
        self
    }

    /// Declare a simple state.
    pub fn basic(&mut self, name: &'static str, parent: Option<VertexId>) -> VertexId {
        self.check_container(parent, name);
        self.push(name, parent, DraftKind::Basic)
    }

    /// Declare a composite state. Wire its region with
    /// [`default_child`](Self::default_child) before building.
    pub fn composite(&mut self, name: &'static str, parent: Option<VertexId>) -> VertexId {
        self.check_container(parent, name);
        self.push(
            name,
            parent,
            DraftKind::Composite {
                default_child: None,
                history: None,
            },
        )
    }

    /// Declare a final state for the enclosing region.
    pub fn final_state(&mut self, name: &'static str, parent: Option<VertexId>) -> VertexId {
        self.check_container(parent, name);
        self.push(name, parent, DraftKind::Final)
    }

    /// Declare a choice pseudostate. Wire it with
    /// [`branch`](Self::branch) / [`otherwise`](Self::otherwise).
    pub fn choice(&mut self, name: &'static str, parent: Option<VertexId>) -> VertexId {
        self.check_container(parent, name);
        self.push(name, parent, DraftKind::Choice)
    }

    /// Declare a junction pseudostate.
    pub fn junction(&mut self, name: &'static str, parent: Option<VertexId>) -> VertexId {
        self.check_container(parent, name);
        self.push(name, parent, DraftKind::Junction)
    }

    /// Declare the shallow-history vertex of `owner`'s region.
    pub fn shallow_history(&mut self, name: &'static str, owner: VertexId) -> VertexId {
        let slot = self.claim_history_slot(name, owner);
        let id = self.push(
            name,
            Some(owner),
            DraftKind::ShallowHistory {
                owner,
                slot,
                default: None,
            },
        );
        self.register_history(owner, id);
        id
    }

    /// Declare the deep-history vertex of `owner`'s region.
    pub fn deep_history(&mut self, name: &'static str, owner: VertexId) -> VertexId {
        let slot = self.claim_history_slot(name, owner);
        let id = self.push(
            name,
            Some(owner),
            DraftKind::DeepHistory {
                owner,
                slot,
                default: None,
            },
        );
        self.register_history(owner, id);
        id
    }

    /// Declare a reusable submachine region. Regions are root-level
    /// definitions entered only through referencing
    /// [`submachine`](Self::submachine) states.
    pub fn submachine_region(&mut self, name: &'static str) -> VertexId {
        let slot = self.region_slots;
        self.region_slots += 1;
        self.push(
            name,
            None,
            DraftKind::SubmachineRegion {
                default_child: None,
                slot,
                exit_points: 0,
            },
        )
    }

    /// Declare a state that runs `region` in place.
    pub fn submachine(
        &mut self,
        name: &'static str,
        parent: Option<VertexId>,
        region: VertexId,
    ) -> VertexId {
        self.check_container(parent, name);
        if !matches!(
            self.vertices[region.index()].kind,
            DraftKind::SubmachineRegion { .. }
        ) {
            self.defects.push(BuildError::NotARegion {
                state: self.vertices[region.index()].name,
            });
        }
        self.push(name, parent, DraftKind::Submachine { region })
    }

    /// Declare a named entry point into `submachine`, forwarding to
    /// `target` inside its region.
    pub fn entry_point(
        &mut self,
        name: &'static str,
        submachine: VertexId,
        target: VertexId,
    ) -> VertexId {
        if !matches!(
            self.vertices[submachine.index()].kind,
            DraftKind::Submachine { .. }
        ) {
            self.defects.push(BuildError::InvalidEntryOwner { state: name });
        }
        self.push(name, Some(submachine), DraftKind::EntryPoint { target })
    }

    /// Declare a named exit point of `region`. Every referencing
    /// submachine state must connect it with
    /// [`connect_exit`](Self::connect_exit).
    pub fn exit_point(&mut self, name: &'static str, region: VertexId) -> VertexId {
        let index = match self.vertices[region.index()].kind {
            DraftKind::SubmachineRegion {
                ref mut exit_points,
                ..
            } => {
                let i = *exit_points;
                *exit_points += 1;
                i
            }
            _ => {
                self.defects.push(BuildError::NotARegion {
                    state: self.vertices[region.index()].name,
                });
                0
            }
        };
        self.push(name, Some(region), DraftKind::ExitPoint { region, index })
    }

    /// Set the vertex entered when no history or explicit target
    /// narrows entry into `owner` (composite or region).
    pub fn default_child(&mut self, owner: VertexId, child: VertexId) -> &mut Self {
        match self.vertices[owner.index()].kind {
            DraftKind::Composite {
                ref mut default_child,
                ..
            }
            | DraftKind::SubmachineRegion {
                ref mut default_child,
                ..
            } => *default_child = Some(child),
            _ => {
                let defect = BuildError::ParentNotComposite {
                    state: self.vertices[owner.index()].name,
                    child: self.vertices[child.index()].name,
                };
                self.defects.push(defect);
            }
        }
        self
    }

    /// Set a history vertex's no-history default target, used while its
    /// slot has never been written.
    pub fn history_default(&mut self, history: VertexId, target: VertexId) -> &mut Self {
        match self.vertices[history.index()].kind {
            DraftKind::ShallowHistory {
                ref mut default, ..
            }
            | DraftKind::DeepHistory {
                ref mut default, ..
            } => *default = Some(target),
            _ => {
                let defect = BuildError::NotAHistory {
                    state: self.vertices[history.index()].name,
                };
                self.defects.push(defect);
            }
        }
        self
    }

    /// Set a state's entry action.
    pub fn on_entry<F>(&mut self, state: VertexId, action: F) -> &mut Self
    where
        F: Fn(&mut C, &Event<P>) + Send + Sync + 'static,
    {
        self.vertices[state.index()].entry = Some(Arc::new(action));
        self
    }

    /// Set a state's exit action.
    pub fn on_exit<F>(&mut self, state: VertexId, action: F) -> &mut Self
    where
        F: Fn(&mut C, &Event<P>) + Send + Sync + 'static,
    {
        self.vertices[state.index()].exit = Some(Arc::new(action));
        self
    }

    /// Set the effect run when `vertex` forwards to its configured
    /// target: a composite's or region's initial effect, an entry
    /// point's connection effect, or a history vertex's no-history
    /// default effect.
    pub fn default_effect<F>(&mut self, vertex: VertexId, action: F) -> &mut Self
    where
        F: Fn(&mut C, &Event<P>) + Send + Sync + 'static,
    {
        self.vertices[vertex.index()].forward_effect = Some(Arc::new(action));
        self
    }

    /// Set the machine's topmost initial vertex (required).
    pub fn initial(&mut self, vertex: VertexId) -> &mut Self {
        self.initial = Some(vertex);
        self
    }

    /// Set the effect run while the machine enters its initial
    /// configuration, before any entry action.
    pub fn initial_effect<F>(&mut self, action: F) -> &mut Self
    where
        F: Fn(&mut C, &Event<P>) + Send + Sync + 'static,
    {
        self.initial_effect = Some(Arc::new(action));
        self
    }

    /// Add a transition row to its declaring state's table. Rows are
    /// scanned in the order they are added.
    pub fn transition(&mut self, builder: TransitionBuilder<C, P>) -> Result<&mut Self, BuildError> {
        let (source, transition) = builder.finish()?;
        match self.vertices[source.index()].kind {
            DraftKind::Basic | DraftKind::Composite { .. } | DraftKind::Submachine { .. } => {}
            _ => {
                return Err(BuildError::InvalidTransitionSource {
                    state: self.vertices[source.index()].name,
                })
            }
        }
        self.check_target(transition.target)?;
        self.vertices[source.index()].transitions.push(transition);
        Ok(self)
    }

    /// Add a branch to a choice or junction. Branches are evaluated in
    /// the order they are added.
    pub fn branch(
        &mut self,
        choice: VertexId,
        builder: BranchBuilder<C, P>,
    ) -> Result<&mut Self, BuildError> {
        let branch = builder.finish()?;
        match self.vertices[choice.index()].kind {
            DraftKind::Choice | DraftKind::Junction => {}
            _ => {
                return Err(BuildError::InvalidBranchSource {
                    state: self.vertices[choice.index()].name,
                })
            }
        }
        self.check_target(branch.target)?;
        self.vertices[choice.index()].branches.push(branch);
        Ok(self)
    }

    /// Add the ELSE branch of a choice or junction. Must be added last.
    pub fn otherwise(
        &mut self,
        choice: VertexId,
        target: VertexId,
    ) -> Result<&mut Self, BuildError> {
        self.branch(choice, BranchBuilder::new().target(target))
    }

    /// Connect one of the region's exit points, as reached through
    /// `submachine`, to a continuation target in the host tree.
    pub fn connect_exit(
        &mut self,
        submachine: VertexId,
        exit_point: VertexId,
        target: VertexId,
    ) -> &mut Self {
        self.connect(submachine, exit_point, None, target);
        self
    }

    /// Like [`connect_exit`](Self::connect_exit), with a connection
    /// effect run when the exit point is taken through `submachine`.
    pub fn connect_exit_with<F>(
        &mut self,
        submachine: VertexId,
        exit_point: VertexId,
        effect: F,
        target: VertexId,
    ) -> &mut Self
    where
        F: Fn(&mut C, &Event<P>) + Send + Sync + 'static,
    {
        self.connect(submachine, exit_point, Some(Arc::new(effect)), target);
        self
    }

    /// Validate the graph and freeze it.
    pub fn build(mut self) -> Result<Topology<C, P>, BuildError> {
        if !self.defects.is_empty() {
            return Err(self.defects.remove(0));
        }

        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        if matches!(
            self.vertices[initial.index()].kind,
            DraftKind::SubmachineRegion { .. } | DraftKind::ExitPoint { .. }
        ) || self.region_of(initial).is_some()
        {
            return Err(BuildError::InvalidInitial {
                state: self.vertices[initial.index()].name,
            });
        }

        for i in 0..self.vertices.len() {
            let id = VertexId(i);
            let name = self.vertices[i].name;

            // Nesting must stay under the ceiling; parents always have
            // smaller ids, so the walk terminates.
            let mut depth = 1;
            let mut up = self.vertices[i].parent;
            while let Some(p) = up {
                depth += 1;
                if depth > self.max_depth {
                    return Err(BuildError::DepthCeilingExceeded {
                        state: name,
                        max_depth: self.max_depth,
                    });
                }
                up = self.vertices[p.index()].parent;
            }

            match self.vertices[i].kind {
                DraftKind::Composite { default_child, .. }
                | DraftKind::SubmachineRegion { default_child, .. } => {
                    let child =
                        default_child.ok_or(BuildError::CompositeWithoutDefault { state: name })?;
                    if self.vertices[child.index()].parent != Some(id) {
                        return Err(BuildError::DefaultOutsideOwner {
                            state: name,
                            child: self.vertices[child.index()].name,
                        });
                    }
                }
                DraftKind::Choice | DraftKind::Junction => {
                    let branches = &self.vertices[i].branches;
                    if branches.is_empty() {
                        return Err(BuildError::BranchlessChoice { state: name });
                    }
                    if branches.iter().rev().skip(1).any(|b| b.guard.is_none()) {
                        return Err(BuildError::ElseNotLast { state: name });
                    }
                }
                DraftKind::ShallowHistory { owner, default, .. }
                | DraftKind::DeepHistory { owner, default, .. } => {
                    if let Some(d) = default {
                        if !self.is_descendant(d, owner) {
                            return Err(BuildError::InvalidHistoryDefault { state: name });
                        }
                    }
                }
                DraftKind::EntryPoint { target } => {
                    if let Some(sub) = self.vertices[i].parent {
                        if let DraftKind::Submachine { region } = self.vertices[sub.index()].kind {
                            if !self.is_descendant(target, region) {
                                return Err(BuildError::InvalidEntryTarget { state: name });
                            }
                        }
                    }
                }
                DraftKind::Submachine { region } => {
                    let needed = match self.vertices[region.index()].kind {
                        DraftKind::SubmachineRegion { exit_points, .. } => exit_points,
                        _ => 0,
                    };
                    for idx in 0..needed {
                        let connected = self.vertices[i]
                            .exit_connections
                            .get(idx)
                            .map(Option::is_some)
                            .unwrap_or(false);
                        if !connected {
                            return Err(BuildError::MissingExitConnection {
                                state: name,
                                exit_point: self.exit_point_name(region, idx),
                            });
                        }
                    }
                }
                _ => {}
            }
        }

        // Transition and branch targets may not reach into a
        // submachine region from outside it; regions are entered
        // through a referencing state or its entry points.
        for i in 0..self.vertices.len() {
            let source_region = self.region_of(VertexId(i));
            let targets: Vec<VertexId> = self.vertices[i]
                .transitions
                .iter()
                .map(|t| t.target)
                .chain(self.vertices[i].branches.iter().map(|b| b.target))
                .collect();
            for target in targets {
                if let Some(region) = self.region_of(target) {
                    if source_region != Some(region) {
                        return Err(BuildError::InvalidTransitionTarget {
                            state: self.vertices[target.index()].name,
                        });
                    }
                }
            }
        }

        let TopologyBuilder {
            vertices: drafts,
            initial_effect,
            max_depth,
            history_slots,
            region_slots,
            ..
        } = self;

        let vertices = drafts
            .into_iter()
            .map(|d| {
                let kind = match d.kind {
                    DraftKind::Basic => VertexKind::Basic,
                    DraftKind::Final => VertexKind::Final,
                    DraftKind::Choice => VertexKind::Choice,
                    DraftKind::Junction => VertexKind::Junction,
                    DraftKind::Composite {
                        default_child,
                        history,
                    } => VertexKind::Composite {
                        default_child: default_child
                            .ok_or(BuildError::CompositeWithoutDefault { state: d.name })?,
                        history,
                    },
                    DraftKind::ShallowHistory {
                        owner,
                        slot,
                        default,
                    } => VertexKind::ShallowHistory {
                        owner,
                        slot,
                        default,
                    },
                    DraftKind::DeepHistory {
                        owner,
                        slot,
                        default,
                    } => VertexKind::DeepHistory {
                        owner,
                        slot,
                        default,
                    },
                    DraftKind::EntryPoint { target } => VertexKind::EntryPoint { target },
                    DraftKind::ExitPoint { region, index } => {
                        VertexKind::ExitPoint { region, index }
                    }
                    DraftKind::Submachine { region } => VertexKind::Submachine { region },
                    DraftKind::SubmachineRegion {
                        default_child,
                        slot,
                        ..
                    } => VertexKind::SubmachineRegion {
                        default_child: default_child
                            .ok_or(BuildError::CompositeWithoutDefault { state: d.name })?,
                        slot,
                    },
                };
                Ok(Vertex {
                    name: d.name,
                    parent: d.parent,
                    kind,
                    entry: d.entry,
                    exit: d.exit,
                    forward_effect: d.forward_effect,
                    transitions: d.transitions,
                    branches: d.branches,
                    exit_connections: d.exit_connections,
                })
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        Ok(Topology {
            vertices,
            initial,
            initial_effect,
            max_depth,
            history_slots,
            region_slots,
        })
    }

    fn push(&mut self, name: &'static str, parent: Option<VertexId>, kind: DraftKind) -> VertexId {
        let id = VertexId(self.vertices.len());
        self.vertices.push(DraftVertex {
            name,
            parent,
            kind,
            entry: None,
            exit: None,
            forward_effect: None,
            transitions: Vec::new(),
            branches: Vec::new(),
            exit_connections: Vec::new(),
        });
        id
    }

    fn check_container(&mut self, parent: Option<VertexId>, child: &'static str) {
        if let Some(p) = parent {
            match self.vertices[p.index()].kind {
                DraftKind::Composite { .. } | DraftKind::SubmachineRegion { .. } => {}
                _ => {
                    let defect = BuildError::ParentNotComposite {
                        state: self.vertices[p.index()].name,
                        child,
                    };
                    self.defects.push(defect);
                }
            }
        }
    }

    fn check_target(&self, target: VertexId) -> Result<(), BuildError> {
        if matches!(
            self.vertices[target.index()].kind,
            DraftKind::SubmachineRegion { .. }
        ) {
            return Err(BuildError::InvalidTransitionTarget {
                state: self.vertices[target.index()].name,
            });
        }
        Ok(())
    }

    fn claim_history_slot(&mut self, name: &'static str, owner: VertexId) -> usize {
        match self.vertices[owner.index()].kind {
            DraftKind::Composite {
                history: Some(_), ..
            } => self.defects.push(BuildError::DuplicateHistory {
                state: self.vertices[owner.index()].name,
            }),
            DraftKind::Composite { .. } => {}
            _ => self
                .defects
                .push(BuildError::InvalidHistoryOwner { state: name }),
        }
        let slot = self.history_slots;
        self.history_slots += 1;
        slot
    }

    fn register_history(&mut self, owner: VertexId, history: VertexId) {
        if let DraftKind::Composite {
            history: ref mut h, ..
        } = self.vertices[owner.index()].kind
        {
            if h.is_none() {
                *h = Some(history);
            }
        }
    }

    fn connect(
        &mut self,
        submachine: VertexId,
        exit_point: VertexId,
        effect: Option<ActionFn<C, P>>,
        target: VertexId,
    ) {
        let sub_kind = self.vertices[submachine.index()].kind;
        let ep_kind = self.vertices[exit_point.index()].kind;
        match (sub_kind, ep_kind) {
            (DraftKind::Submachine { region }, DraftKind::ExitPoint { region: r, index })
                if region == r =>
            {
                let conns = &mut self.vertices[submachine.index()].exit_connections;
                if conns.len() <= index {
                    conns.resize_with(index + 1, || None);
                }
                conns[index] = Some(ExitConnection { effect, target });
            }
            _ => {
                let defect = BuildError::ExitConnectionMismatch {
                    state: self.vertices[submachine.index()].name,
                    exit_point: self.vertices[exit_point.index()].name,
                };
                self.defects.push(defect);
            }
        }
    }

    /// The innermost submachine region statically enclosing `vertex`.
    fn region_of(&self, vertex: VertexId) -> Option<VertexId> {
        let mut depth = 0;
        let mut up = self.vertices[vertex.index()].parent;
        while let Some(parent) = up {
            if matches!(
                self.vertices[parent.index()].kind,
                DraftKind::SubmachineRegion { .. }
            ) {
                return Some(parent);
            }
            depth += 1;
            if depth > self.max_depth {
                return None;
            }
            up = self.vertices[parent.index()].parent;
        }
        None
    }

    fn is_descendant(&self, vertex: VertexId, ancestor: VertexId) -> bool {
        let mut depth = 0;
        let mut up = self.vertices[vertex.index()].parent;
        while let Some(p) = up {
            if p == ancestor {
                return true;
            }
            depth += 1;
            if depth > self.max_depth {
                return false;
            }
            up = self.vertices[p.index()].parent;
        }
        false
    }

    fn exit_point_name(&self, region: VertexId, index: usize) -> &'static str {
        self.vertices
            .iter()
            .find_map(|v| match v.kind {
                DraftKind::ExitPoint { region: r, index: i } if r == region && i == index => {
                    Some(v.name)
                }
                _ => None,
            })
            .unwrap_or("?")
    }
}

impl<C, P> Default for TopologyBuilder<C, P> {
    fn default() -> Self {
        Self::new()
    }
}
