//! Vertices of the state graph.
//!
//! A topology is a flat arena of vertices; every cross-reference
//! (parent link, default child, history owner, submachine region) is a
//! `VertexId` index into that arena, because the graph is cyclic through
//! parent and history links. Each vertex carries only the fields its
//! kind needs.

use super::guard::ActionFn;
use super::transition::{Branch, ExitConnection, Transition};
use serde::{Deserialize, Serialize};

/// Index of a vertex in its topology's arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct VertexId(pub(crate) usize);

impl VertexId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// The kind of a vertex, with the kind-specific wiring.
///
/// Stable kinds (`Basic`, `Final`) are the only ones a machine may rest
/// in between dispatches. Pseudostates are resolved away during
/// transition resolution and never become the current state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum VertexKind {
    /// A simple state with no substates.
    Basic,
    /// A state containing a region of substates.
    Composite {
        default_child: VertexId,
        /// The region's history vertex, if it has one.
        history: Option<VertexId>,
    },
    /// Terminates its enclosing region and triggers completion.
    Final,
    /// Dynamic branch point: guards evaluated on arrival.
    Choice,
    /// Static branch point; shares the choice evaluation rule here.
    Junction,
    /// Remembers the owner's last active immediate child.
    ShallowHistory {
        owner: VertexId,
        slot: usize,
        /// No-history default target, used while the slot is empty.
        default: Option<VertexId>,
    },
    /// Remembers the owner's last active leaf descendant.
    DeepHistory {
        owner: VertexId,
        slot: usize,
        default: Option<VertexId>,
    },
    /// Named way into a submachine reference; parent is the referencing
    /// state, target lies inside the region.
    EntryPoint { target: VertexId },
    /// Named way out of a region; resolved through the active
    /// reference's connection table.
    ExitPoint { region: VertexId, index: usize },
    /// A state that runs a reusable region in place.
    Submachine { region: VertexId },
    /// A reusable region definition; entered only through a
    /// `Submachine` reference, which the per-instance slot records.
    SubmachineRegion { default_child: VertexId, slot: usize },
}

impl VertexKind {
    /// Pseudostates are never the current state between dispatches.
    pub(crate) fn is_pseudostate(self) -> bool {
        matches!(
            self,
            VertexKind::Choice
                | VertexKind::Junction
                | VertexKind::ShallowHistory { .. }
                | VertexKind::DeepHistory { .. }
                | VertexKind::EntryPoint { .. }
                | VertexKind::ExitPoint { .. }
        )
    }

    /// A machine may rest here between dispatches.
    pub(crate) fn is_stable(self) -> bool {
        matches!(self, VertexKind::Basic | VertexKind::Final)
    }

    pub(crate) fn default_child(self) -> Option<VertexId> {
        match self {
            VertexKind::Composite { default_child, .. }
            | VertexKind::SubmachineRegion { default_child, .. } => Some(default_child),
            _ => None,
        }
    }
}

/// One node of the static state graph.
///
/// Vertices are immutable after build and shared read-only across every
/// machine instance of their topology.
pub(crate) struct Vertex<C, P = ()> {
    pub(crate) name: &'static str,
    pub(crate) parent: Option<VertexId>,
    pub(crate) kind: VertexKind,
    pub(crate) entry: Option<ActionFn<C, P>>,
    pub(crate) exit: Option<ActionFn<C, P>>,
    /// Effect run when this vertex forwards to a configured target: a
    /// composite's or region's initial effect, an entry point's
    /// connection effect, or a history vertex's no-history default
    /// effect.
    pub(crate) forward_effect: Option<ActionFn<C, P>>,
    /// Ordered transition table; scanned in declaration order.
    pub(crate) transitions: Vec<Transition<C, P>>,
    /// Ordered branch table for choice/junction vertices.
    pub(crate) branches: Vec<Branch<C, P>>,
    /// Per-reference exit-point connections for submachine states,
    /// indexed by the exit point's index within its region.
    pub(crate) exit_connections: Vec<Option<ExitConnection<C, P>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pseudostates_are_classified() {
        assert!(VertexKind::Choice.is_pseudostate());
        assert!(VertexKind::Junction.is_pseudostate());
        assert!(VertexKind::ShallowHistory {
            owner: VertexId(0),
            slot: 0,
            default: None
        }
        .is_pseudostate());
        assert!(VertexKind::DeepHistory {
            owner: VertexId(0),
            slot: 0,
            default: None
        }
        .is_pseudostate());
        assert!(VertexKind::EntryPoint {
            target: VertexId(0)
        }
        .is_pseudostate());
        assert!(VertexKind::ExitPoint {
            region: VertexId(0),
            index: 0
        }
        .is_pseudostate());

        assert!(!VertexKind::Basic.is_pseudostate());
        assert!(!VertexKind::Final.is_pseudostate());
        assert!(!VertexKind::Submachine {
            region: VertexId(0)
        }
        .is_pseudostate());
    }

    #[test]
    fn only_basic_and_final_are_stable() {
        assert!(VertexKind::Basic.is_stable());
        assert!(VertexKind::Final.is_stable());
        assert!(!VertexKind::Choice.is_stable());
        assert!(!VertexKind::Composite {
            default_child: VertexId(1),
            history: None
        }
        .is_stable());
        assert!(!VertexKind::Submachine {
            region: VertexId(1)
        }
        .is_stable());
    }

    #[test]
    fn default_child_exists_for_region_owners_only() {
        assert_eq!(
            VertexKind::Composite {
                default_child: VertexId(4),
                history: None
            }
            .default_child(),
            Some(VertexId(4))
        );
        assert_eq!(
            VertexKind::SubmachineRegion {
                default_child: VertexId(2),
                slot: 0
            }
            .default_child(),
            Some(VertexId(2))
        );
        assert_eq!(VertexKind::Basic.default_child(), None);
        assert_eq!(VertexKind::Final.default_child(), None);
    }
}
