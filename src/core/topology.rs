//! The immutable state graph shared by machine instances.
//!
//! A `Topology` is pure data: a vertex arena, the machine's initial
//! vertex, and the depth ceiling. It offers lookups and nothing else;
//! malformed graphs are a build-time defect caught by the builder, and
//! the resolver's ceiling converts any latent cycle into a detected
//! fatal condition instead of unbounded recursion.

use super::guard::ActionFn;
use super::vertex::{Vertex, VertexId, VertexKind};

/// Ceiling on hierarchy depth, pseudostate segments, and completion
/// cascades unless the builder configures another value.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// The static description of one machine type.
///
/// Built once by [`TopologyBuilder`](crate::builder::TopologyBuilder),
/// then shared read-only (behind an `Arc`) by every instance.
pub struct Topology<C, P = ()> {
    pub(crate) vertices: Vec<Vertex<C, P>>,
    pub(crate) initial: VertexId,
    pub(crate) initial_effect: Option<ActionFn<C, P>>,
    pub(crate) max_depth: usize,
    pub(crate) history_slots: usize,
    pub(crate) region_slots: usize,
}

impl<C, P> Topology<C, P> {
    pub(crate) fn vertex(&self, id: VertexId) -> &Vertex<C, P> {
        &self.vertices[id.index()]
    }

    pub(crate) fn kind(&self, id: VertexId) -> VertexKind {
        self.vertex(id).kind
    }

    /// The statically declared parent of a vertex.
    ///
    /// Root vertices have none. Inside a submachine region this is the
    /// region definition itself; the machine's active-reference slot
    /// decides which referencing state the walk continues through at
    /// run time.
    pub fn parent_of(&self, id: VertexId) -> Option<VertexId> {
        self.vertex(id).parent
    }

    /// Whether the vertex is a pseudostate (never the current state
    /// between dispatches).
    pub fn is_pseudostate(&self, id: VertexId) -> bool {
        self.kind(id).is_pseudostate()
    }

    /// Whether the vertex is a final state.
    pub fn is_final(&self, id: VertexId) -> bool {
        matches!(self.kind(id), VertexKind::Final)
    }

    /// The vertex entered when no history or explicit target narrows
    /// entry into a composite or submachine region.
    pub fn default_child_of(&self, id: VertexId) -> Option<VertexId> {
        self.kind(id).default_child()
    }

    /// The vertex's declared name.
    pub fn name_of(&self, id: VertexId) -> &'static str {
        self.vertex(id).name
    }

    /// The machine's topmost initial vertex.
    pub fn initial(&self) -> VertexId {
        self.initial
    }

    /// The configured hierarchical-depth ceiling.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
