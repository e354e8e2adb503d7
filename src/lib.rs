//! Strata: a hierarchical state machine engine for reactive systems
//!
//! Strata executes UML-style statecharts declared as static tables: an
//! application describes its state topology once (simple and composite
//! states, choice/junction pseudostates, shallow and deep history,
//! final states, reusable submachines) and the engine walks those
//! tables at run time, resolving each dispatched event into the exact
//! ordered sequence of exit actions, transition effects and entry
//! actions the statechart semantics require.
//!
//! The tables are immutable after build and shared read-only across
//! machine instances; each instance owns only its current leaf state
//! and its history/submachine slots. Dispatch is synchronous, runs to
//! a stable configuration (including any completion-event cascade)
//! before returning, and bounds every walk with a configurable depth
//! ceiling, so malformed tables fail loudly instead of recursing
//! without bound.
//!
//! # Core Concepts
//!
//! - **Topology**: the static state graph, assembled by
//!   [`builder::TopologyBuilder`]
//! - **Machine**: one running instance with its own context and slots
//! - **Events**: small-integer [`core::Signal`]s with an optional
//!   generic payload
//! - **Tracing**: per-instance [`trace::Tracer`] hooks at every
//!   documented dispatch point
//! - **Snapshots**: [`checkpoint::Snapshot`] captures an instance's
//!   mutable state for restart
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use strata::builder::{TopologyBuilder, TransitionBuilder};
//! use strata::core::{Event, Signal};
//! use strata::engine::Machine;
//!
//! const OPEN: Signal = Signal::new(1);
//! const CLOSE: Signal = Signal::new(2);
//!
//! let mut t = TopologyBuilder::<u32>::new();
//! let closed = t.basic("closed", None);
//! let opened = t.composite("opened", None);
//! let ajar = t.basic("ajar", Some(opened));
//! t.default_child(opened, ajar);
//! t.on_entry(opened, |opens, _| *opens += 1);
//! t.initial(closed);
//! t.transition(TransitionBuilder::new().source(closed).on(OPEN).target(opened))
//!     .unwrap();
//! t.transition(TransitionBuilder::new().source(opened).on(CLOSE).target(closed))
//!     .unwrap();
//! let topology = Arc::new(t.build().unwrap());
//!
//! let mut door = Machine::new(topology, 0u32);
//! door.init();
//! door.dispatch(&Event::new(OPEN));
//! assert_eq!(door.current_state_name(), Some("ajar"));
//! assert_eq!(*door.context(), 1);
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod engine;
pub mod trace;

// Re-export commonly used types
pub use crate::builder::{BranchBuilder, BuildError, TopologyBuilder, TransitionBuilder};
pub use crate::checkpoint::{CheckpointError, Snapshot};
pub use crate::core::{Event, Guard, Signal, Topology, VertexId};
pub use crate::engine::{DispatchOutcome, Machine};
pub use crate::trace::{NoopTracer, TraceRecorder, Tracer};
