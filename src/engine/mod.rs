//! The dispatch and transition-resolution engine.
//!
//! [`Machine`] couples a shared, immutable [`Topology`](crate::core::Topology)
//! with one instance's mutable state: the current leaf vertex, its
//! history slots, and its active submachine references. Dispatch is
//! synchronous and non-reentrant per instance; `&mut self` enforces
//! the single-caller rule the scheduler layer is expected to honor.

mod machine;
mod resolver;

pub use machine::Machine;

/// Result of dispatching one event to one machine.
///
/// The depth-ceiling condition has no variant here: exceeding the
/// ceiling signals a malformed static table and panics, it is never a
/// recoverable outcome.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DispatchOutcome {
    /// A transition fired (or an internal effect ran).
    Processed,
    /// No table entry matched at any ancestor level; state unchanged.
    /// A normal outcome for filtered-out events.
    NotFound,
    /// A choice/junction had no matching branch and no ELSE. The
    /// dispatch was abandoned; tables should always supply ELSE.
    ConditionNotFound,
}
