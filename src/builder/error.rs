//! Build errors for topology and transition builders.

use thiserror::Error;

/// Errors that can occur while assembling a topology.
///
/// Every variant is a static-table defect: these are caught once at
/// build time so the resolver never has to re-discover them at
/// dispatch time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Initial vertex not specified. Call .initial(vertex) before .build()")]
    MissingInitialState,

    #[error("Vertex '{state}' cannot be the initial vertex")]
    InvalidInitial { state: &'static str },

    #[error("Transition source not specified. Call .source(vertex)")]
    MissingSource,

    #[error("Transition trigger not specified. Call .on(signal), .on_any() or .on_completion()")]
    MissingTrigger,

    #[error("Transition target not specified. Call .target(vertex), or mark it .internal()")]
    MissingTarget,

    #[error("Branch target not specified. Call .target(vertex)")]
    MissingBranchTarget,

    #[error("Signal {signal} is reserved by the engine")]
    ReservedSignal { signal: u16 },

    #[error("'{state}' declares a transition but is not a basic, composite or submachine state")]
    InvalidTransitionSource { state: &'static str },

    #[error("'{state}' cannot be a transition target")]
    InvalidTransitionTarget { state: &'static str },

    #[error("'{state}' has branches but is not a choice or junction")]
    InvalidBranchSource { state: &'static str },

    #[error("Choice/junction '{state}' has no branches")]
    BranchlessChoice { state: &'static str },

    #[error("Choice/junction '{state}' has a branch after its ELSE branch")]
    ElseNotLast { state: &'static str },

    #[error("'{state}' is not a composite and cannot contain '{child}'")]
    ParentNotComposite {
        state: &'static str,
        child: &'static str,
    },

    #[error("Composite '{state}' has no default child. Call .default_child(state, child)")]
    CompositeWithoutDefault { state: &'static str },

    #[error("Default child '{child}' lies outside composite '{state}'")]
    DefaultOutsideOwner {
        state: &'static str,
        child: &'static str,
    },

    #[error("History vertex '{state}' is owned by a non-composite")]
    InvalidHistoryOwner { state: &'static str },

    #[error("Composite '{state}' already has a history vertex")]
    DuplicateHistory { state: &'static str },

    #[error("History default of '{state}' is not a descendant of its owner")]
    InvalidHistoryDefault { state: &'static str },

    #[error("Entry point '{state}' targets a vertex outside its region")]
    InvalidEntryTarget { state: &'static str },

    #[error("'{state}' is not a submachine region")]
    NotARegion { state: &'static str },

    #[error("'{state}' is not a history vertex")]
    NotAHistory { state: &'static str },

    #[error("Entry point '{state}' must be attached to a submachine state")]
    InvalidEntryOwner { state: &'static str },

    #[error("'{exit_point}' is not an exit point of '{state}'s region")]
    ExitConnectionMismatch {
        state: &'static str,
        exit_point: &'static str,
    },

    #[error("Submachine '{state}' has no connection for exit point '{exit_point}'")]
    MissingExitConnection {
        state: &'static str,
        exit_point: &'static str,
    },

    #[error("'{state}' nests deeper than the configured ceiling of {max_depth}")]
    DepthCeilingExceeded {
        state: &'static str,
        max_depth: usize,
    },
}
