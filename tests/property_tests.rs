//! Property-based tests for the dispatch engine.
//!
//! These tests use proptest to verify the engine's ordering and
//! determinism guarantees across many randomly generated event
//! sequences against one fixed, reasonably rich topology.

use proptest::prelude::*;
use std::sync::Arc;
use strata::builder::{BranchBuilder, TopologyBuilder, TransitionBuilder};
use strata::core::{Event, Signal, Topology, VertexId};
use strata::engine::Machine;
use strata::trace::TraceRecorder;
use strata::Snapshot;

const SWAP: Signal = Signal::new(1);
const LEAVE: Signal = Signal::new(2);
const RETURN: Signal = Signal::new(3);
const SPIN: Signal = Signal::new(4);
const POKE: Signal = Signal::new(5);
const FORK: Signal = Signal::new(6);

type Log = Vec<String>;

struct Playground {
    topology: Arc<Topology<Log>>,
    s11: VertexId,
    s12: VertexId,
    away: VertexId,
}

/// A composite with two children and shallow history, an outside
/// state, a loop, an internal transition, and a guarded choice.
fn playground() -> Playground {
    let mut t = TopologyBuilder::<Log>::new();
    let s1 = t.composite("s1", None);
    let s11 = t.basic("s11", Some(s1));
    let s12 = t.basic("s12", Some(s1));
    let h = t.shallow_history("h", s1);
    let away = t.basic("away", None);
    let fork = t.choice("fork", None);
    t.default_child(s1, s11);
    t.on_exit(s11, |log: &mut Log, _| log.push("exit:s11".to_string()));
    t.on_entry(s11, |log: &mut Log, _| log.push("enter:s11".to_string()));
    t.on_exit(s12, |log: &mut Log, _| log.push("exit:s12".to_string()));
    t.on_entry(s12, |log: &mut Log, _| log.push("enter:s12".to_string()));
    t.initial(s1);
    t.transition(TransitionBuilder::new().source(s11).on(SWAP).target(s12))
        .unwrap();
    t.transition(TransitionBuilder::new().source(s12).on(SWAP).target(s11))
        .unwrap();
    t.transition(TransitionBuilder::new().source(s1).on(LEAVE).target(away))
        .unwrap();
    t.transition(TransitionBuilder::new().source(away).on(RETURN).target(h))
        .unwrap();
    t.transition(
        TransitionBuilder::new()
            .source(s11)
            .on(SPIN)
            .loop_back(),
    )
    .unwrap();
    t.transition(
        TransitionBuilder::new()
            .source(s1)
            .on(POKE)
            .effect(|log: &mut Log, _| log.push("poke".to_string()))
            .internal(),
    )
    .unwrap();
    t.transition(TransitionBuilder::new().source(away).on(FORK).target(fork))
        .unwrap();
    t.branch(
        fork,
        BranchBuilder::new()
            .when(|log: &Log, _| log.len() % 2 == 0)
            .target(s1),
    )
    .unwrap();
    t.otherwise(fork, away).unwrap();

    Playground {
        topology: Arc::new(t.build().unwrap()),
        s11,
        s12,
        away,
    }
}

prop_compose! {
    fn arbitrary_signal()(raw in 1..=6u16) -> Signal {
        Signal::new(raw)
    }
}

proptest! {
    #[test]
    fn identical_runs_are_identical(signals in prop::collection::vec(arbitrary_signal(), 0..24)) {
        let run = |signals: &[Signal]| {
            let p = playground();
            let mut m = Machine::with_tracer(p.topology, Vec::new(), TraceRecorder::new());
            m.init();
            for &signal in signals {
                m.dispatch(&Event::new(signal));
            }
            (m.tracer().events(), m.current_state(), m.context().clone())
        };

        let (trace1, leaf1, log1) = run(&signals);
        let (trace2, leaf2, log2) = run(&signals);
        prop_assert_eq!(trace1, trace2);
        prop_assert_eq!(leaf1, leaf2);
        prop_assert_eq!(log1, log2);
    }

    #[test]
    fn the_leaf_is_always_stable_between_dispatches(
        signals in prop::collection::vec(arbitrary_signal(), 0..24)
    ) {
        let p = playground();
        let mut m = Machine::new(Arc::clone(&p.topology), Vec::new());
        m.init();
        for signal in signals {
            m.dispatch(&Event::new(signal));
            let leaf = m.current_state().unwrap();
            prop_assert!(!p.topology.is_pseudostate(leaf));
        }
    }

    #[test]
    fn loops_always_exit_and_reenter(spins in 1usize..8) {
        let p = playground();
        let mut m = Machine::new(p.topology, Vec::new());
        m.init();
        m.context_mut().clear();
        for _ in 0..spins {
            m.dispatch(&Event::new(SPIN));
        }

        let expected: Log = std::iter::repeat(["exit:s11", "enter:s11"])
            .take(spins)
            .flatten()
            .map(str::to_string)
            .collect();
        prop_assert_eq!(m.context(), &expected);
        prop_assert_eq!(m.current_state(), Some(p.s11));
    }

    #[test]
    fn internal_effects_never_move_the_leaf(pokes in 1usize..8) {
        let p = playground();
        let mut m = Machine::new(p.topology, Vec::new());
        m.init();
        m.context_mut().clear();
        for _ in 0..pokes {
            m.dispatch(&Event::new(POKE));
        }

        prop_assert_eq!(m.current_state(), Some(p.s11));
        prop_assert_eq!(m.context().len(), pokes);
        prop_assert!(m.context().iter().all(|entry| entry == "poke"));
    }

    #[test]
    fn history_restores_whichever_child_was_active(swaps in 0usize..6) {
        let p = playground();
        let mut m = Machine::new(p.topology, Vec::new());
        m.init();
        for _ in 0..swaps {
            m.dispatch(&Event::new(SWAP));
        }
        let active = if swaps % 2 == 0 { p.s11 } else { p.s12 };

        m.dispatch(&Event::new(LEAVE));
        prop_assert_eq!(m.current_state(), Some(p.away));

        m.dispatch(&Event::new(RETURN));
        prop_assert_eq!(m.current_state(), Some(active));
    }

    #[test]
    fn snapshots_round_trip_after_any_prefix(
        signals in prop::collection::vec(arbitrary_signal(), 0..16)
    ) {
        let p = playground();
        let mut m = Machine::new(Arc::clone(&p.topology), Vec::new());
        m.init();
        for signal in signals {
            m.dispatch(&Event::new(signal));
        }

        let snapshot = m.snapshot().unwrap();
        let decoded = Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();

        let mut resumed = Machine::new(p.topology, Vec::new());
        resumed.restore(&decoded).unwrap();
        prop_assert_eq!(resumed.current_state(), m.current_state());
        prop_assert_eq!(resumed.id(), m.id());
    }
}
