//! Ticket Triage Routing
//!
//! This example demonstrates guard-driven routing through a choice
//! pseudostate and a completion cascade out of a finished region.
//!
//! Key concepts:
//! - Choice pseudostate with guards evaluated in declaration order
//! - ELSE branch as the unconditional fallback
//! - Final state triggering an automatic completion transition
//! - Guards reading the event payload
//!
//! Run with: cargo run --example triage_routing

use std::sync::Arc;
use strata::builder::{BranchBuilder, TopologyBuilder, TransitionBuilder};
use strata::core::{Event, Signal};
use strata::engine::Machine;

const SUBMIT: Signal = Signal::new(1);
const RESOLVE: Signal = Signal::new(2);

#[derive(Default)]
struct Stats {
    escalations: u32,
}

fn main() {
    println!("=== Ticket Triage Routing ===\n");

    let mut t = TopologyBuilder::<Stats, u8>::new();
    let inbox = t.basic("inbox", None);
    let triage = t.choice("triage", None);

    let handling = t.composite("handling", None);
    let urgent = t.basic("urgent", Some(handling));
    let routine = t.basic("routine", Some(handling));
    let resolved = t.final_state("resolved", Some(handling));
    t.default_child(handling, routine);

    let archived = t.basic("archived", None);

    t.on_entry(urgent, |_, _| println!("  [Queue] paged the on-call"));
    t.on_entry(routine, |_, _| println!("  [Queue] added to the backlog"));
    t.on_entry(archived, |_, _| println!("  [Queue] ticket archived"));

    t.initial(inbox);
    t.transition(TransitionBuilder::new().source(inbox).on(SUBMIT).target(triage))
        .unwrap();
    // Severity rides in the event payload; first true guard wins.
    t.branch(
        triage,
        BranchBuilder::new()
            .when(|_, e| e.payload().copied().unwrap_or(0) >= 8)
            .effect(|stats: &mut Stats, _| stats.escalations += 1)
            .target(urgent),
    )
    .unwrap();
    t.otherwise(triage, routine).unwrap();

    t.transition(TransitionBuilder::new().source(handling).on(RESOLVE).target(resolved))
        .unwrap();
    // Fires automatically once the handling region reaches its final state.
    t.transition(
        TransitionBuilder::new()
            .source(handling)
            .on_completion()
            .target(archived),
    )
    .unwrap();

    let topology = Arc::new(t.build().unwrap());

    println!("Severity 9 ticket (escalates):");
    let mut m = Machine::new(Arc::clone(&topology), Stats::default());
    m.init();
    m.dispatch(&Event::with_payload(SUBMIT, 9));
    println!("  -> {:?}", m.current_state_name());
    println!("  escalations so far: {}\n", m.context().escalations);

    println!("Severity 2 ticket (falls through to ELSE):");
    let mut m = Machine::new(Arc::clone(&topology), Stats::default());
    m.init();
    m.dispatch(&Event::with_payload(SUBMIT, 2));
    println!("  -> {:?}\n", m.current_state_name());

    println!("Resolving cascades out of the region without another event:");
    m.dispatch(&Event::with_payload(RESOLVE, 0));
    println!("  -> {:?}\n", m.current_state_name());

    println!("=== Example Complete ===");
}
