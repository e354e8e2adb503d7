//! Checkpoint and Resume
//!
//! This example demonstrates snapshotting a running machine and
//! resuming a fresh instance from the captured state.
//!
//! Key concepts:
//! - Snapshots capture only the instance's mutable cells
//! - History slots survive the restart
//! - JSON for readability, binary for compactness
//! - Restore validates the snapshot against the topology
//!
//! Run with: cargo run --example checkpoint_resume

use std::sync::Arc;
use strata::builder::{TopologyBuilder, TransitionBuilder};
use strata::core::{Event, Signal};
use strata::engine::Machine;
use strata::Snapshot;

const ADVANCE: Signal = Signal::new(1);
const SUSPEND: Signal = Signal::new(2);
const RESUME: Signal = Signal::new(3);

fn main() {
    println!("=== Checkpoint and Resume ===\n");

    let mut t = TopologyBuilder::<()>::new();
    let pipeline = t.composite("pipeline", None);
    let extract = t.basic("extract", Some(pipeline));
    let transform = t.basic("transform", Some(pipeline));
    let load = t.basic("load", Some(pipeline));
    let history = t.shallow_history("history", pipeline);
    let suspended = t.basic("suspended", None);
    t.default_child(pipeline, extract);

    t.initial(pipeline);
    t.transition(TransitionBuilder::new().source(extract).on(ADVANCE).target(transform))
        .unwrap();
    t.transition(TransitionBuilder::new().source(transform).on(ADVANCE).target(load))
        .unwrap();
    t.transition(TransitionBuilder::new().source(pipeline).on(SUSPEND).target(suspended))
        .unwrap();
    t.transition(TransitionBuilder::new().source(suspended).on(RESUME).target(history))
        .unwrap();
    let topology = Arc::new(t.build().unwrap());

    let mut machine = Machine::new(Arc::clone(&topology), ());
    machine.init();
    machine.dispatch(&Event::new(ADVANCE));
    machine.dispatch(&Event::new(SUSPEND));
    println!(
        "Suspended mid-run in {:?} (transform is remembered)\n",
        machine.current_state_name()
    );

    // Capture: JSON for operators, bytes for the wire.
    let snapshot = machine.snapshot().unwrap();
    let json = snapshot.to_json().unwrap();
    let bytes = snapshot.to_bytes().unwrap();
    println!("Snapshot as JSON ({} chars):\n  {}", json.len(), json);
    println!("Snapshot as binary: {} bytes\n", bytes.len());

    // A process restart: fresh machine, no init, restore instead.
    let mut resumed = Machine::new(topology, ());
    let decoded = Snapshot::from_json(&json).unwrap();
    resumed.restore(&decoded).unwrap();
    println!(
        "Restored instance {} in {:?}",
        resumed.id(),
        resumed.current_state_name()
    );

    resumed.dispatch(&Event::new(RESUME));
    println!(
        "History survived the restart: resumed into {:?}\n",
        resumed.current_state_name()
    );

    println!("=== Example Complete ===");
}
