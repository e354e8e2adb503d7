//! Media Player State Machine
//!
//! This example demonstrates a hierarchical media player with nested
//! composite states and shallow history.
//!
//! Key concepts:
//! - Composite states (On contains Stopped and Playing)
//! - Shallow history (power-cycling resumes where you left off)
//! - Internal transitions (volume changes never leave the state)
//! - Default children (turning on lands in Stopped)
//!
//! Run with: cargo run --example media_player

use std::sync::Arc;
use strata::builder::{TopologyBuilder, TransitionBuilder};
use strata::core::{Event, Signal};
use strata::engine::Machine;

const POWER: Signal = Signal::new(1);
const PLAY: Signal = Signal::new(2);
const STOP: Signal = Signal::new(3);
const VOLUME_UP: Signal = Signal::new(4);

struct Player {
    volume: u8,
}

fn main() {
    println!("=== Media Player State Machine ===\n");

    let mut t = TopologyBuilder::<Player>::new();
    let off = t.basic("off", None);
    let on = t.composite("on", None);
    let stopped = t.basic("stopped", Some(on));
    let playing = t.basic("playing", Some(on));
    let history = t.shallow_history("history", on);
    t.default_child(on, stopped);

    t.on_entry(on, |_, _| println!("  [Player] powering up"));
    t.on_exit(on, |_, _| println!("  [Player] powering down"));
    t.on_entry(stopped, |_, _| println!("  [Player] stopped"));
    t.on_entry(playing, |_, _| println!("  [Player] playing"));
    t.on_exit(playing, |_, _| println!("  [Player] playback paused"));

    t.initial(off);
    // Power toggles between off and the remembered substate of on.
    t.transition(TransitionBuilder::new().source(off).on(POWER).target(history))
        .unwrap();
    t.transition(TransitionBuilder::new().source(on).on(POWER).target(off))
        .unwrap();
    t.transition(TransitionBuilder::new().source(stopped).on(PLAY).target(playing))
        .unwrap();
    t.transition(TransitionBuilder::new().source(playing).on(STOP).target(stopped))
        .unwrap();
    // Volume is an internal transition: no exit, no entry, state unchanged.
    t.transition(
        TransitionBuilder::new()
            .source(on)
            .on(VOLUME_UP)
            .effect(|player: &mut Player, _| {
                player.volume = player.volume.saturating_add(1);
                println!("  [Player] volume -> {}", player.volume);
            })
            .internal(),
    )
    .unwrap();

    let topology = Arc::new(t.build().unwrap());
    let mut player = Machine::new(topology, Player { volume: 5 });
    player.init();
    println!("Initial state: {:?}\n", player.current_state_name());

    println!("Power on (no history yet, default child applies):");
    player.dispatch(&Event::new(POWER));
    println!("  -> {:?}\n", player.current_state_name());

    println!("Start playback, raise the volume twice:");
    player.dispatch(&Event::new(PLAY));
    player.dispatch(&Event::new(VOLUME_UP));
    player.dispatch(&Event::new(VOLUME_UP));
    println!("  -> {:?} (volume changes never left it)\n", player.current_state_name());

    println!("Power off mid-playback:");
    player.dispatch(&Event::new(POWER));
    println!("  -> {:?}\n", player.current_state_name());

    println!("Power on again (history restores playback):");
    player.dispatch(&Event::new(POWER));
    println!("  -> {:?}\n", player.current_state_name());

    println!("=== Example Complete ===");
}
