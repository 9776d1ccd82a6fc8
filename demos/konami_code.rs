//! Konami Code
//!
//! This example detects the classic cheat code in a stream of key presses
//! and unlocks a bonus after the code is entered twice.
//!
//! Key concepts:
//! - `queue_strict` over a long list of templates
//! - `times` wrapped around a composite matcher
//! - Function reactions that unregister themselves
//!
//! Run with: cargo run --example konami_code

use event_sequences::builder::{queue_strict, times, Token};
use event_sequences::core::Event;
use event_sequences::engine::{Reaction, Recorder, SequenceEngine};
use event_sequences::template;
use tracing_subscriber::EnvFilter;

const CODE: [&str; 10] = [
    "up", "up", "down", "down", "left", "right", "left", "right", "b", "a",
];

fn key(name: &str) -> Event {
    Event::new("key/press").with("key", name)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("event_sequences=info".parse()?))
        .init();

    println!("=== Konami Code ===\n");

    let presses: Vec<Token> = CODE
        .iter()
        .map(|k| Token::from(template! { "type" => "key/press", "key" => *k }))
        .collect();
    let code = queue_strict(presses)?;
    println!("Pattern: {code}\n");

    let mut engine = SequenceEngine::new();
    engine.register(code.clone(), "cheat/lives");
    engine.register(
        times(code, 2)?,
        Reaction::function(|unregister, events| {
            unregister.unregister();
            Event::new("cheat/unlocked").with("presses", events.len())
        }),
    );

    // A fumbled attempt, then the code entered cleanly twice.
    let mut input: Vec<&str> = vec!["up", "up", "down", "left"];
    input.extend(CODE);
    input.extend(CODE);

    let mut recorder = Recorder::new();
    for name in input {
        engine.process_event(key(name), &mut recorder)?;
    }

    println!("Reactions:");
    for event in recorder.events() {
        println!("  {}", event.clone().into_value());
    }
    println!("\nLive sequences: {}", engine.live_count());

    println!("\n=== Example Complete ===");
    Ok(())
}
