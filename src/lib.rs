//! Event sequences: declarative pattern matching over event streams
//!
//! Compose patterns out of simple building blocks (a single event kind, a
//! structural template, repetition, ordered and unordered groups), register
//! them with a reaction, and feed the engine every event your application
//! dispatches. When a pattern completes, the engine resolves its reaction
//! and hands it back to you for dispatch.
//!
//! The matching logic is a pure core: matchers are plain data that step
//! through events and report a [`Signal`](core::Signal). The engine is the
//! imperative shell that owns registrations and talks to the host.
//!
//! # Core Concepts
//!
//! - **Event**: a JSON object with a string `type` field
//! - **Template**: a structural pattern with wildcard markers
//! - **Matcher**: stateful pattern built from the combinators in [`builder`]
//! - **Reaction**: the event to dispatch when a sequence completes
//!
//! # Example
//!
//! ```rust
//! use event_sequences::builder::PRESENT;
//! use event_sequences::core::Event;
//! use event_sequences::engine::{Recorder, SequenceEngine};
//! use event_sequences::template;
//! use serde_json::json;
//!
//! let mut engine = SequenceEngine::new();
//! let handle = engine
//!     .when("list/ready", |p| {
//!         p.queue_strict([
//!             p.simple("list/fetch")?,
//!             p.exact(template! {
//!                 "type" => "list/loaded",
//!                 "payload" => template! { "items" => PRESENT },
//!             })?,
//!         ])
//!     })
//!     .unwrap();
//!
//! let mut recorder = Recorder::new();
//! engine.process_event(Event::new("list/fetch"), &mut recorder).unwrap();
//! engine
//!     .process_event(
//!         Event::new("list/loaded").with_payload(json!({ "items": [1, 2] })),
//!         &mut recorder,
//!     )
//!     .unwrap();
//!
//! assert_eq!(recorder.kinds(), vec!["list/ready"]);
//! handle.unregister();
//! ```

pub mod builder;
pub mod core;
pub mod engine;

// Re-export commonly used types
pub use builder::{BuildError, Patterns, Token};
pub use core::{Event, Matcher, Signal, Template, Wildcard};
pub use engine::{
    Dispatcher, Effect, EngineBuilder, EngineError, Feedback, Reaction, Recorder,
    SequenceEngine, SharedEngine, UnregisterHandle,
};
