//! Core matching types and logic.
//!
//! This module contains the pure core of the engine:
//! - Events and their kinds
//! - Structural templates with wildcard markers
//! - The tri-state [`Signal`] protocol
//! - Stateful [`Matcher`]s and their transitions
//!
//! Nothing in this module performs I/O or logging.

mod event;
mod matcher;
mod signal;
mod template;

pub use event::{Event, KIND_FIELD, PAYLOAD_FIELD};
pub use matcher::{GroupState, Matcher, Node, QueueState, TimesState};
pub use signal::Signal;
pub use template::{is_truthy, literal_eq, Template, Wildcard};
