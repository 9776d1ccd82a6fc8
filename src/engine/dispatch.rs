//! The boundary between the engine and the host's dispatch function.

use crate::core::Event;
use crate::engine::reaction::Effect;

/// What the host did with a dispatched effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Feedback {
    /// The effect left the engine's view.
    #[default]
    Consume,
    /// The effect's event should be observed by the engine as well, as when
    /// the host routes dispatched events back through its interception point.
    Observe,
}

/// Receives resolved reactions.
///
/// Implemented for any `FnMut(&Effect) -> Feedback` closure.
pub trait Dispatcher {
    fn dispatch(&mut self, effect: &Effect) -> Feedback;
}

impl<F> Dispatcher for F
where
    F: FnMut(&Effect) -> Feedback,
{
    fn dispatch(&mut self, effect: &Effect) -> Feedback {
        self(effect)
    }
}

/// A dispatcher that records every effect, for tests and inspection.
#[derive(Debug, Default)]
pub struct Recorder {
    effects: Vec<Effect>,
    feedback: Feedback,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder that asks the engine to observe every dispatched event.
    pub fn observing() -> Self {
        Self {
            effects: Vec::new(),
            feedback: Feedback::Observe,
        }
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn events(&self) -> Vec<&Event> {
        self.effects.iter().map(|e| &e.event).collect()
    }

    /// Kinds of the recorded events, in dispatch order.
    pub fn kinds(&self) -> Vec<&str> {
        self.effects
            .iter()
            .filter_map(|e| e.event.kind())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    pub fn take(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }
}

impl Dispatcher for Recorder {
    fn dispatch(&mut self, effect: &Effect) -> Feedback {
        self.effects.push(effect.clone());
        self.feedback
    }
}
