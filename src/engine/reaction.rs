//! Reactions: what to dispatch when a sequence completes.

use crate::core::Event;
use crate::engine::registry::UnregisterHandle;
use serde_json::Value;
use std::fmt;

/// Payload field that receives the accumulated events.
pub const ACCUMULATED_FIELD: &str = "events";

/// Signature of function reactions.
pub type ReactionFn = Box<dyn FnMut(&UnregisterHandle, Vec<Event>) -> Event + Send>;

/// A reaction resolved once at registration time.
pub(crate) type Resolver = Box<dyn FnMut(Vec<Event>, &UnregisterHandle) -> Event + Send>;

/// The effect description dispatched when a sequence completes.
pub enum Reaction {
    /// Dispatch `{ type: kind, payload: { events: [...] } }`.
    Kind(String),
    /// Dispatch a copy of the event with the accumulated events merged into
    /// its payload.
    Template(Event),
    /// Invoke the function and dispatch its result.
    Function(ReactionFn),
    /// Dispatch the event as-is; accumulated events are dropped.
    Literal(Event),
}

impl Reaction {
    pub fn kind(kind: impl Into<String>) -> Self {
        Self::Kind(kind.into())
    }

    pub fn template(event: Event) -> Self {
        Self::Template(event)
    }

    pub fn literal(event: Event) -> Self {
        Self::Literal(event)
    }

    /// A reaction computed from the unregister handle and the events that
    /// completed the sequence.
    ///
    /// # Example
    ///
    /// ```rust
    /// use event_sequences::core::Event;
    /// use event_sequences::engine::Reaction;
    ///
    /// let reaction = Reaction::function(|unregister, events| {
    ///     if events.len() > 3 {
    ///         unregister.unregister();
    ///     }
    ///     Event::new("burst").with_payload(events.len() as u64)
    /// });
    /// ```
    pub fn function<F>(f: F) -> Self
    where
        F: FnMut(&UnregisterHandle, Vec<Event>) -> Event + Send + 'static,
    {
        Self::Function(Box::new(f))
    }

    pub(crate) fn into_resolver(self) -> Resolver {
        match self {
            Self::Kind(kind) => Box::new(move |events: Vec<Event>, _: &UnregisterHandle| {
                Event::new(kind.clone()).with_payload_field(ACCUMULATED_FIELD, to_array(events))
            }),
            Self::Template(template) => Box::new(move |events: Vec<Event>, _: &UnregisterHandle| {
                template
                    .clone()
                    .with_payload_field(ACCUMULATED_FIELD, to_array(events))
            }),
            Self::Function(mut f) => {
                Box::new(move |events: Vec<Event>, unregister: &UnregisterHandle| {
                    f(unregister, events)
                })
            }
            Self::Literal(event) => {
                Box::new(move |_: Vec<Event>, _: &UnregisterHandle| event.clone())
            }
        }
    }
}

fn to_array(events: Vec<Event>) -> Value {
    Value::Array(events.into_iter().map(Event::into_value).collect())
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kind(kind) => write!(f, "{kind}"),
            Self::Template(event) | Self::Literal(event) => write!(f, "{event}"),
            Self::Function(_) => write!(f, "<fn>"),
        }
    }
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            Self::Template(event) => f.debug_tuple("Template").field(event).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Literal(event) => f.debug_tuple("Literal").field(event).finish(),
        }
    }
}

impl From<&str> for Reaction {
    fn from(kind: &str) -> Self {
        Self::kind(kind)
    }
}

impl From<String> for Reaction {
    fn from(kind: String) -> Self {
        Self::Kind(kind)
    }
}

impl From<Event> for Reaction {
    fn from(event: Event) -> Self {
        Self::Literal(event)
    }
}

/// A resolved reaction, handed to the host's dispatcher.
#[derive(Clone, Debug)]
pub struct Effect {
    pub event: Event,
    /// Cancels the sequence that produced this effect.
    pub unregister: UnregisterHandle,
}
