//! Events observed by the engine.
//!
//! An event is a JSON object carrying a `type` discriminator (its *kind*)
//! plus arbitrary additional fields, in the shape of a flux-standard action.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Field holding an event's kind.
pub const KIND_FIELD: &str = "type";

/// Field holding an event's payload.
pub const PAYLOAD_FIELD: &str = "payload";

/// A discrete, typed occurrence fed into the engine.
///
/// Events are immutable once observed; the engine clones them into the
/// accumulation buffers of the sequences they advance.
///
/// # Example
///
/// ```rust
/// use event_sequences::core::Event;
/// use serde_json::json;
///
/// let event = Event::new("cart/add").with_payload(json!({ "sku": "A-1", "qty": 2 }));
///
/// assert_eq!(event.kind(), Some("cart/add"));
/// assert_eq!(event.get("payload").and_then(|p| p.get("qty")), Some(&json!(2)));
/// ```
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event {
    fields: Map<String, Value>,
}

impl Event {
    /// Create an event of the given kind with no other fields.
    pub fn new(kind: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(KIND_FIELD.to_string(), Value::String(kind.into()));
        Self { fields }
    }

    /// Build an event from an arbitrary JSON value.
    ///
    /// Returns `None` unless the value is an object. The object does not need
    /// a kind; such events are refused by the default admission check and
    /// rejected by every kind matcher.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Set a field, returning the updated event.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Set the `payload` field.
    pub fn with_payload(self, payload: impl Into<Value>) -> Self {
        self.with(PAYLOAD_FIELD, payload)
    }

    /// Insert a field into the payload object.
    ///
    /// A missing or non-object payload is replaced by an object holding only
    /// the new field.
    pub fn with_payload_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        match self.fields.get_mut(PAYLOAD_FIELD) {
            Some(Value::Object(payload)) => {
                payload.insert(field.into(), value.into());
            }
            _ => {
                let mut payload = Map::new();
                payload.insert(field.into(), value.into());
                self.fields
                    .insert(PAYLOAD_FIELD.to_string(), Value::Object(payload));
            }
        }
        self
    }

    /// The event's kind, if it carries a string `type` field.
    pub fn kind(&self) -> Option<&str> {
        self.fields.get(KIND_FIELD).and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn payload(&self) -> Option<&Value> {
        self.get(PAYLOAD_FIELD)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Minimal well-formedness: the event has a non-empty string kind.
    pub fn is_well_formed(&self) -> bool {
        self.kind().is_some_and(|kind| !kind.is_empty())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl From<Event> for Value {
    fn from(event: Event) -> Self {
        event.into_value()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "{kind}"),
            None => write!(f, "<untyped>"),
        }
    }
}
