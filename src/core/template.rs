//! Structural templates for subset-matching events.
//!
//! A template is a tree whose leaves are either literal JSON values or
//! wildcard markers. Matching walks the template, never the event, so fields
//! the template does not mention are ignored.

use super::event::Event;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Marker used in a template in place of a literal value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Wildcard {
    /// The field must be defined (any value, including `null`).
    Present,
    /// The field must be absent.
    Missing,
    /// The field must be truthy.
    Truthy,
    /// The field must be falsey; an absent field is falsey.
    Falsey,
}

impl Wildcard {
    /// Apply the marker's predicate to a field that may be absent.
    pub fn check(self, value: Option<&Value>) -> bool {
        match self {
            Self::Present => value.is_some(),
            Self::Missing => value.is_none(),
            Self::Truthy => value.is_some_and(is_truthy),
            Self::Falsey => !value.is_some_and(is_truthy),
        }
    }
}

impl fmt::Display for Wildcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Present => "<present>",
            Self::Missing => "<missing>",
            Self::Truthy => "<truthy>",
            Self::Falsey => "<falsey>",
        };
        f.write_str(name)
    }
}

/// Loose boolean coercion of a JSON value.
///
/// `null`, `false`, `0`, `NaN` and `""` are falsey; everything else,
/// including empty arrays and objects, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A structural template.
///
/// # Example
///
/// ```rust
/// use event_sequences::core::{Event, Template, Wildcard};
/// use serde_json::json;
///
/// let template = Template::object()
///     .field("type", "list/loaded")
///     .field("payload", Template::object()
///         .field("items", Wildcard::Present)
///         .field("offset", 0))
///     .field("error", Wildcard::Falsey);
///
/// let loaded = Event::new("list/loaded").with_payload(json!({ "items": [], "offset": 0 }));
/// assert!(template.matches(&loaded));
///
/// let failed = loaded.clone().with("error", true);
/// assert!(!template.matches(&failed));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Template {
    /// Compared by JSON equality.
    Literal(Value),
    Wildcard(Wildcard),
    /// Every listed field must match; unlisted fields are ignored.
    Object(BTreeMap<String, Template>),
}

impl Template {
    /// An object template with no fields yet.
    pub fn object() -> Self {
        Self::Object(BTreeMap::new())
    }

    /// A literal that is compared as a whole, even if it is an object.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Add a field to an object template.
    ///
    /// Calling this on a literal or wildcard turns it into an object
    /// template holding only the new field.
    pub fn field(self, name: impl Into<String>, value: impl Into<Template>) -> Self {
        let mut fields = match self {
            Self::Object(fields) => fields,
            _ => BTreeMap::new(),
        };
        fields.insert(name.into(), value.into());
        Self::Object(fields)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Number of top-level fields, zero for non-object templates.
    pub fn len(&self) -> usize {
        match self {
            Self::Object(fields) => fields.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The kind, if this template is exactly `{ type: "<kind>" }`.
    pub fn kind_only(&self) -> Option<&str> {
        let Self::Object(fields) = self else {
            return None;
        };
        if fields.len() != 1 {
            return None;
        }
        match fields.get(super::event::KIND_FIELD) {
            Some(Self::Literal(Value::String(kind))) => Some(kind.as_str()),
            _ => None,
        }
    }

    /// Subset-match an event against this template.
    ///
    /// Only object templates can match an event.
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Self::Object(fields) => fields
                .iter()
                .all(|(name, template)| template.matches_value(event.get(name))),
            _ => false,
        }
    }

    /// Match a single, possibly absent, value.
    pub fn matches_value(&self, value: Option<&Value>) -> bool {
        match self {
            Self::Wildcard(marker) => marker.check(value),
            Self::Literal(expected) => value.is_some_and(|actual| literal_eq(expected, actual)),
            Self::Object(fields) => match value {
                Some(Value::Object(actual)) => fields
                    .iter()
                    .all(|(name, template)| template.matches_value(actual.get(name))),
                _ => false,
            },
        }
    }
}

/// Strict equality over JSON values, with numbers compared by value so that
/// `0` and `0.0` are equal.
pub fn literal_eq(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                return a == b;
            }
            if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                return a == b;
            }
            a.as_f64() == b.as_f64()
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| literal_eq(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(name, a)| b.get(name).is_some_and(|b| literal_eq(a, b)))
        }
        _ => expected == actual,
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Wildcard(marker) => write!(f, "{marker}"),
            Self::Object(fields) => {
                f.write_str("{")?;
                for (i, (name, template)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{name}:{template}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Objects become object templates recursively; everything else is a literal.
impl From<Value> for Template {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self::Object(
                fields
                    .into_iter()
                    .map(|(name, value)| (name, Template::from(value)))
                    .collect(),
            ),
            other => Self::Literal(other),
        }
    }
}

impl From<Wildcard> for Template {
    fn from(marker: Wildcard) -> Self {
        Self::Wildcard(marker)
    }
}

impl From<Event> for Template {
    fn from(event: Event) -> Self {
        Template::from(event.into_value())
    }
}

macro_rules! literal_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Template {
                fn from(value: $ty) -> Self {
                    Self::Literal(Value::from(value))
                }
            }
        )*
    };
}

literal_from!(&str, String, bool, i32, i64, u32, u64, f64);
