//! Macros for concise pattern construction.

/// Build an object [`Template`](crate::core::Template) from `field => value`
/// pairs. Values may be literals, wildcards, or nested templates.
///
/// # Example
///
/// ```
/// use event_sequences::template;
/// use event_sequences::builder::PRESENT;
///
/// let loaded = template! {
///     "type" => "list/loaded",
///     "payload" => template! { "items" => PRESENT, "offset" => 0 },
/// };
/// assert_eq!(loaded.len(), 2);
/// ```
#[macro_export]
macro_rules! template {
    ( $( $field:expr => $value:expr ),* $(,)? ) => {{
        let template = $crate::core::Template::object();
        $( let template = template.field($field, $value); )*
        template
    }};
}

/// Build a `Vec<Token>` from heterogeneous pattern descriptions.
///
/// # Example
///
/// ```
/// use event_sequences::{template, tokens};
/// use event_sequences::builder::{queue, times};
///
/// let matcher = queue(tokens![
///     "session/start",
///     times("page/view", 3).unwrap(),
///     template! { "type" => "session/end", "reason" => "logout" },
/// ]);
/// assert!(matcher.is_ok());
/// ```
#[macro_export]
macro_rules! tokens {
    ( $( $token:expr ),* $(,)? ) => {
        vec![ $( $crate::builder::Token::from($token) ),* ]
    };
}

#[cfg(test)]
mod tests {
    use crate::builder::{Token, FALSEY, MISSING};
    use crate::core::{Event, Template, Wildcard};
    use serde_json::json;

    #[test]
    fn template_macro_builds_nested_objects() {
        let built = template! {
            "type" => "X",
            "payload" => template! { "offset" => 0 },
            "error" => FALSEY,
        };

        let expected = Template::object()
            .field("type", "X")
            .field("payload", Template::object().field("offset", 0))
            .field("error", Wildcard::Falsey);

        assert_eq!(built, expected);
    }

    #[test]
    fn template_macro_accepts_trailing_comma_and_empty() {
        let empty = template! {};
        assert!(empty.is_empty());
        assert!(empty.is_object());

        let single = template! { "meta" => MISSING, };
        assert!(single.matches(&Event::new("anything")));
        assert!(!single.matches(&Event::new("anything").with("meta", json!({}))));
    }

    #[test]
    fn tokens_macro_mixes_shapes() {
        let list = tokens!["a", json!({ "type": "b" }), Event::new("c")];
        assert_eq!(list.len(), 3);
        assert_eq!(list[0], Token::Kind("a".to_string()));
    }
}
