//! Pattern tokens, the normalizer, and the combinator functions.

use crate::builder::error::BuildError;
use crate::core::{Event, Matcher, Template, Wildcard};
use serde_json::Value;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Any supported pattern description, before normalization.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// Matches events of this kind.
    Kind(String),
    /// Subset-matches events; `{ type: "<kind>" }` alone acts as a kind.
    Template(Template),
    /// Already normalized, passed through unchanged.
    Matcher(Matcher),
    /// Sugar for [`queue`].
    List(Vec<Token>),
}

impl From<&str> for Token {
    fn from(kind: &str) -> Self {
        Self::Kind(kind.to_string())
    }
}

impl From<String> for Token {
    fn from(kind: String) -> Self {
        Self::Kind(kind)
    }
}

impl From<Template> for Token {
    fn from(template: Template) -> Self {
        Self::Template(template)
    }
}

/// JSON strings are kinds and arrays are lists; anything else is a template.
impl From<Value> for Token {
    fn from(value: Value) -> Self {
        match value {
            Value::String(kind) => Self::Kind(kind),
            Value::Array(tokens) => tokens.into(),
            other => Self::Template(Template::from(other)),
        }
    }
}

impl From<Event> for Token {
    fn from(event: Event) -> Self {
        Self::Template(Template::from(event))
    }
}

impl From<Matcher> for Token {
    fn from(matcher: Matcher) -> Self {
        Self::Matcher(matcher)
    }
}

impl<T: Into<Token>> From<Vec<T>> for Token {
    fn from(tokens: Vec<T>) -> Self {
        Self::List(tokens.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Token>, const N: usize> From<[T; N]> for Token {
    fn from(tokens: [T; N]) -> Self {
        Self::List(tokens.into_iter().map(Into::into).collect())
    }
}

fn normalize(combinator: &'static str, token: Token) -> Result<Matcher, BuildError> {
    match token {
        Token::Kind(kind) if kind.is_empty() => Err(BuildError::InvalidToken {
            combinator,
            reason: "kind must not be empty".to_string(),
        }),
        Token::Kind(kind) => Ok(Matcher::kind(kind)),
        Token::Template(template) => {
            check_template(combinator, &template)?;
            match template.kind_only() {
                Some("") => Err(BuildError::InvalidToken {
                    combinator,
                    reason: "kind must not be empty".to_string(),
                }),
                Some(kind) => Ok(Matcher::kind(kind)),
                None => Ok(Matcher::exact(template)),
            }
        }
        Token::Matcher(matcher) => Ok(matcher),
        Token::List(tokens) => queue_with("queue", tokens, false),
    }
}

fn check_template(combinator: &'static str, template: &Template) -> Result<(), BuildError> {
    if !template.is_object() {
        return Err(BuildError::InvalidToken {
            combinator,
            reason: format!("template must be an object, got {template}"),
        });
    }
    if template.is_empty() {
        return Err(BuildError::InvalidToken {
            combinator,
            reason: "template has no fields".to_string(),
        });
    }
    Ok(())
}

/// Normalize every token, reporting all invalid ones rather than the first.
fn normalize_list(combinator: &'static str, tokens: Vec<Token>) -> Result<Vec<Matcher>, BuildError> {
    if tokens.is_empty() {
        return Err(BuildError::EmptyTokens { combinator });
    }

    let checks: Vec<Validation<Matcher, NonEmptyVec<BuildError>>> = tokens
        .into_iter()
        .enumerate()
        .map(|(index, token)| match normalize(combinator, token) {
            Ok(matcher) => Validation::success(matcher),
            Err(err) => Validation::fail(BuildError::InvalidTokenAt {
                combinator,
                index,
                reason: err.to_string(),
            }),
        })
        .collect();

    match Validation::all_vec(checks) {
        Validation::Success(matchers) => Ok(matchers),
        Validation::Failure(errors) => Err(BuildError::InvalidTokens {
            combinator,
            errors: errors.iter().cloned().collect(),
        }),
    }
}

fn collect<I>(tokens: I) -> Vec<Token>
where
    I: IntoIterator,
    I::Item: Into<Token>,
{
    tokens.into_iter().map(Into::into).collect()
}

fn times_with(
    combinator: &'static str,
    token: Token,
    times: usize,
    strict: bool,
) -> Result<Matcher, BuildError> {
    if times == 0 {
        return Err(BuildError::InvalidCount { combinator });
    }
    let inner = normalize(combinator, token)?;
    Ok(Matcher::times(inner, times, strict))
}

fn queue_with(
    combinator: &'static str,
    tokens: Vec<Token>,
    strict: bool,
) -> Result<Matcher, BuildError> {
    Ok(Matcher::queue(normalize_list(combinator, tokens)?, strict))
}

/// Normalize any token into a matcher.
///
/// Normalizing an existing matcher returns it unchanged; normalizing the
/// same description twice yields two matchers with independent progress.
///
/// # Example
///
/// ```rust
/// use event_sequences::builder::simple;
/// use event_sequences::core::{Event, Signal};
///
/// let mut matcher = simple("cart/add").unwrap();
/// assert_eq!(matcher.step(&Event::new("cart/add")), Signal::Complete);
/// assert_eq!(matcher.step(&Event::new("cart/remove")), Signal::Reject);
/// ```
pub fn simple(token: impl Into<Token>) -> Result<Matcher, BuildError> {
    normalize("simple", token.into())
}

/// Subset-match events against a structural template.
pub fn exact(template: impl Into<Template>) -> Result<Matcher, BuildError> {
    let template = template.into();
    check_template("exact", &template)?;
    Ok(Matcher::exact(template))
}

/// Mark a pattern one-shot: the engine unregisters it after it first
/// completes.
pub fn once(token: impl Into<Token>) -> Result<Matcher, BuildError> {
    normalize("once", token.into()).map(Matcher::into_once)
}

/// Complete on every `n`-th completion of `token`, ignoring events in
/// between.
pub fn times(token: impl Into<Token>, n: usize) -> Result<Matcher, BuildError> {
    times_with("times", token.into(), n, false)
}

/// Like [`times`], but any other event in between resets the count.
pub fn times_strict(token: impl Into<Token>, n: usize) -> Result<Matcher, BuildError> {
    times_with("times_strict", token.into(), n, true)
}

/// Complete once every token has completed at least once, in any order.
pub fn all<I>(tokens: I) -> Result<Matcher, BuildError>
where
    I: IntoIterator,
    I::Item: Into<Token>,
{
    Ok(Matcher::all(normalize_list("all", collect(tokens))?, false))
}

/// Like [`all`], but each event must satisfy exactly one new branch.
pub fn all_strict<I>(tokens: I) -> Result<Matcher, BuildError>
where
    I: IntoIterator,
    I::Item: Into<Token>,
{
    Ok(Matcher::all(normalize_list("all_strict", collect(tokens))?, true))
}

/// Complete as soon as any token completes.
pub fn any<I>(tokens: I) -> Result<Matcher, BuildError>
where
    I: IntoIterator,
    I::Item: Into<Token>,
{
    Ok(Matcher::any(normalize_list("any", collect(tokens))?, false))
}

/// Like [`any`], but an event no branch accepts resets every branch.
pub fn any_strict<I>(tokens: I) -> Result<Matcher, BuildError>
where
    I: IntoIterator,
    I::Item: Into<Token>,
{
    Ok(Matcher::any(normalize_list("any_strict", collect(tokens))?, true))
}

/// Complete when the tokens complete in order, ignoring unrelated events.
pub fn queue<I>(tokens: I) -> Result<Matcher, BuildError>
where
    I: IntoIterator,
    I::Item: Into<Token>,
{
    queue_with("queue", collect(tokens), false)
}

/// Like [`queue`], but any out-of-order event resets the queue.
pub fn queue_strict<I>(tokens: I) -> Result<Matcher, BuildError>
where
    I: IntoIterator,
    I::Item: Into<Token>,
{
    queue_with("queue_strict", collect(tokens), true)
}

/// The pattern-building surface handed to sequence builder callbacks.
///
/// # Example
///
/// ```rust
/// use event_sequences::builder::Patterns;
/// use event_sequences::template;
///
/// let p = Patterns;
/// let checkout = p.queue_strict([
///     p.simple("cart/open").unwrap(),
///     p.times("cart/add", 2).unwrap(),
///     p.exact(template! { "type" => "cart/pay", "error" => p.falsey() }).unwrap(),
/// ]);
/// assert!(checkout.is_ok());
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Patterns;

impl Patterns {
    pub fn simple(&self, token: impl Into<Token>) -> Result<Matcher, BuildError> {
        simple(token)
    }

    pub fn exact(&self, template: impl Into<Template>) -> Result<Matcher, BuildError> {
        exact(template)
    }

    pub fn once(&self, token: impl Into<Token>) -> Result<Matcher, BuildError> {
        once(token)
    }

    pub fn times(&self, token: impl Into<Token>, n: usize) -> Result<Matcher, BuildError> {
        times(token, n)
    }

    pub fn times_strict(&self, token: impl Into<Token>, n: usize) -> Result<Matcher, BuildError> {
        times_strict(token, n)
    }

    pub fn all<I>(&self, tokens: I) -> Result<Matcher, BuildError>
    where
        I: IntoIterator,
        I::Item: Into<Token>,
    {
        all(tokens)
    }

    pub fn all_strict<I>(&self, tokens: I) -> Result<Matcher, BuildError>
    where
        I: IntoIterator,
        I::Item: Into<Token>,
    {
        all_strict(tokens)
    }

    pub fn any<I>(&self, tokens: I) -> Result<Matcher, BuildError>
    where
        I: IntoIterator,
        I::Item: Into<Token>,
    {
        any(tokens)
    }

    pub fn any_strict<I>(&self, tokens: I) -> Result<Matcher, BuildError>
    where
        I: IntoIterator,
        I::Item: Into<Token>,
    {
        any_strict(tokens)
    }

    pub fn queue<I>(&self, tokens: I) -> Result<Matcher, BuildError>
    where
        I: IntoIterator,
        I::Item: Into<Token>,
    {
        queue(tokens)
    }

    pub fn queue_strict<I>(&self, tokens: I) -> Result<Matcher, BuildError>
    where
        I: IntoIterator,
        I::Item: Into<Token>,
    {
        queue_strict(tokens)
    }

    pub fn present(&self) -> Wildcard {
        Wildcard::Present
    }

    pub fn missing(&self) -> Wildcard {
        Wildcard::Missing
    }

    pub fn truthy(&self) -> Wildcard {
        Wildcard::Truthy
    }

    pub fn falsey(&self) -> Wildcard {
        Wildcard::Falsey
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Node, Signal};
    use serde_json::json;

    fn run(matcher: &mut Matcher, kinds: &[&str]) -> Vec<Signal> {
        kinds.iter().map(|k| matcher.step(&Event::new(*k))).collect()
    }

    #[test]
    fn kind_strings_normalize_to_kind_matchers() {
        let m = simple("a").unwrap();
        assert!(matches!(m.node(), Node::Kind(kind) if kind == "a"));
        assert_eq!(m.description(), "SINGLE:(a)");
    }

    #[test]
    fn kind_only_templates_normalize_to_kind_matchers() {
        let from_json = simple(json!({ "type": "a" })).unwrap();
        let from_event = simple(Event::new("a")).unwrap();
        assert_eq!(from_json, simple("a").unwrap());
        assert_eq!(from_event, simple("a").unwrap());
    }

    #[test]
    fn richer_templates_normalize_to_exact() {
        let m = simple(json!({ "type": "a", "error": true })).unwrap();
        assert!(matches!(m.node(), Node::Exact(_)));

        let wild = simple(Template::object().field("type", Wildcard::Present)).unwrap();
        assert!(matches!(wild.node(), Node::Exact(_)));
    }

    #[test]
    fn lists_normalize_to_queue() {
        let m = simple(["a", "b"]).unwrap();
        assert_eq!(m, queue(["a", "b"]).unwrap());
    }

    #[test]
    fn normalization_is_idempotent() {
        let once_a = once("a").unwrap();
        assert_eq!(simple(once_a.clone()).unwrap(), once_a);

        let q = queue(["a", "b"]).unwrap();
        assert_eq!(simple(simple(q.clone()).unwrap()).unwrap(), q);
    }

    #[test]
    fn reused_tokens_do_not_share_state() {
        let a = simple("a").unwrap();
        let mut m = all([times(a.clone(), 2).unwrap(), times(a, 3).unwrap()]).unwrap();
        assert_eq!(
            run(&mut m, &["a", "a", "a"]),
            vec![Signal::Continue, Signal::Continue, Signal::Complete]
        );
    }

    #[test]
    fn invalid_tokens_fail_at_construction() {
        assert_eq!(
            simple(""),
            Err(BuildError::InvalidToken {
                combinator: "simple",
                reason: "kind must not be empty".to_string(),
            })
        );
        assert!(matches!(
            simple(json!(42)),
            Err(BuildError::InvalidToken { combinator: "simple", .. })
        ));
        assert!(matches!(
            exact(json!({})),
            Err(BuildError::InvalidToken { combinator: "exact", .. })
        ));
        assert!(matches!(
            once(json!({ "type": "" })),
            Err(BuildError::InvalidToken { combinator: "once", .. })
        ));
    }

    #[test]
    fn empty_lists_name_the_combinator() {
        let none: Vec<Token> = Vec::new();
        assert_eq!(
            all(none.clone()),
            Err(BuildError::EmptyTokens { combinator: "all" })
        );
        assert_eq!(
            queue_strict(none),
            Err(BuildError::EmptyTokens { combinator: "queue_strict" })
        );
    }

    #[test]
    fn list_errors_report_every_bad_position() {
        let tokens: Vec<Token> = vec!["a".into(), "".into(), "b".into(), json!(null).into()];
        let err = any(tokens).unwrap_err();

        match err {
            BuildError::InvalidTokens { combinator, errors } => {
                assert_eq!(combinator, "any");
                let positions: Vec<usize> = errors
                    .iter()
                    .filter_map(|e| match e {
                        BuildError::InvalidTokenAt { index, .. } => Some(*index),
                        _ => None,
                    })
                    .collect();
                assert_eq!(positions, vec![1, 3]);
            }
            other => panic!("Expected InvalidTokens, got {other:?}"),
        }
    }

    #[test]
    fn zero_count_is_rejected() {
        assert_eq!(
            times_strict("a", 0),
            Err(BuildError::InvalidCount { combinator: "times_strict" })
        );
    }

    #[test]
    fn exact_keeps_kind_only_templates_exact() {
        let m = exact(json!({ "type": "a" })).unwrap();
        assert!(matches!(m.node(), Node::Exact(_)));
        assert_eq!(m.description(), r#"EXACT:({type:"a"})"#);
    }

    #[test]
    fn patterns_expose_wildcards() {
        let p = Patterns;
        assert_eq!(p.present(), Wildcard::Present);
        assert_eq!(p.missing(), Wildcard::Missing);
        assert_eq!(p.truthy(), Wildcard::Truthy);
        assert_eq!(p.falsey(), Wildcard::Falsey);
    }
}
