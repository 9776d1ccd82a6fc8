//! Stateful matchers and their transition logic.
//!
//! A [`Matcher`] is plain data: a tagged [`Node`] holding the pattern and its
//! progress (counts, satisfied branches, cursor). Feeding it an event with
//! [`Matcher::step`] advances that progress and yields a [`Signal`];
//! [`Matcher::reset`] returns it, and every nested matcher, to the initial
//! state.
//!
//! Matchers are built and validated by the functions in
//! [`crate::builder`]; the constructors here assume valid input.

use super::event::Event;
use super::signal::Signal;
use super::template::Template;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stateful predicate over the event stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matcher {
    description: String,
    repeatable: bool,
    node: Node,
}

/// The pattern a matcher implements, with its progress.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Completes on any event of this kind.
    Kind(String),
    /// Completes on any event the template subset-matches.
    Exact(Template),
    Times(TimesState),
    All(GroupState),
    Any(GroupState),
    Queue(QueueState),
}

/// Progress of a counted matcher.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimesState {
    pub inner: Box<Matcher>,
    pub times: usize,
    pub strict: bool,
    /// Completions of `inner` since the last reset, always below `times`.
    pub count: usize,
}

/// Progress of an `all` or `any` group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupState {
    pub branches: Vec<Matcher>,
    /// Branches that completed since the last reset. Unused by `any`.
    pub satisfied: Vec<bool>,
    pub strict: bool,
}

/// Progress of an ordered queue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueueState {
    pub branches: Vec<Matcher>,
    pub cursor: usize,
    pub strict: bool,
}

impl Matcher {
    fn from_node(description: String, node: Node) -> Self {
        Self {
            description,
            repeatable: true,
            node,
        }
    }

    pub(crate) fn kind(kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self::from_node(format!("SINGLE:({kind})"), Node::Kind(kind))
    }

    pub(crate) fn exact(template: Template) -> Self {
        Self::from_node(format!("EXACT:({template})"), Node::Exact(template))
    }

    pub(crate) fn times(inner: Matcher, times: usize, strict: bool) -> Self {
        let tag = if strict { "TIMES_STRICT" } else { "TIMES" };
        let description = format!("{tag}:({inner} x {times})");
        Self::from_node(
            description,
            Node::Times(TimesState {
                inner: Box::new(inner),
                times,
                strict,
                count: 0,
            }),
        )
    }

    pub(crate) fn all(branches: Vec<Matcher>, strict: bool) -> Self {
        let tag = if strict { "ALL_STRICT" } else { "ALL" };
        let description = format!("{tag}:({})", join(&branches));
        let satisfied = vec![false; branches.len()];
        Self::from_node(
            description,
            Node::All(GroupState {
                branches,
                satisfied,
                strict,
            }),
        )
    }

    pub(crate) fn any(branches: Vec<Matcher>, strict: bool) -> Self {
        let tag = if strict { "ANY_STRICT" } else { "ANY" };
        let description = format!("{tag}:({})", join(&branches));
        Self::from_node(
            description,
            Node::Any(GroupState {
                branches,
                satisfied: Vec::new(),
                strict,
            }),
        )
    }

    pub(crate) fn queue(branches: Vec<Matcher>, strict: bool) -> Self {
        let tag = if strict { "QUEUE_STRICT" } else { "QUEUE" };
        let description = format!("{tag}:({})", join(&branches));
        Self::from_node(
            description,
            Node::Queue(QueueState {
                branches,
                cursor: 0,
                strict,
            }),
        )
    }

    /// Mark this matcher one-shot.
    pub(crate) fn into_once(mut self) -> Self {
        if self.repeatable {
            self.description = format!("ONCE:({})", self.description);
            self.repeatable = false;
        }
        self
    }

    /// Human-readable description, used for logging and diagnostics.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// `false` once wrapped by `once`: the engine unregisters it after its
    /// first completion.
    pub fn is_repeatable(&self) -> bool {
        self.repeatable
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Feed one event, advancing internal progress.
    pub fn step(&mut self, event: &Event) -> Signal {
        match &mut self.node {
            Node::Kind(kind) => {
                if event.kind() == Some(kind.as_str()) {
                    Signal::Complete
                } else {
                    Signal::Reject
                }
            }
            Node::Exact(template) => {
                if template.matches(event) {
                    Signal::Complete
                } else {
                    Signal::Reject
                }
            }
            Node::Times(state) => state.step(event),
            Node::All(state) => state.step_all(event),
            Node::Any(state) => state.step_any(event),
            Node::Queue(state) => state.step(event),
        }
    }

    /// Return to the initial state, resetting every nested matcher.
    pub fn reset(&mut self) {
        match &mut self.node {
            Node::Kind(_) | Node::Exact(_) => {}
            Node::Times(state) => state.reset(),
            Node::All(state) | Node::Any(state) => state.reset(),
            Node::Queue(state) => state.reset(),
        }
    }

    /// Pure form of [`step`](Self::step): the successor matcher and the
    /// signal, leaving `self` untouched.
    pub fn transition(&self, event: &Event) -> (Self, Signal) {
        let mut next = self.clone();
        let signal = next.step(event);
        (next, signal)
    }

    /// `true` if no progress has been recorded since the last reset.
    pub fn is_idle(&self) -> bool {
        match &self.node {
            Node::Kind(_) | Node::Exact(_) => true,
            Node::Times(state) => state.count == 0 && state.inner.is_idle(),
            Node::All(state) | Node::Any(state) => {
                !state.satisfied.iter().any(|s| *s)
                    && state.branches.iter().all(Matcher::is_idle)
            }
            Node::Queue(state) => {
                state.cursor == 0 && state.branches.iter().all(Matcher::is_idle)
            }
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

fn join(branches: &[Matcher]) -> String {
    branches
        .iter()
        .map(Matcher::description)
        .collect::<Vec<_>>()
        .join(",")
}

fn reset_all(branches: &mut [Matcher]) {
    branches.iter_mut().for_each(Matcher::reset);
}

impl TimesState {
    fn step(&mut self, event: &Event) -> Signal {
        match self.inner.step(event) {
            Signal::Complete => {
                self.count = (self.count + 1) % self.times.max(1);
                if self.count == 0 {
                    Signal::Complete
                } else {
                    Signal::Continue
                }
            }
            Signal::Continue => Signal::Continue,
            Signal::Reject if self.strict => {
                self.reset();
                Signal::Reject
            }
            // Noise between occurrences keeps the count.
            Signal::Reject => Signal::Continue,
        }
    }

    fn reset(&mut self) {
        self.count = 0;
        self.inner.reset();
    }
}

impl GroupState {
    fn step_all(&mut self, event: &Event) -> Signal {
        if self.satisfied.len() != self.branches.len() {
            self.satisfied = vec![false; self.branches.len()];
        }

        let mut newly_satisfied = 0;
        let mut in_progress = false;

        // Every branch sees every event, satisfied or not.
        for (branch, satisfied) in self.branches.iter_mut().zip(self.satisfied.iter_mut()) {
            let signal = branch.step(event);
            if *satisfied {
                continue;
            }
            match signal {
                Signal::Complete => {
                    *satisfied = true;
                    newly_satisfied += 1;
                }
                Signal::Continue => in_progress = true,
                Signal::Reject => {}
            }
        }

        if self.strict && (newly_satisfied > 1 || (newly_satisfied == 0 && !in_progress)) {
            self.reset();
            return Signal::Reject;
        }

        if self.satisfied.iter().all(|s| *s) {
            self.reset();
            return Signal::Complete;
        }

        Signal::Continue
    }

    fn step_any(&mut self, event: &Event) -> Signal {
        let mut completed = false;
        let mut in_progress = false;

        for branch in &mut self.branches {
            match branch.step(event) {
                Signal::Complete => completed = true,
                Signal::Continue => in_progress = true,
                Signal::Reject => {}
            }
        }

        if completed {
            self.reset();
            Signal::Complete
        } else if self.strict && !in_progress {
            self.reset();
            Signal::Reject
        } else {
            Signal::Continue
        }
    }

    fn reset(&mut self) {
        self.satisfied.iter_mut().for_each(|s| *s = false);
        reset_all(&mut self.branches);
    }
}

impl QueueState {
    fn step(&mut self, event: &Event) -> Signal {
        let Some(current) = self.branches.get_mut(self.cursor) else {
            self.reset();
            return Signal::Reject;
        };

        match current.step(event) {
            Signal::Complete => {
                self.cursor = (self.cursor + 1) % self.branches.len();
                if self.cursor == 0 {
                    reset_all(&mut self.branches);
                    Signal::Complete
                } else {
                    Signal::Continue
                }
            }
            Signal::Continue => Signal::Continue,
            Signal::Reject if self.strict => {
                self.reset();
                Signal::Reject
            }
            Signal::Reject if self.cursor > 0 => Signal::Continue,
            Signal::Reject => Signal::Reject,
        }
    }

    fn reset(&mut self) {
        self.cursor = 0;
        reset_all(&mut self.branches);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Wildcard;
    use serde_json::json;

    fn ev(kind: &str) -> Event {
        Event::new(kind)
    }

    fn feed(matcher: &mut Matcher, kinds: &[&str]) -> Vec<Signal> {
        kinds.iter().map(|k| matcher.step(&ev(k))).collect()
    }

    use Signal::{Complete as C, Continue as K, Reject as R};

    #[test]
    fn kind_matcher_is_single_shot() {
        let mut m = Matcher::kind("a");
        assert_eq!(feed(&mut m, &["a", "b", "a"]), vec![C, R, C]);
        assert_eq!(m.description(), "SINGLE:(a)");
    }

    #[test]
    fn exact_matcher_never_continues() {
        let mut m = Matcher::exact(
            Template::object()
                .field("type", "X")
                .field("error", Wildcard::Falsey),
        );
        assert_eq!(m.step(&ev("X")), C);
        assert_eq!(m.step(&ev("X").with("error", json!(true))), R);
        assert_eq!(m.step(&ev("Y")), R);
    }

    #[test]
    fn times_counts_through_noise() {
        let mut m = Matcher::times(Matcher::kind("a"), 2, false);
        assert_eq!(feed(&mut m, &["a", "b", "a", "a", "a"]), vec![K, K, C, K, C]);
        assert_eq!(m.description(), "TIMES:(SINGLE:(a) x 2)");
    }

    #[test]
    fn times_strict_resets_on_noise() {
        let mut m = Matcher::times(Matcher::kind("a"), 2, true);
        assert_eq!(feed(&mut m, &["a", "b", "a", "a"]), vec![K, R, K, C]);
        assert_eq!(m.description(), "TIMES_STRICT:(SINGLE:(a) x 2)");
    }

    #[test]
    fn times_of_one_completes_every_time() {
        let mut m = Matcher::times(Matcher::kind("a"), 1, true);
        assert_eq!(feed(&mut m, &["a", "a"]), vec![C, C]);
    }

    #[test]
    fn queue_advances_in_order() {
        let mut m = Matcher::queue(vec![Matcher::kind("a"), Matcher::kind("b")], false);
        assert_eq!(feed(&mut m, &["b", "a", "c", "a", "b"]), vec![R, K, K, K, C]);
        assert!(m.is_idle());
    }

    #[test]
    fn queue_strict_resets_on_interruption() {
        let mut m = Matcher::queue(vec![Matcher::kind("a"), Matcher::kind("b")], true);
        assert_eq!(feed(&mut m, &["a", "c", "b"]), vec![K, R, R]);
        assert_eq!(feed(&mut m, &["a", "b", "a", "b"]), vec![K, C, K, C]);
        assert_eq!(m.description(), "QUEUE_STRICT:(SINGLE:(a),SINGLE:(b))");
    }

    #[test]
    fn queue_forwards_nested_progress() {
        let inner = Matcher::times(Matcher::kind("a"), 2, false);
        let mut m = Matcher::queue(vec![inner, Matcher::kind("b")], true);
        assert_eq!(feed(&mut m, &["a", "a", "b"]), vec![K, K, C]);
    }

    #[test]
    fn all_completes_in_any_order() {
        let mut m = Matcher::all(vec![Matcher::kind("a"), Matcher::kind("b")], false);
        assert_eq!(feed(&mut m, &["b", "c", "b", "a"]), vec![K, K, K, C]);
        assert_eq!(feed(&mut m, &["a", "b"]), vec![K, C]);
    }

    #[test]
    fn all_strict_rejects_unrelated_events() {
        let mut m = Matcher::all(vec![Matcher::kind("a"), Matcher::kind("b")], true);
        assert_eq!(feed(&mut m, &["a", "c", "b"]), vec![K, R, K]);
        assert_eq!(feed(&mut m, &["a"]), vec![C]);
    }

    #[test]
    fn all_strict_rejects_double_satisfaction() {
        let both = Template::object().field("type", "a");
        let mut m = Matcher::all(
            vec![Matcher::kind("a"), Matcher::exact(both), Matcher::kind("b")],
            true,
        );
        assert_eq!(m.step(&ev("a")), R);
        assert!(m.is_idle());
    }

    #[test]
    fn any_completes_on_first_branch() {
        let mut m = Matcher::any(vec![Matcher::kind("a"), Matcher::kind("b")], false);
        assert_eq!(feed(&mut m, &["c", "b", "a"]), vec![K, C, C]);
    }

    #[test]
    fn any_strict_rejects_unmatched() {
        let inner = Matcher::queue(vec![Matcher::kind("a"), Matcher::kind("b")], false);
        let mut m = Matcher::any(vec![inner, Matcher::kind("z")], true);
        assert_eq!(feed(&mut m, &["c", "a", "b"]), vec![R, K, C]);
    }

    #[test]
    fn any_resets_every_branch_on_completion() {
        let slow = Matcher::queue(vec![Matcher::kind("a"), Matcher::kind("b")], false);
        let mut m = Matcher::any(vec![slow, Matcher::kind("z")], false);
        assert_eq!(feed(&mut m, &["a", "z", "b"]), vec![K, C, K]);
        assert_eq!(feed(&mut m, &["a", "b"]), vec![K, C]);
    }

    #[test]
    fn reset_propagates_through_nesting() {
        let inner = Matcher::times(Matcher::kind("a"), 3, false);
        let mut m = Matcher::queue(vec![Matcher::kind("s"), inner], false);
        feed(&mut m, &["s", "a", "a"]);
        assert!(!m.is_idle());

        m.reset();
        assert!(m.is_idle());
        assert_eq!(feed(&mut m, &["a", "s", "a", "a", "a"]), vec![R, K, K, K, C]);
    }

    #[test]
    fn reset_never_advances() {
        let mut m = Matcher::times(Matcher::kind("a"), 2, false);
        m.reset();
        m.reset();
        assert_eq!(feed(&mut m, &["a", "a"]), vec![K, C]);
    }

    #[test]
    fn once_marks_not_repeatable() {
        let m = Matcher::kind("a").into_once();
        assert!(!m.is_repeatable());
        assert_eq!(m.description(), "ONCE:(SINGLE:(a))");

        let twice = m.into_once();
        assert_eq!(twice.description(), "ONCE:(SINGLE:(a))");
    }

    #[test]
    fn transition_leaves_original_untouched() {
        let m = Matcher::queue(vec![Matcher::kind("a"), Matcher::kind("b")], false);
        let (next, signal) = m.transition(&ev("a"));
        assert_eq!(signal, K);
        assert!(m.is_idle());
        assert!(!next.is_idle());
    }

    #[test]
    fn progress_survives_serialization() {
        let mut m = Matcher::queue(
            vec![Matcher::kind("a"), Matcher::kind("b"), Matcher::kind("c")],
            true,
        );
        feed(&mut m, &["a", "b"]);

        let json = serde_json::to_string(&m).unwrap();
        let mut restored: Matcher = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, m);
        assert_eq!(restored.step(&ev("c")), C);
    }
}
