//! Property-based tests for matchers and the engine.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated event streams.

use event_sequences::builder::{any, queue, queue_strict, simple, times, times_strict, PRESENT};
use event_sequences::core::{Event, Matcher, Signal};
use event_sequences::engine::{Recorder, SequenceEngine};
use event_sequences::template;
use proptest::prelude::*;
use serde_json::Value;

prop_compose! {
    fn arbitrary_kind()(variant in 0..4u8) -> &'static str {
        match variant {
            0 => "a",
            1 => "b",
            2 => "c",
            _ => "d",
        }
    }
}

fn arbitrary_stream(max: usize) -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(arbitrary_kind(), 0..max)
}

fn feed(matcher: &mut Matcher, stream: &[&str]) -> Vec<Signal> {
    stream.iter().map(|k| matcher.step(&Event::new(*k))).collect()
}

fn completions(signals: &[Signal]) -> usize {
    signals.iter().filter(|s| s.is_complete()).count()
}

proptest! {
    #[test]
    fn simple_is_idempotent(kind in arbitrary_kind(), stream in arbitrary_stream(20)) {
        let mut once = simple(kind).unwrap();
        let mut twice = simple(simple(kind).unwrap()).unwrap();
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(feed(&mut once, &stream), feed(&mut twice, &stream));
    }

    #[test]
    fn times_completes_every_nth_occurrence(
        n in 1..5usize,
        stream in arbitrary_stream(40),
    ) {
        let mut matcher = times("a", n).unwrap();
        let signals = feed(&mut matcher, &stream);
        let occurrences = stream.iter().filter(|k| **k == "a").count();
        prop_assert_eq!(completions(&signals), occurrences / n);
    }

    #[test]
    fn times_strict_needs_unbroken_runs(
        n in 1..4usize,
        stream in arbitrary_stream(40),
    ) {
        let mut matcher = times_strict("a", n).unwrap();
        let signals = feed(&mut matcher, &stream);

        let expected: usize = stream
            .split(|k| *k != "a")
            .map(|run| run.len() / n)
            .sum();
        prop_assert_eq!(completions(&signals), expected);
    }

    #[test]
    fn strict_queue_completes_only_after_its_prefix(stream in arbitrary_stream(40)) {
        let mut matcher = queue_strict(["a", "b"]).unwrap();
        let signals = feed(&mut matcher, &stream);

        for (idx, signal) in signals.iter().enumerate() {
            if signal.is_complete() {
                prop_assert_eq!(stream[idx], "b");
                prop_assert!(idx > 0);
                prop_assert_eq!(stream[idx - 1], "a");
            }
        }
    }

    #[test]
    fn any_of_kinds_completes_on_each_member(stream in arbitrary_stream(40)) {
        let mut matcher = any(["a", "b"]).unwrap();
        let signals = feed(&mut matcher, &stream);

        for (kind, signal) in stream.iter().zip(&signals) {
            prop_assert_eq!(signal.is_complete(), *kind == "a" || *kind == "b");
        }
    }

    #[test]
    fn transition_is_pure(
        prefix in arbitrary_stream(10),
        kind in arbitrary_kind(),
    ) {
        let mut matcher = queue([
            simple("a").unwrap(),
            times("b", 2).unwrap(),
            simple("c").unwrap(),
        ])
        .unwrap();
        feed(&mut matcher, &prefix);

        let before = matcher.clone();
        let event = Event::new(kind);
        let (next, signal) = matcher.transition(&event);
        prop_assert_eq!(&matcher, &before);

        let mut stepped = before;
        prop_assert_eq!(stepped.step(&event), signal);
        prop_assert_eq!(stepped, next);
    }

    #[test]
    fn serialized_progress_resumes_identically(
        prefix in arbitrary_stream(10),
        suffix in arbitrary_stream(10),
    ) {
        let mut original = queue_strict([
            simple("a").unwrap(),
            any(["b", "c"]).unwrap(),
        ])
        .unwrap();
        feed(&mut original, &prefix);

        let json = serde_json::to_string(&original).unwrap();
        let mut restored: Matcher = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(feed(&mut original, &suffix), feed(&mut restored, &suffix));
    }

    #[test]
    fn reset_always_returns_to_idle(prefix in arbitrary_stream(15)) {
        let mut matcher = queue([times("a", 3).unwrap(), simple("b").unwrap()]).unwrap();
        feed(&mut matcher, &prefix);
        matcher.reset();
        prop_assert!(matcher.is_idle());
    }

    #[test]
    fn dispatched_buffers_span_one_cycle(stream in arbitrary_stream(40)) {
        let mut engine = SequenceEngine::new();
        let mut recorder = Recorder::new();
        engine.register(queue(["a", "b"]).unwrap(), "pair");

        for kind in &stream {
            engine.process_event(Event::new(*kind), &mut recorder).unwrap();
        }

        for event in recorder.events() {
            let buffer = event.payload().and_then(|p| p.get("events")).and_then(Value::as_array);
            let kinds: Vec<&str> = buffer
                .into_iter()
                .flatten()
                .filter_map(|e| e.get("type").and_then(Value::as_str))
                .collect();

            prop_assert_eq!(kinds.first().copied(), Some("a"));
            prop_assert_eq!(kinds.last().copied(), Some("b"));
            prop_assert_eq!(kinds.iter().filter(|k| **k == "b").count(), 1);
        }
    }

    #[test]
    fn templates_match_whenever_required_fields_exist(
        extra in prop::collection::hash_map("[a-z]{1,6}", prop::num::i32::ANY, 0..4),
    ) {
        let mut matcher = simple(template! { "type" => "save", "id" => PRESENT }).unwrap();

        let mut event = Event::new("save").with("id", 7);
        for (field, value) in &extra {
            if field != "type" && field != "id" {
                event = event.with(field.clone(), *value);
            }
        }
        prop_assert_eq!(matcher.step(&event), Signal::Complete);
    }
}
