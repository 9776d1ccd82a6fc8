//! Checkout Flow
//!
//! This example watches a shop's event stream and reacts to multi-step
//! customer behaviour.
//!
//! Key concepts:
//! - Kind, template and function reactions
//! - Strict and lenient ordering
//! - Feedback: reaction events observed by other sequences
//! - One-shot registrations
//!
//! Run with: RUST_LOG=event_sequences=debug cargo run --example checkout_flow

use event_sequences::builder::{PRESENT, TRUTHY};
use event_sequences::core::Event;
use event_sequences::engine::{Effect, Feedback, Reaction, SequenceEngine};
use event_sequences::template;
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("event_sequences=info".parse()?))
        .init();

    println!("=== Checkout Flow ===\n");

    let mut engine = SequenceEngine::new();

    // Cart filled and paid for, with browsing allowed in between.
    engine.when(
        Event::new("order/placed").with_payload(json!({ "channel": "web" })),
        |p| p.queue([p.simple("cart/add")?, p.simple("checkout/pay")?]),
    )?;

    // A coupon applied right before paying earns a thank-you note.
    engine.when("coupon/thanks", |p| {
        p.queue_strict([
            p.exact(template! {
                "type" => "coupon/apply",
                "payload" => template! { "code" => PRESENT },
            })?,
            p.simple("checkout/pay")?,
        ])
    })?;

    // Every placed order triggers a confirmation mail.
    engine.when(
        Reaction::function(|_, events| {
            let channel = events
                .last()
                .and_then(|e| e.payload())
                .and_then(|p| p.get("channel"))
                .cloned()
                .unwrap_or_default();
            Event::new("mail/confirmation").with_payload(json!({ "channel": channel }))
        }),
        |p| p.simple("order/placed"),
    )?;

    // The first VIP login of the session gets a banner, once.
    engine.when("banner/vip", |p| {
        p.once(template! { "type" => "user/login", "vip" => TRUTHY })
    })?;

    println!("Registered sequences:");
    for info in engine.registrations() {
        println!("  {} -> {}", info.sequence, info.reaction);
    }
    println!();

    let stream = vec![
        Event::new("user/login").with("vip", true),
        Event::new("cart/add").with_payload(json!({ "sku": "tea" })),
        Event::new("page/view"),
        Event::new("coupon/apply").with_payload(json!({ "code": "SPRING" })),
        Event::new("checkout/pay"),
        Event::new("user/login").with("vip", true),
    ];

    let mut dispatch = |effect: &Effect| {
        println!("  dispatched: {}", effect.event.clone().into_value());
        Feedback::Observe
    };

    for event in stream {
        println!("observed: {event}");
        let fired = engine.process_event(event, &mut dispatch)?;
        if fired == 0 {
            println!("  (no sequence completed)");
        }
    }

    println!("\nLive sequences after the run: {}", engine.live_count());
    for info in engine.registrations() {
        println!(
            "  {} completed {} time(s), {} event(s) pending",
            info.sequence, info.completions, info.pending
        );
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
