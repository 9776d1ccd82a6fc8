//! The sequence engine: registry plus dispatch driver.
//!
//! This module is the imperative shell around the pure matchers in
//! [`crate::core`]. It owns the live registrations, feeds each observed
//! event to them, and hands resolved reactions to a host-supplied
//! [`Dispatcher`].
//!
//! # Key Concepts
//!
//! - **Registration**: a matcher, its reaction, and the events accumulated in
//!   the current cycle
//! - **Tick**: one event fed to every registration live when it arrives
//! - **Feedback**: dispatched events the host wants observed again are
//!   processed as later ticks of the same call, never recursively
//!
//! # Example
//!
//! ```rust
//! use event_sequences::core::Event;
//! use event_sequences::engine::{Recorder, SequenceEngine};
//!
//! let mut engine = SequenceEngine::new();
//! engine
//!     .when("checkout/ready", |p| p.queue_strict(["cart/add", "cart/pay"]))
//!     .unwrap();
//!
//! let mut recorder = Recorder::new();
//! for kind in ["cart/add", "cart/pay"] {
//!     engine.process_event(Event::new(kind), &mut recorder).unwrap();
//! }
//! assert_eq!(recorder.kinds(), vec!["checkout/ready"]);
//! ```

mod dispatch;
mod error;
mod reaction;
mod registry;

pub use dispatch::{Dispatcher, Feedback, Recorder};
pub use error::EngineError;
pub use reaction::{Effect, Reaction, ReactionFn, ACCUMULATED_FIELD};
pub use registry::{RegistrationId, RegistrationInfo, UnregisterHandle};

use crate::builder::{BuildError, Patterns};
use crate::core::{Event, Matcher};
use registry::Registry;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Default bound on feedback ticks per [`SequenceEngine::process_event`] call.
pub const DEFAULT_MAX_CASCADE: usize = 64;

/// Predicate deciding which events the engine observes.
pub type Admission = Box<dyn Fn(&Event) -> bool + Send + Sync>;

/// Builder for configuring a [`SequenceEngine`].
pub struct EngineBuilder {
    max_cascade: usize,
    admit: Option<Admission>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            max_cascade: DEFAULT_MAX_CASCADE,
            admit: None,
        }
    }

    /// Maximum number of fed-back events processed per call.
    ///
    /// Events refused by the admission predicate do not count.
    pub fn max_cascade(mut self, ticks: usize) -> Self {
        self.max_cascade = ticks;
        self
    }

    /// Only observe events accepted by `predicate`.
    ///
    /// Defaults to [`Event::is_well_formed`].
    pub fn admit<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        self.admit = Some(Box::new(predicate));
        self
    }

    pub fn build(self) -> SequenceEngine {
        SequenceEngine {
            registry: Registry::default(),
            max_cascade: self.max_cascade,
            admit: self
                .admit
                .unwrap_or_else(|| Box::new(Event::is_well_formed)),
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Matches observed events against registered sequences.
///
/// The engine is synchronous and single-writer: every method takes
/// `&mut self`. Use [`SharedEngine`] to share one between threads.
pub struct SequenceEngine {
    registry: Registry,
    max_cascade: usize,
    admit: Admission,
}

impl SequenceEngine {
    /// An engine with default configuration.
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Register a matcher with the reaction to dispatch when it completes.
    pub fn register(
        &mut self,
        matcher: Matcher,
        reaction: impl Into<Reaction>,
    ) -> UnregisterHandle {
        self.registry.register(matcher, reaction.into())
    }

    /// Build a matcher with the pattern API and register it.
    ///
    /// Construction errors are returned before anything is registered.
    pub fn when<F>(
        &mut self,
        reaction: impl Into<Reaction>,
        build: F,
    ) -> Result<UnregisterHandle, BuildError>
    where
        F: FnOnce(&Patterns) -> Result<Matcher, BuildError>,
    {
        let matcher = build(&Patterns)?;
        Ok(self.register(matcher, reaction))
    }

    /// Remove a registration by id. Returns `false` if it was not live.
    pub fn unregister(&mut self, id: RegistrationId) -> bool {
        self.registry.unregister(id)
    }

    /// Unregister every sequence.
    pub fn clear_all(&mut self) {
        let count = self.registry.live_count();
        self.registry.clear();
        debug!(count, "all sequences cleared");
    }

    pub fn live_count(&self) -> usize {
        self.registry.live_count()
    }

    /// Snapshots of the live registrations, in registration order.
    pub fn registrations(&self) -> Vec<RegistrationInfo> {
        self.registry.infos()
    }

    /// Feed one event to every live sequence.
    ///
    /// Reactions of completed sequences are handed to `dispatcher` as they
    /// resolve. Events the dispatcher returns [`Feedback::Observe`] for are
    /// processed after the current tick, breadth-first, up to the configured
    /// cascade limit.
    ///
    /// Returns the number of reactions dispatched.
    pub fn process_event<D>(&mut self, event: Event, dispatcher: &mut D) -> Result<usize, EngineError>
    where
        D: Dispatcher + ?Sized,
    {
        let mut queue = VecDeque::from([event]);
        let mut fired = 0;
        let mut ticks = 0;

        while let Some(event) = queue.pop_front() {
            if !(self.admit)(&event) {
                debug!(event = %event, "event not admitted");
                continue;
            }
            if ticks > self.max_cascade {
                let dropped = queue.len() + 1;
                warn!(limit = self.max_cascade, dropped, "feedback cascade limit reached");
                return Err(EngineError::CascadeLimit {
                    limit: self.max_cascade,
                    dropped,
                });
            }
            ticks += 1;
            fired += self.tick(&event, dispatcher, &mut queue);
        }

        Ok(fired)
    }

    fn tick<D>(&mut self, event: &Event, dispatcher: &mut D, feedback: &mut VecDeque<Event>) -> usize
    where
        D: Dispatcher + ?Sized,
    {
        self.registry.purge();

        // Registrations cannot be added while the tick holds `&mut self`, and
        // handles invoked mid-tick only take effect at the purge below, so
        // every registration live at the start of the tick sees the event.
        let mut fired = 0;
        for registration in self.registry.entries_mut() {
            let Some(effect) = registration.observe(event) else {
                continue;
            };
            fired += 1;

            if dispatcher.dispatch(&effect) == Feedback::Observe {
                feedback.push_back(effect.event.clone());
            }
            if !registration.is_repeatable() {
                effect.unregister.unregister();
            }
        }

        self.registry.purge();
        fired
    }
}

impl Default for SequenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SequenceEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceEngine")
            .field("live", &self.registry.live_count())
            .field("max_cascade", &self.max_cascade)
            .finish_non_exhaustive()
    }
}

/// A [`SequenceEngine`] behind a single mutex, for concurrent callers.
///
/// Every operation locks the whole engine, so processing, registration and
/// unregistration are serialized. A dispatcher must not call back into the
/// same `SharedEngine`; return [`Feedback::Observe`] instead.
#[derive(Clone, Debug)]
pub struct SharedEngine {
    inner: Arc<Mutex<SequenceEngine>>,
}

impl SharedEngine {
    pub fn new(engine: SequenceEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SequenceEngine> {
        // Matchers are plain data; a panic inside a dispatcher leaves them
        // consistent, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, matcher: Matcher, reaction: impl Into<Reaction>) -> UnregisterHandle {
        self.lock().register(matcher, reaction)
    }

    pub fn when<F>(
        &self,
        reaction: impl Into<Reaction>,
        build: F,
    ) -> Result<UnregisterHandle, BuildError>
    where
        F: FnOnce(&Patterns) -> Result<Matcher, BuildError>,
    {
        self.lock().when(reaction, build)
    }

    pub fn unregister(&self, id: RegistrationId) -> bool {
        self.lock().unregister(id)
    }

    pub fn process_event<D>(&self, event: Event, dispatcher: &mut D) -> Result<usize, EngineError>
    where
        D: Dispatcher + ?Sized,
    {
        self.lock().process_event(event, dispatcher)
    }

    pub fn clear_all(&self) {
        self.lock().clear_all();
    }

    pub fn live_count(&self) -> usize {
        self.lock().live_count()
    }

    pub fn registrations(&self) -> Vec<RegistrationInfo> {
        self.lock().registrations()
    }
}

impl From<SequenceEngine> for SharedEngine {
    fn from(engine: SequenceEngine) -> Self {
        Self::new(engine)
    }
}
