//! Live registrations: matcher, reaction, and accumulated events.

use crate::core::{Event, Matcher, Signal};
use crate::engine::reaction::{Effect, Reaction, Resolver};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace};
use uuid::Uuid;

/// Identifier of a registration, unique among live registrations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(Uuid);

impl RegistrationId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cancels a registration.
///
/// Handles are cheap to clone and may be used from reactions, dispatchers,
/// or other threads. Unregistering takes effect immediately and is
/// idempotent.
#[derive(Clone, Debug)]
pub struct UnregisterHandle {
    id: RegistrationId,
    cancelled: Arc<AtomicBool>,
}

impl UnregisterHandle {
    pub fn id(&self) -> RegistrationId {
        self.id
    }

    /// Remove the registration from the live set.
    ///
    /// Returns `true` if this call removed it, `false` if it was already gone.
    pub fn unregister(&self) -> bool {
        let removed = !self.cancelled.swap(true, Ordering::SeqCst);
        if removed {
            debug!(id = %self.id, "sequence unregistered");
        }
        removed
    }

    pub fn is_unregistered(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Snapshot of a registration for inspection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistrationInfo {
    pub id: RegistrationId,
    /// Description of the matcher.
    pub sequence: String,
    pub reaction: String,
    pub repeatable: bool,
    /// Events accumulated in the current, unfinished cycle.
    pub pending: usize,
    /// Number of times the sequence has completed.
    pub completions: usize,
    pub registered_at: DateTime<Utc>,
}

pub(crate) struct Registration {
    id: RegistrationId,
    matcher: Matcher,
    resolver: Resolver,
    reaction: String,
    accumulated: Vec<Event>,
    cancelled: Arc<AtomicBool>,
    completions: usize,
    registered_at: DateTime<Utc>,
}

impl Registration {
    fn new(matcher: Matcher, reaction: Reaction) -> Self {
        Self {
            id: RegistrationId::new(),
            reaction: reaction.to_string(),
            resolver: reaction.into_resolver(),
            matcher,
            accumulated: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
            completions: 0,
            registered_at: Utc::now(),
        }
    }

    pub(crate) fn handle(&self) -> UnregisterHandle {
        UnregisterHandle {
            id: self.id,
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        !self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn is_repeatable(&self) -> bool {
        self.matcher.is_repeatable()
    }

    pub(crate) fn info(&self) -> RegistrationInfo {
        RegistrationInfo {
            id: self.id,
            sequence: self.matcher.description().to_string(),
            reaction: self.reaction.clone(),
            repeatable: self.matcher.is_repeatable(),
            pending: self.accumulated.len(),
            completions: self.completions,
            registered_at: self.registered_at,
        }
    }

    /// Feed one event to the matcher and maintain the accumulation buffer.
    ///
    /// On completion the buffer is handed to the reaction and the resolved
    /// effect is returned; the matcher has already reset itself.
    pub(crate) fn observe(&mut self, event: &Event) -> Option<Effect> {
        let signal = self.matcher.step(event);
        trace!(id = %self.id, sequence = %self.matcher, event = %event, %signal, "sequence stepped");

        match signal {
            Signal::Reject => {
                self.accumulated.clear();
                None
            }
            Signal::Continue => {
                self.accumulated.push(event.clone());
                None
            }
            Signal::Complete => {
                self.accumulated.push(event.clone());
                let events = std::mem::take(&mut self.accumulated);
                self.completions += 1;

                info!(
                    id = %self.id,
                    sequence = %self.matcher,
                    reaction = %self.reaction,
                    events = events.len(),
                    "sequence resolved"
                );

                let unregister = self.handle();
                let event = (self.resolver)(events, &unregister);
                Some(Effect { event, unregister })
            }
        }
    }
}

/// Ordered set of registrations.
#[derive(Default)]
pub(crate) struct Registry {
    entries: Vec<Registration>,
}

impl Registry {
    pub(crate) fn register(&mut self, matcher: Matcher, reaction: Reaction) -> UnregisterHandle {
        let registration = Registration::new(matcher, reaction);
        debug!(
            id = %registration.id,
            sequence = %registration.matcher,
            reaction = %registration.reaction,
            "sequence registered"
        );
        let handle = registration.handle();
        self.entries.push(registration);
        handle
    }

    pub(crate) fn unregister(&mut self, id: RegistrationId) -> bool {
        let Some(position) = self.entries.iter().position(|r| r.id == id) else {
            return false;
        };
        let registration = self.entries.remove(position);
        registration.handle().unregister()
    }

    pub(crate) fn clear(&mut self) {
        for registration in self.entries.drain(..) {
            registration.cancelled.store(true, Ordering::SeqCst);
        }
    }

    /// Drop registrations whose handles were invoked, with their buffers.
    pub(crate) fn purge(&mut self) {
        self.entries.retain(Registration::is_live);
    }

    pub(crate) fn live_count(&self) -> usize {
        self.entries.iter().filter(|r| r.is_live()).count()
    }

    pub(crate) fn infos(&self) -> Vec<RegistrationInfo> {
        self.entries
            .iter()
            .filter(|r| r.is_live())
            .map(Registration::info)
            .collect()
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [Registration] {
        &mut self.entries
    }
}
