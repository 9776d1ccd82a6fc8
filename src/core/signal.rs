//! The tri-state result of feeding one event to a matcher.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of stepping a matcher with one event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// The event does not advance the pattern; any partial progress the
    /// caller accumulated for this cycle is void.
    Reject,

    /// The event was absorbed and the pattern is still in progress.
    Continue,

    /// The event completed the pattern.
    Complete,
}

impl Signal {
    pub fn is_reject(self) -> bool {
        matches!(self, Self::Reject)
    }

    pub fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reject => "reject",
            Self::Continue => "continue",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}
