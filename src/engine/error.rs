//! Runtime errors of the dispatch driver.

use thiserror::Error;

/// Errors that can occur while processing events.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    /// Reactions kept feeding events back beyond the configured limit.
    #[error("Feedback cascade exceeded {limit} ticks ({dropped} events dropped)")]
    CascadeLimit { limit: usize, dropped: usize },
}
