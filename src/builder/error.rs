//! Build errors for pattern construction.

use thiserror::Error;

/// Errors raised while turning pattern tokens into matchers.
///
/// Every variant names the combinator that refused its input.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuildError {
    #[error("{combinator}: invalid token: {reason}")]
    InvalidToken {
        combinator: &'static str,
        reason: String,
    },

    #[error("{combinator}: invalid token at position {index}: {reason}")]
    InvalidTokenAt {
        combinator: &'static str,
        index: usize,
        reason: String,
    },

    #[error("{combinator}: at least one token expected")]
    EmptyTokens { combinator: &'static str },

    #[error("{combinator}: count must be at least 1")]
    InvalidCount { combinator: &'static str },

    #[error("{combinator}: {} invalid token(s): {}", .errors.len(), summarize(.errors))]
    InvalidTokens {
        combinator: &'static str,
        errors: Vec<BuildError>,
    },
}

fn summarize(errors: &[BuildError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
