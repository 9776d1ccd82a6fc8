//! Builder API for composing patterns.
//!
//! This module turns heterogeneous pattern descriptions ([`Token`]s) into
//! validated [`Matcher`](crate::core::Matcher)s. Construction errors are
//! raised here, synchronously, before anything is registered.
//!
//! The combinators are available as free functions and as methods on
//! [`Patterns`], the capability object handed to
//! [`SequenceEngine::when`](crate::engine::SequenceEngine::when) callbacks.

pub mod error;
pub mod macros;
pub mod patterns;

pub use error::BuildError;
pub use patterns::{
    all, all_strict, any, any_strict, exact, once, queue, queue_strict, simple, times,
    times_strict, Patterns, Token,
};

use crate::core::Wildcard;

/// Field must be defined.
pub const PRESENT: Wildcard = Wildcard::Present;

/// Field must be absent.
pub const MISSING: Wildcard = Wildcard::Missing;

/// Field must be truthy.
pub const TRUTHY: Wildcard = Wildcard::Truthy;

/// Field must be falsey or absent.
pub const FALSEY: Wildcard = Wildcard::Falsey;
