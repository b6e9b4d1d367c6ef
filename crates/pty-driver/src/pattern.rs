//! Pattern compilation and matching.
//!
//! The session never talks to a regex library directly; it goes through a
//! [`PatternEngine`], which compiles a source string once and then answers
//! two questions about a piece of text: where is the first match, and is
//! there a match that ends exactly at the end. [`RegexEngine`] is the
//! default engine, backed by the `regex` crate and a shared
//! [`PatternCache`].

mod cache;
mod regex_engine;

use std::fmt;

pub use cache::{CacheStats, DEFAULT_CACHE_SIZE, PatternCache};
pub use regex_engine::{CompiledPattern, RegexEngine};

use crate::error::Result;

/// Byte range of a match within the searched text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a span.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The matched text.
    #[must_use]
    pub fn as_str<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }

    /// Length of the match in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the match is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Compiles pattern sources and searches text with them.
///
/// Implementations must be cheap to share across tasks; a session holds
/// one engine for its whole life.
pub trait PatternEngine: Send + Sync {
    /// A compiled pattern.
    type Pattern: Clone + fmt::Debug + Send + Sync;

    /// Compile `source`; an invalid source is
    /// [`DriverError::InvalidPattern`](crate::DriverError::InvalidPattern).
    fn compile(&self, source: &str) -> Result<Self::Pattern>;

    /// Compile `literal` so that it matches itself verbatim.
    fn compile_literal(&self, literal: &str) -> Result<Self::Pattern>;

    /// First match of `pattern` in `text`.
    fn find(&self, pattern: &Self::Pattern, text: &str) -> Option<Span>;

    /// A match of `pattern` that ends exactly at the end of `text`.
    fn find_trailing(&self, pattern: &Self::Pattern, text: &str) -> Option<Span>;

    /// The source a pattern was compiled from, for diagnostics.
    fn source<'a>(&self, pattern: &'a Self::Pattern) -> &'a str;
}
