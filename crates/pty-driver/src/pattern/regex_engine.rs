//! The default engine, backed by the `regex` crate.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::{PatternCache, PatternEngine, Span};
use crate::error::{DriverError, Result};

/// A compiled regular expression with its source pattern.
#[derive(Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Arc<Regex>,
}

impl CompiledPattern {
    /// Get the source pattern.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The underlying regex.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Check whether the pattern occurs anywhere in `text`.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Capture groups of the first match, skipping the whole-match group.
    #[must_use]
    pub fn captures(&self, text: &str) -> Vec<String> {
        self.regex
            .captures(text)
            .map(|caps| {
                caps.iter()
                    .skip(1)
                    .filter_map(|m| m.map(|m| m.as_str().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompiledPattern({:?})", self.source)
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Regex-backed [`PatternEngine`].
#[derive(Debug, Clone)]
pub struct RegexEngine {
    cache: Arc<PatternCache>,
}

impl Default for RegexEngine {
    fn default() -> Self {
        Self::with_cache(PatternCache::global())
    }
}

impl RegexEngine {
    /// An engine using the process-wide pattern cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine using a private cache.
    #[must_use]
    pub const fn with_cache(cache: Arc<PatternCache>) -> Self {
        Self { cache }
    }

    /// The cache this engine compiles through.
    #[must_use]
    pub fn cache(&self) -> &PatternCache {
        &self.cache
    }

}

impl PatternEngine for RegexEngine {
    type Pattern = CompiledPattern;

    fn compile(&self, source: &str) -> Result<CompiledPattern> {
        let regex = self
            .cache
            .get_or_compile(source)
            .map_err(|e| DriverError::invalid_pattern(source, e.to_string()))?;
        Ok(CompiledPattern {
            source: source.to_string(),
            regex,
        })
    }

    fn compile_literal(&self, literal: &str) -> Result<CompiledPattern> {
        self.compile(&regex::escape(literal))
    }

    fn find(&self, pattern: &CompiledPattern, text: &str) -> Option<Span> {
        pattern.regex.find(text).map(|m| Span::new(m.start(), m.end()))
    }

    /// Scans start positions left to right and returns the first match
    /// that ends at `text.len()`.
    fn find_trailing(&self, pattern: &CompiledPattern, text: &str) -> Option<Span> {
        let mut start = 0;
        while let Some(m) = pattern.regex.find_at(text, start) {
            if m.end() == text.len() {
                return Some(Span::new(m.start(), m.end()));
            }
            // Resume one character past this match's start.
            start = m.start() + text[m.start()..].chars().next()?.len_utf8();
        }
        None
    }

    fn source<'a>(&self, pattern: &'a CompiledPattern) -> &'a str {
        pattern.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RegexEngine {
        RegexEngine::with_cache(Arc::new(PatternCache::new(16)))
    }

    #[test]
    fn find_first_match() {
        let e = engine();
        let p = e.compile(r"\d+").unwrap();
        assert_eq!(e.find(&p, "ab 12 34"), Some(Span::new(3, 5)));
        assert_eq!(e.find(&p, "none"), None);
    }

    #[test]
    fn trailing_only_at_end() {
        let e = engine();
        let p = e.compile(r"\$ ").unwrap();
        assert_eq!(e.find_trailing(&p, "out\n$ "), Some(Span::new(4, 6)));
        assert_eq!(e.find_trailing(&p, "$ out"), None);
    }

    #[test]
    fn trailing_respects_alternation() {
        let e = engine();
        let p = e.compile("# |> ").unwrap();
        assert!(e.find_trailing(&p, "router# ").is_some());
        assert!(e.find_trailing(&p, "router# x").is_none());
    }

    #[test]
    fn invalid_source_reports_pattern() {
        let e = engine();
        let err = e.compile("(unclosed").unwrap_err();
        assert!(matches!(
            err,
            DriverError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"
        ));
    }

    #[test]
    fn literal_escapes_metacharacters() {
        let e = engine();
        let p = e.compile_literal("[root@host ~]$ ").unwrap();
        assert!(e.find_trailing(&p, "ls\n[root@host ~]$ ").is_some());
        assert!(e.find(&p, "root@host $ ").is_none());
    }

    #[test]
    fn captures_skip_whole_match() {
        let e = engine();
        let p = e.compile(r"(\w+)=(\d+)").unwrap();
        assert_eq!(p.captures("x key=42"), vec!["key", "42"]);
        assert!(p.is_match("a=1"));
    }

    #[test]
    fn compile_goes_through_cache() {
        let e = engine();
        e.compile("abc").unwrap();
        e.compile("abc").unwrap();
        assert!(e.cache().contains("abc"));
        assert_eq!(e.cache().stats().hits, 1);
        assert_eq!(e.cache().len(), 1);
    }

    #[test]
    fn verbose_pattern_with_trailing_comment() {
        let e = engine();
        let p = e.compile("(?x) \\$ \\x20 # shell prompt").unwrap();
        assert_eq!(e.find_trailing(&p, "ok\n$ "), Some(Span::new(3, 5)));
        assert_eq!(e.find_trailing(&p, "$ ls"), None);
    }

    #[test]
    fn trailing_skips_earlier_overlapping_matches() {
        let e = engine();
        let p = e.compile("aa").unwrap();
        assert_eq!(e.find_trailing(&p, "aaa"), Some(Span::new(1, 3)));
        let p = e.compile(r"\$ ").unwrap();
        assert_eq!(e.find_trailing(&p, "é$ é$ "), Some(Span::new(6, 8)));
    }
}
