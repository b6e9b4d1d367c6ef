//! Compiled-regex cache.
//!
//! Sessions that send the same command in a loop compile the same prompt and
//! success patterns over and over; the cache turns the repeats into a hash
//! lookup. Eviction is least-recently-used.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use regex::Regex;

/// Default maximum cache size.
pub const DEFAULT_CACHE_SIZE: usize = 100;

/// An LRU cache of compiled regular expressions keyed by source.
pub struct PatternCache {
    inner: Mutex<Lru>,
    max_size: usize,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

#[derive(Default)]
struct Lru {
    entries: HashMap<String, Arc<Regex>>,
    /// Least recently used first.
    order: VecDeque<String>,
}

impl Lru {
    fn touch(&mut self, source: &str) {
        if let Some(pos) = self.order.iter().position(|s| s == source) {
            if let Some(key) = self.order.remove(pos) {
                self.order.push_back(key);
            }
        }
    }
}

impl std::fmt::Debug for PatternCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternCache")
            .field("stats", &self.stats())
            .finish()
    }
}

impl PatternCache {
    /// Create a cache holding at most `max_size` patterns (at least one).
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            inner: Mutex::new(Lru {
                entries: HashMap::with_capacity(max_size),
                order: VecDeque::with_capacity(max_size),
            }),
            max_size,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// The process-wide cache used by [`RegexEngine::default`](super::RegexEngine).
    #[must_use]
    pub fn global() -> Arc<Self> {
        static GLOBAL: std::sync::LazyLock<Arc<PatternCache>> =
            std::sync::LazyLock::new(|| Arc::new(PatternCache::new(DEFAULT_CACHE_SIZE)));
        Arc::clone(&GLOBAL)
    }

    /// Get or compile a regex.
    pub fn get_or_compile(&self, source: &str) -> Result<Arc<Regex>, regex::Error> {
        // The cache is only an optimisation, so a poisoned lock is still usable.
        {
            let mut lru = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(regex) = lru.entries.get(source).cloned() {
                lru.touch(source);
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(regex);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        // Compile outside the lock.
        let regex = Arc::new(Regex::new(source)?);

        let mut lru = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = lru.entries.get(source).cloned() {
            lru.touch(source);
            return Ok(existing);
        }
        if lru.entries.len() >= self.max_size
            && let Some(oldest) = lru.order.pop_front()
        {
            tracing::trace!(pattern = %oldest, "evicting cached pattern");
            lru.entries.remove(&oldest);
        }
        lru.entries.insert(source.to_string(), Arc::clone(&regex));
        lru.order.push_back(source.to_string());

        Ok(regex)
    }

    /// Check if a pattern is cached.
    #[must_use]
    pub fn contains(&self, source: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .contains_key(source)
    }

    /// Number of cached patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached pattern.
    pub fn clear(&self) {
        let mut lru = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        lru.entries.clear();
        lru.order.clear();
    }

    /// Hit/miss counters and occupancy.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.len(),
            max_size: self.max_size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

/// Statistics about a pattern cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of cached patterns.
    pub size: usize,
    /// Maximum cache size.
    pub max_size: usize,
    /// Lookups served from the cache.
    pub hits: usize,
    /// Lookups that compiled.
    pub misses: usize,
}

impl CacheStats {
    /// Hit ratio in `0.0..=1.0`; 1.0 before any lookup.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            1.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
