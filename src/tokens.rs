//! Token counting collaborators.
//!
//! The assemblers never tokenize text themselves; they call a [`TokenCounter`]
//! supplied by the caller. The counter must be deterministic and
//! side-effect-free; a failure is fatal for the invocation and is propagated
//! without retry.
//!
//! [`CharTokenCounter`] is the bundled estimator for callers without a real
//! tokenizer. [`CachedTokenCounter`] wraps any counter with an LRU memo of
//! counts keyed by a 64-bit hash of the text; use one instance per assembler
//! so counts never leak across batch groups.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::RwLock;
use xxhash_rust::xxh64::xxh64;

/// Error raised by a token counting collaborator.
#[derive(Debug, thiserror::Error)]
#[error("token counting failed: {0}")]
pub struct TokenCountError(pub String);

/// A function from text to a non-negative token count.
///
/// Implementations must be deterministic: the same text always yields the
/// same count within one invocation.
pub trait TokenCounter {
    /// Count tokens in `text`.
    fn count(&self, text: &str) -> Result<usize, TokenCountError>;
}

/// Character-ratio token estimator.
///
/// Approximates common LLM tokenizers by dividing character length by an
/// average characters-per-token ratio (4.0 suits English prose).
#[derive(Debug, Clone)]
pub struct CharTokenCounter {
    chars_per_token: f64,
}

impl CharTokenCounter {
    /// Create an estimator with the default 4.0 chars-per-token ratio.
    pub fn new() -> Self {
        Self {
            chars_per_token: 4.0,
        }
    }

    /// Create an estimator with a custom ratio.
    pub fn with_ratio(chars_per_token: f64) -> Self {
        Self { chars_per_token }
    }
}

impl Default for CharTokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounter for CharTokenCounter {
    fn count(&self, text: &str) -> Result<usize, TokenCountError> {
        if text.is_empty() {
            return Ok(0);
        }
        Ok(((text.len() as f64) / self.chars_per_token).ceil() as usize)
    }
}

/// Counting collaborator that charges one token per character.
///
/// Mostly useful in tests, where budgets need to be exact.
#[derive(Debug, Clone, Default)]
pub struct CharExactCounter;

impl TokenCounter for CharExactCounter {
    fn count(&self, text: &str) -> Result<usize, TokenCountError> {
        Ok(text.chars().count())
    }
}

/// Memoizing wrapper around another counter.
///
/// Growth re-renders share long prefixes but are never byte-identical, so the
/// cache pays off only when a caller counts the same draft more than once
/// (e.g. budget check plus final size). Keys are xxh64 hashes of the text.
pub struct CachedTokenCounter<C: TokenCounter> {
    inner: C,
    cache: RwLock<LruCache<u64, usize>>,
}

impl<C: TokenCounter> CachedTokenCounter<C> {
    /// Wrap `inner` with a memo of at most `max_entries` counts.
    pub fn new(inner: C, max_entries: usize) -> Self {
        let size = NonZeroUsize::new(max_entries)
            .unwrap_or_else(|| NonZeroUsize::new(1000).expect("nonzero literal"));
        Self {
            inner,
            cache: RwLock::new(LruCache::new(size)),
        }
    }

    /// Number of memoized counts currently held.
    pub fn cached_entries(&self) -> usize {
        self.cache.read().len()
    }
}

impl<C: TokenCounter> TokenCounter for CachedTokenCounter<C> {
    fn count(&self, text: &str) -> Result<usize, TokenCountError> {
        let key = xxh64(text.as_bytes(), 0);
        if let Some(count) = self.cache.write().get(&key).copied() {
            return Ok(count);
        }
        let count = self.inner.count(text)?;
        self.cache.write().put(key, count);
        Ok(count)
    }
}

impl<T: TokenCounter + ?Sized> TokenCounter for &T {
    fn count(&self, text: &str) -> Result<usize, TokenCountError> {
        (**self).count(text)
    }
}
