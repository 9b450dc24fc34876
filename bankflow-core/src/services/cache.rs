//! Fetch cache - time-bounded memoization keyed by an input hash
//!
//! `MemoCache` is a plain process-local table; `CachedSource` composes it
//! around any `BankSource` so the source itself stays free of caching.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use crate::domain::result::{Error, Result};
use crate::domain::RawBankRecord;
use crate::ports::BankSource;

/// Default time-to-live for cached fetches
pub fn default_ttl() -> Duration {
    Duration::days(1)
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|_| Utc::now())
    }
}

/// Maps a call's input to its cache key
pub type KeyFn = Box<dyn Fn(&str) -> String + Send + Sync>;

/// SHA-256 (hex) of the JSON-encoded argument list
///
/// Hashing the whole argument list keeps keys distinct if more inputs are
/// ever added to the cached call.
pub fn input_hash(input: &str) -> String {
    let encoded = serde_json::json!([input]).to_string();
    hex::encode(Sha256::digest(encoded.as_bytes()))
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Time-bounded memoization table
pub struct MemoCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    key_fn: KeyFn,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> MemoCache<V> {
    /// Cache keyed by `input_hash` on the system clock
    pub fn new(ttl: Duration) -> Self {
        Self::with_parts(ttl, Box::new(input_hash), Arc::new(SystemClock))
    }

    pub fn with_parts(ttl: Duration, key_fn: KeyFn, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            key_fn,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn key_for(&self, input: &str) -> String {
        (self.key_fn)(input)
    }

    /// Live cached value for `input`, if any
    pub fn get(&self, input: &str) -> Result<Option<V>> {
        let key = self.key_for(input);
        let now = self.clock.now();
        let entries = self.lock()?;

        Ok(entries
            .get(&key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone()))
    }

    /// Store `value` for `input`, expiring one TTL from now
    pub fn insert(&self, input: &str, value: V) -> Result<()> {
        let key = self.key_for(input);
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| Error::Config(format!("Cache TTL too large: {}", self.ttl)))?;
        self.lock()?.insert(key, CacheEntry { value, expires_at });
        Ok(())
    }

    /// Return the live value for `input`, or compute, store and return it.
    ///
    /// The table is not locked while `compute` runs. Errors are returned
    /// as-is and never stored. Expired entries are purged on every store.
    pub fn get_or_try_insert_with<F>(&self, input: &str, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(value) = self.get(input)? {
            return Ok(value);
        }

        let value = compute()?;
        self.purge_expired()?;
        self.insert(input, value.clone())?;
        Ok(value)
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        Ok(before - entries.len())
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, CacheEntry<V>>>> {
        self.entries
            .lock()
            .map_err(|e| Error::Config(format!("Cache lock poisoned: {}", e)))
    }
}

/// A `BankSource` with memoized fetches
pub struct CachedSource<S> {
    inner: S,
    cache: MemoCache<Vec<RawBankRecord>>,
}

impl<S: BankSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self::with_cache(inner, MemoCache::new(ttl))
    }

    pub fn with_cache(inner: S, cache: MemoCache<Vec<RawBankRecord>>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &MemoCache<Vec<RawBankRecord>> {
        &self.cache
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: BankSource> BankSource for CachedSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self, source_url: &str) -> Result<Vec<RawBankRecord>> {
        self.cache
            .get_or_try_insert_with(source_url, || self.inner.fetch(source_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;
    use serde_json::json;

    /// Source that counts calls and optionally fails
    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl BankSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn fetch(&self, source_url: &str) -> Result<Vec<RawBankRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::retrieval(Some(500), "HTTP 500"));
            }
            Ok(vec![RawBankRecord::from(json!({ "url": source_url }))])
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn manual_cache(clock: Arc<ManualClock>) -> MemoCache<Vec<RawBankRecord>> {
        MemoCache::with_parts(default_ttl(), Box::new(input_hash), clock)
    }

    #[test]
    fn test_input_hash_is_stable_hex() {
        let a = input_hash("https://brasilapi.com.br/api/banks/v1");
        let b = input_hash("https://brasilapi.com.br/api/banks/v1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, input_hash("https://example.com"));
    }

    #[test]
    fn test_cache_hit_skips_source() {
        let source = CachedSource::new(CountingSource::new(false), default_ttl());

        let first = source.fetch("https://fakeapi.com").unwrap();
        let second = source.fetch("https://fakeapi.com").unwrap();

        assert_eq!(first, second);
        assert_eq!(source.inner().calls(), 1);
    }

    #[test]
    fn test_distinct_inputs_are_cached_separately() {
        let source = CachedSource::new(CountingSource::new(false), default_ttl());

        source.fetch("https://a.example").unwrap();
        source.fetch("https://b.example").unwrap();
        source.fetch("https://a.example").unwrap();

        assert_eq!(source.inner().calls(), 2);
        assert_eq!(source.cache().len(), 2);
    }

    #[test]
    fn test_expired_entry_refetches() {
        let clock = Arc::new(ManualClock::new(start()));
        let source =
            CachedSource::with_cache(CountingSource::new(false), manual_cache(clock.clone()));

        source.fetch("https://fakeapi.com").unwrap();
        clock.advance(Duration::hours(23));
        source.fetch("https://fakeapi.com").unwrap();
        assert_eq!(source.inner().calls(), 1);

        clock.advance(Duration::hours(1));
        source.fetch("https://fakeapi.com").unwrap();
        assert_eq!(source.inner().calls(), 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let source = CachedSource::new(CountingSource::new(true), default_ttl());

        assert!(source.fetch("https://fakeapi.com").is_err());
        assert!(source.fetch("https://fakeapi.com").is_err());

        assert_eq!(source.inner().calls(), 2);
        assert!(source.cache().is_empty());
    }

    #[test]
    fn test_custom_key_fn() {
        // Everything shares one key
        let cache: MemoCache<u32> = MemoCache::with_parts(
            default_ttl(),
            Box::new(|_| "constant".to_string()),
            Arc::new(SystemClock),
        );

        cache.insert("a", 1).unwrap();
        assert_eq!(cache.get("b").unwrap(), Some(1));
        assert_eq!(cache.key_for("anything"), "constant");
    }

    #[test]
    fn test_purge_expired() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache: MemoCache<u32> =
            MemoCache::with_parts(Duration::minutes(10), Box::new(input_hash), clock.clone());

        cache.insert("old", 1).unwrap();
        clock.advance(Duration::minutes(5));
        cache.insert("new", 2).unwrap();
        clock.advance(Duration::minutes(6));

        assert_eq!(cache.purge_expired().unwrap(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("new").unwrap(), Some(2));
        assert_eq!(cache.get("old").unwrap(), None);
    }

    #[test]
    fn test_miss_purges_expired_entries() {
        let clock = Arc::new(ManualClock::new(start()));
        let source =
            CachedSource::with_cache(CountingSource::new(false), manual_cache(clock.clone()));

        source.fetch("https://a.example").unwrap();
        clock.advance(Duration::days(2));
        source.fetch("https://b.example").unwrap();

        assert_eq!(source.cache().len(), 1);
    }

    #[test]
    fn test_ttl_past_calendar_range_is_error() {
        let cache: MemoCache<u32> = MemoCache::with_parts(
            Duration::try_days(365 * 1_000_000).unwrap(),
            Box::new(input_hash),
            Arc::new(ManualClock::new(start())),
        );

        assert!(matches!(cache.insert("a", 1), Err(Error::Config(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache: MemoCache<u32> = MemoCache::new(default_ttl());
        cache.insert("a", 1).unwrap();
        cache.clear().unwrap();
        assert!(cache.is_empty());
    }
}
