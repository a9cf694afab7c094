//! Generic keyed store with per-entry expiry and eviction callbacks.

use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use fxhash::FxHashMap;

use crate::cache::clock::{Clock, SystemClock};

/// Default entry lifetime when none is given at `pull` time.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

/// Callback invoked with the evicted value, exactly once per entry.
pub type EvictFn<V> = Box<dyn FnOnce(V) + Send>;

struct Entry<V> {
    value: V,
    ttl: Duration,
    expires_at: Instant,
    free: Option<EvictFn<V>>,
}

/// A keyed cache where every entry carries a time-to-live that is reset on
/// each access. Expired entries are removed lazily on the next cache
/// operation (or an explicit [`purge_expired`](TtlCache::purge_expired)
/// call), invoking the entry's eviction callback exactly once.
///
/// Handles share the underlying store: cloning a `TtlCache` yields another
/// view of the same entries.
pub struct TtlCache<K, V> {
    entries: Arc<Mutex<FxHashMap<K, Entry<V>>>>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            clock: Arc::clone(&self.clock),
            default_ttl: self.default_ttl,
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(FxHashMap::default())),
            clock,
            default_ttl,
        }
    }

    /// Returns the live value for `key`, allocating it first if absent.
    ///
    /// An existing entry has its expiry reset and is returned as-is;
    /// `allocate` does not run and `free` is dropped (first allocation wins
    /// until eviction). On a miss `allocate` runs synchronously and the new
    /// entry is stored with `ttl` (or the cache default).
    pub fn pull<F>(&self, key: K, ttl: Option<Duration>, allocate: F, free: Option<EvictFn<V>>) -> V
    where
        F: FnOnce() -> V,
    {
        let now = self.clock.now();
        let mut expired = Vec::new();
        let value;

        {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            Self::sweep(&mut entries, now, &mut expired);

            if let Some(entry) = entries.get_mut(&key) {
                entry.expires_at = now + entry.ttl;
                value = entry.value.clone();
            } else {
                let ttl = ttl.unwrap_or(self.default_ttl);
                value = allocate();
                entries.insert(
                    key,
                    Entry {
                        value: value.clone(),
                        ttl,
                        expires_at: now + ttl,
                        free,
                    },
                );
            }
        }

        Self::run_evictions(expired);
        value
    }

    /// Returns the live value for `key`, resetting its expiry, or `None` on
    /// a miss. Never allocates.
    pub fn touch(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut expired = Vec::new();
        let value;

        {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            Self::sweep(&mut entries, now, &mut expired);

            value = entries.get_mut(key).map(|entry| {
                entry.expires_at = now + entry.ttl;
                entry.value.clone()
            });
        }

        Self::run_evictions(expired);
        value
    }

    /// Removes `key` immediately, running its eviction callback.
    pub fn evict(&self, key: &K) {
        let removed = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.remove(key)
        };

        if let Some(entry) = removed {
            if let Some(free) = entry.free {
                free(entry.value);
            }
        }
    }

    /// Removes every entry whose TTL has elapsed without an intervening
    /// access. Intended to be called once per frame by the render driver;
    /// all other cache operations also sweep opportunistically.
    pub fn purge_expired(&self) {
        let now = self.clock.now();
        let mut expired = Vec::new();

        {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            Self::sweep(&mut entries, now, &mut expired);
        }

        Self::run_evictions(expired);
    }

    /// Removes all entries, running their eviction callbacks.
    pub fn clear(&self) {
        let drained: Vec<Entry<V>> = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.drain().map(|(_, entry)| entry).collect()
        };

        Self::run_evictions(drained);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sweep(entries: &mut FxHashMap<K, Entry<V>>, now: Instant, expired: &mut Vec<Entry<V>>) {
        let dead: Vec<K> = entries
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();

        for key in dead {
            if let Some(entry) = entries.remove(&key) {
                expired.push(entry);
            }
        }
    }

    // Eviction callbacks run outside the store lock so a callback may
    // re-enter the cache.
    fn run_evictions(expired: Vec<Entry<V>>) {
        for entry in expired {
            if let Some(free) = entry.free {
                free(entry.value);
            }
        }
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
