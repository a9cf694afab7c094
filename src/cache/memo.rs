//! Async-fetch memoization on top of the TTL cache.
//!
//! Wraps an async producer so concurrent or repeated requests for the same
//! key share a single in-flight-or-resolved result. Callers never await:
//! [`MemoCache::poll`] is a synchronous state inspection, and completion is
//! observed by polling again on a later frame.

use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::Future;

use crate::cache::clock::Clock;
use crate::cache::ttl::TtlCache;
use crate::{MapError, Result};

/// Callback run with the produced value exactly once, after the producer
/// has settled. Nothing to free exists for a failed producer, so the hook
/// only fires for successful ones.
pub type FreeFn<T> = Box<dyn FnOnce(Arc<T>) + Send>;

enum CellState<T> {
    Pending,
    Ready(Arc<T>),
    Failed(String),
}

struct CellInner<T> {
    state: CellState<T>,
    evicted: bool,
    free: Option<FreeFn<T>>,
}

/// A single memoized fetch: created once per key, observed by every caller,
/// transitioning Pending -> Ready or Pending -> Failed exactly once.
pub struct AsyncCell<T> {
    inner: Mutex<CellInner<T>>,
}

impl<T> AsyncCell<T> {
    fn new(free: Option<FreeFn<T>>) -> Self {
        Self {
            inner: Mutex::new(CellInner {
                state: CellState::Pending,
                evicted: false,
                free,
            }),
        }
    }

    /// Records the producer outcome. Later calls are ignored; the cell
    /// never reverts.
    fn settle(&self, result: Result<T>) {
        let deferred_free = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if !matches!(inner.state, CellState::Pending) {
                return;
            }

            inner.state = match result {
                Ok(value) => CellState::Ready(Arc::new(value)),
                Err(err) => CellState::Failed(err.to_string()),
            };

            if inner.evicted {
                // Clone out of the state before touching `free`; both live
                // behind the same guard.
                let ready = match &inner.state {
                    CellState::Ready(value) => Some(value.clone()),
                    _ => None,
                };
                match ready {
                    Some(value) => inner.free.take().map(|free| (free, value)),
                    None => {
                        inner.free = None;
                        None
                    }
                }
            } else {
                None
            }
        };

        if let Some((free, value)) = deferred_free {
            free(value);
        }
    }

    /// Called when the TTL cache drops this cell. If the producer is still
    /// in flight, the free hook is deferred until it settles.
    fn mark_evicted(&self) {
        let deferred_free = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner.evicted = true;
            if matches!(inner.state, CellState::Pending) {
                // The hook stays parked until the producer settles.
                return;
            }
            let ready = match &inner.state {
                CellState::Ready(value) => Some(value.clone()),
                _ => None,
            };
            match ready {
                Some(value) => inner.free.take().map(|free| (free, value)),
                None => {
                    inner.free = None;
                    None
                }
            }
        };

        if let Some((free, value)) = deferred_free {
            free(value);
        }
    }

    fn observe(&self) -> Result<Option<Arc<T>>> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match &inner.state {
            CellState::Pending => Ok(None),
            CellState::Ready(value) => Ok(Some(value.clone())),
            CellState::Failed(message) => Err(MapError::Fetch(message.clone())),
        }
    }
}

/// Keyed memoization of async producers with TTL-bounded retention.
///
/// Producers run on the tokio runtime captured at construction time, so a
/// cache built inside the runtime keeps working when polled from a plain
/// render thread. Without any reachable runtime a poll settles the cell as
/// failed instead of panicking.
pub struct MemoCache<K, T> {
    cache: TtlCache<K, Arc<AsyncCell<T>>>,
    runtime: Option<tokio::runtime::Handle>,
}

impl<K, T> Clone for MemoCache<K, T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<K, T> MemoCache<K, T>
where
    K: Eq + Hash + Clone,
    T: Send + Sync + 'static,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            cache: TtlCache::new(default_ttl),
            runtime: tokio::runtime::Handle::try_current().ok(),
        }
    }

    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: TtlCache::with_clock(default_ttl, clock),
            runtime: tokio::runtime::Handle::try_current().ok(),
        }
    }

    /// Runs producers on an explicitly chosen runtime.
    pub fn with_runtime(default_ttl: Duration, runtime: tokio::runtime::Handle) -> Self {
        Self {
            cache: TtlCache::new(default_ttl),
            runtime: Some(runtime),
        }
    }

    /// Non-blocking lookup. The first call for a key spawns `allocate`'s
    /// future on the tokio runtime and stores a pending cell; subsequent
    /// calls return the same cell without re-invoking `allocate`, so at
    /// most one fetch per key is ever in flight.
    ///
    /// Returns `Ok(None)` while pending, `Ok(Some(value))` once resolved,
    /// and re-raises the producer's error on every call once failed. An
    /// error marks the key as currently broken, not a crash; the cell is
    /// retried only after TTL eviction drops it.
    pub fn poll<F, Fut>(&self, key: K, ttl: Option<Duration>, allocate: F) -> Result<Option<Arc<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.poll_with_free(key, ttl, allocate, None)
    }

    /// As [`poll`](Self::poll), additionally registering a hook that runs
    /// once the producer settles successfully and the cell has been
    /// evicted, even when eviction races the in-flight future.
    pub fn poll_with_free<F, Fut>(
        &self,
        key: K,
        ttl: Option<Duration>,
        allocate: F,
        free: Option<FreeFn<T>>,
    ) -> Result<Option<Arc<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let mut producer = None;
        let cell = self.cache.pull(
            key,
            ttl,
            || {
                producer = Some(allocate());
                Arc::new(AsyncCell::new(free))
            },
            Some(Box::new(|cell: Arc<AsyncCell<T>>| cell.mark_evicted())),
        );

        if let Some(future) = producer {
            let cell = cell.clone();
            let runtime = self
                .runtime
                .clone()
                .or_else(|| tokio::runtime::Handle::try_current().ok());
            match runtime {
                Some(runtime) => {
                    runtime.spawn(async move {
                        let outcome = future.await;
                        cell.settle(outcome);
                    });
                }
                // Settle as failed so the caller sees a broken key, not a
                // panic in the middle of a frame.
                None => cell.settle(Err(MapError::Fetch(
                    "no tokio runtime reachable to run the fetch on".to_string(),
                ))),
            }
        }

        cell.observe()
    }

    /// Drops every memoized cell, deferring free hooks of in-flight
    /// producers until they settle.
    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn purge_expired(&self) {
        self.cache.purge_expired();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
