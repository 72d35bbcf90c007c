//! Query Client
//!
//! Async layer over `QueryCache`: fetches through a `QuerySource`, retries
//! transient read failures, and notifies subscribers after every change so
//! views can re-render. Single-threaded; no `RefCell` borrow is held across
//! an await point.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use async_trait::async_trait;

use crate::cache::{Freshness, OpId, QueryCache, QueryData, QueryKey, QueryValue};
use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};

/// Where cached values come from
#[async_trait(?Send)]
pub trait QuerySource {
    async fn fetch(&self, key: QueryKey) -> ApiResult<QueryData>;
}

/// Bounded retry for reads. Mutations never go through here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub base_delay_ms: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay_ms: 500 }
    }
}

impl From<&AppConfig> for RetryPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.read_attempts.max(1),
            base_delay_ms: config.retry_delay_ms,
        }
    }
}

type Listener = Rc<dyn Fn()>;

struct ClientInner {
    cache: RefCell<QueryCache>,
    source: Rc<dyn QuerySource>,
    policy: RetryPolicy,
    listeners: RefCell<Vec<Listener>>,
}

/// Shared handle to the session's cache
#[derive(Clone)]
pub struct QueryClient {
    inner: Rc<ClientInner>,
}

impl QueryClient {
    pub fn new(source: Rc<dyn QuerySource>, policy: RetryPolicy) -> Self {
        Self {
            inner: Rc::new(ClientInner {
                cache: RefCell::new(QueryCache::new()),
                source,
                policy,
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Register a callback run after every cache change
    pub fn subscribe(&self, listener: impl Fn() + 'static) {
        self.inner.listeners.borrow_mut().push(Rc::new(listener));
    }

    fn notify(&self) {
        let listeners: Vec<Listener> = self.inner.listeners.borrow().clone();
        for listener in listeners {
            listener();
        }
    }

    // ========================
    // Reads
    // ========================

    pub fn get<T: QueryValue>(&self, key: &QueryKey) -> Option<T> {
        self.inner.cache.borrow().get_as(key)
    }

    pub fn get_data(&self, key: &QueryKey) -> Option<QueryData> {
        self.inner.cache.borrow().get(key).cloned()
    }

    pub fn freshness(&self, key: &QueryKey) -> Option<Freshness> {
        self.inner.cache.borrow().entry(key).map(|e| e.freshness)
    }

    pub fn error(&self, key: &QueryKey) -> Option<ApiError> {
        self.inner.cache.borrow().entry(key).and_then(|e| e.error.clone())
    }

    pub fn last_write(&self, key: &QueryKey) -> Option<OpId> {
        self.inner.cache.borrow().last_write(key)
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.inner.cache.borrow().is_fetching(key)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.cache.borrow().is_empty()
    }

    // ========================
    // Writes
    // ========================

    pub fn set(&self, key: QueryKey, data: QueryData) -> OpId {
        let op = self.inner.cache.borrow_mut().set(key, data);
        log::trace!("[CACHE] set {:?} op={:?}", key, op);
        self.notify();
        op
    }

    /// Cancel an in-flight fetch; its eventual result is ignored
    pub fn cancel(&self, key: &QueryKey) {
        if self.inner.cache.borrow_mut().cancel_fetch(key) {
            log::debug!("[CACHE] cancelled fetch of {:?}", key);
            self.notify();
        }
    }

    /// Discard everything. Session boundaries only.
    pub fn clear(&self) {
        let dropped = {
            let mut cache = self.inner.cache.borrow_mut();
            let n = cache.len();
            cache.clear();
            n
        };
        log::info!("[CACHE] cleared {} entries", dropped);
        self.notify();
    }

    // ========================
    // Fetching
    // ========================

    /// Fetch `key` now, superseding any fetch already in flight.
    /// Ok(true) when the result landed in the cache.
    pub async fn fetch(&self, key: QueryKey) -> ApiResult<bool> {
        let op = self.inner.cache.borrow_mut().begin_fetch(key);
        self.notify();
        self.run_fetch(key, op).await
    }

    /// Fetch only when the key is absent or stale and nothing is in flight
    pub async fn ensure(&self, key: QueryKey) -> ApiResult<bool> {
        let needed = match self.inner.cache.borrow().entry(&key) {
            None => true,
            Some(entry) => entry.freshness == Freshness::Stale && entry.error.is_none(),
        };
        if !needed {
            return Ok(false);
        }
        self.fetch(key).await
    }

    /// Mark `key` stale and start a refetch. The entry is marked stale and
    /// the refetch registered before this returns, so readers keep seeing
    /// the previous value until the returned future lands the new one.
    /// Keys never fetched are left alone.
    pub fn invalidate(&self, key: QueryKey) -> impl Future<Output = ApiResult<bool>> + 'static {
        let op = {
            let mut cache = self.inner.cache.borrow_mut();
            if cache.invalidate(&key) {
                Some(cache.begin_fetch(key))
            } else {
                None
            }
        };
        if op.is_some() {
            log::debug!("[CACHE] invalidated {:?}", key);
            self.notify();
        }
        let client = self.clone();
        async move {
            match op {
                Some(op) => client.run_fetch(key, op).await,
                None => Ok(false),
            }
        }
    }

    async fn run_fetch(&self, key: QueryKey, op: OpId) -> ApiResult<bool> {
        let policy = self.inner.policy;
        let mut attempt = 1;
        let outcome = loop {
            match self.inner.source.fetch(key).await {
                Ok(data) => break Ok(data),
                Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                    if !self.inner.cache.borrow().is_current_fetch(&key, op) {
                        break Err(err);
                    }
                    log::warn!("[CACHE] fetch {:?} failed (attempt {}): {}", key, attempt, err);
                    backoff(policy.base_delay_ms.saturating_mul(attempt)).await;
                    attempt += 1;
                }
                Err(err) => break Err(err),
            }
        };

        let result = match &outcome {
            Ok(_) => Ok(()),
            Err(err) => Err(err.clone()),
        };
        let landed = self.inner.cache.borrow_mut().complete_fetch(key, op, outcome);
        if let Err(err) = &result {
            log::warn!("[CACHE] fetch {:?} failed: {}", key, err);
        }
        self.notify();
        result.map(|_| landed)
    }

    // ========================
    // Mutations
    // ========================

    /// Run a non-speculative mutation. On success the given keys are
    /// invalidated and refetched; on failure nothing in the cache changes
    /// and the error goes back to the caller.
    pub async fn mutate<T, Fut>(&self, mutation: Fut, invalidates: &[QueryKey]) -> ApiResult<T>
    where
        Fut: Future<Output = ApiResult<T>>,
    {
        let value = mutation.await.map_err(|err| {
            log::warn!("[MUTATION] failed: {}", err);
            err
        })?;
        for key in invalidates {
            // Refetch errors are recorded on the entry; the mutation itself succeeded
            let _ = self.invalidate(*key).await;
        }
        Ok(value)
    }
}

#[cfg(target_arch = "wasm32")]
async fn backoff(ms: u32) {
    gloo_timers::future::TimeoutFuture::new(ms).await;
}

#[cfg(not(target_arch = "wasm32"))]
async fn backoff(_ms: u32) {}
