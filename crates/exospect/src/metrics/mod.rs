//! Stale-tolerant caching for the model-quality metrics endpoint.
//!
//! The metrics figure is read-mostly and the upstream is slow to wake, so
//! [`MetricsCache::get`] is built to always hand the caller something
//! usable, fast:
//!
//! 1. A live entry (younger than the TTL) is returned with no network.
//! 2. A stale entry is returned immediately while a background refresh
//!    runs (stale-while-revalidate).
//! 3. A cold cache fetches through the [`RequestScheduler`] with a bounded
//!    timeout, retries once after a fixed back-off, then falls back to the
//!    last known entry or the built-in defaults.
//!
//! The fallback cascade means `get` never rejects: upstream failures are
//! logged, never surfaced.

pub mod normalize;

pub use normalize::{DEFAULT_METRICS, ModelMetrics, normalize};

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::{debug, warn};

use crate::scheduler::RequestScheduler;

/// How long a fetched entry counts as live.
pub const METRICS_TTL: Duration = Duration::from_secs(5 * 60);

/// Upper bound on a single upstream fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay before the single automatic retry.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Default cache key — the upstream path serving aggregate metrics.
pub const DEFAULT_METRICS_KEY: &str = "metrics";

/// Why a fetch attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The bounded fetch timeout elapsed. Retried like any upstream fault.
    Timeout,
    /// Caller-initiated cancellation. Frees its scheduler slot like any
    /// completion but suppresses the automatic retry.
    Cancelled,
    /// Network or HTTP-level failure.
    Upstream(String),
    /// The response body is not a structured object.
    Malformed(String),
}

impl FetchError {
    /// Whether this failure should trigger the single automatic retry.
    pub fn retryable(&self) -> bool {
        !matches!(self, FetchError::Cancelled)
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Timeout => write!(f, "fetch timed out"),
            FetchError::Cancelled => write!(f, "fetch cancelled by caller"),
            FetchError::Upstream(msg) => write!(f, "upstream error: {msg}"),
            FetchError::Malformed(msg) => write!(f, "malformed payload: {msg}"),
        }
    }
}

/// Source of raw metrics payloads. Implemented over HTTP in production and
/// by scripted fakes in tests.
pub trait MetricsSource: Send + Sync {
    fn fetch(&self, key: &str) -> BoxFuture<'static, Result<Value, FetchError>>;
}

/// Production [`MetricsSource`]: GET `{base_url}/{key}` expecting JSON.
pub struct HttpMetricsSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMetricsSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent("exospect/0.1")
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl MetricsSource for HttpMetricsSource {
    fn fetch(&self, key: &str) -> BoxFuture<'static, Result<Value, FetchError>> {
        let url = format!("{}/{key}", self.base_url.trim_end_matches('/'));
        let client = self.client.clone();
        Box::pin(async move {
            let resp = client
                .get(&url)
                .header("Accept", "application/json")
                .send()
                .await
                .map_err(|e| FetchError::Upstream(format!("request failed: {e}")))?;
            let status = resp.status();
            let text = resp
                .text()
                .await
                .map_err(|e| FetchError::Upstream(format!("failed to read response: {e}")))?;
            if !status.is_success() {
                return Err(FetchError::Upstream(format!("HTTP {status}: {text}")));
            }
            serde_json::from_str(&text)
                .map_err(|e| FetchError::Malformed(format!("failed to parse response: {e}")))
        })
    }
}

/// Cache timing knobs. Production uses the module constants; tests shrink
/// them.
#[derive(Debug, Clone)]
pub struct MetricsCacheConfig {
    pub ttl: Duration,
    pub fetch_timeout: Duration,
    pub retry_backoff: Duration,
}

impl Default for MetricsCacheConfig {
    fn default() -> Self {
        Self {
            ttl: METRICS_TTL,
            fetch_timeout: FETCH_TIMEOUT,
            retry_backoff: RETRY_BACKOFF,
        }
    }
}

/// One cached value and when it was fetched. At most one per key; a new
/// successful fetch replaces it atomically under the entries lock.
struct CacheEntry {
    value: ModelMetrics,
    fetched_at: DateTime<Utc>,
}

/// Time-boxed cache with stale-while-revalidate and multi-level fallback.
///
/// Cloning is cheap and shares the same entries, source, and scheduler.
#[derive(Clone)]
pub struct MetricsCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    scheduler: RequestScheduler,
    source: Arc<dyn MetricsSource>,
    config: MetricsCacheConfig,
    entries: Mutex<HashMap<String, CacheEntry>>,
    /// Keys with a background refresh in flight, so stale reads don't
    /// stampede the upstream.
    refreshing: Mutex<HashSet<String>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MetricsCache {
    pub fn new(scheduler: RequestScheduler, source: Arc<dyn MetricsSource>) -> Self {
        Self::with_config(scheduler, source, MetricsCacheConfig::default())
    }

    pub fn with_config(
        scheduler: RequestScheduler,
        source: Arc<dyn MetricsSource>,
        config: MetricsCacheConfig,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                scheduler,
                source,
                config,
                entries: Mutex::new(HashMap::new()),
                refreshing: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Get the metrics for `key`. Infallible: the fallback cascade ends at
    /// the built-in defaults, so the caller always receives a usable value.
    pub async fn get(&self, key: &str) -> ModelMetrics {
        let stale = {
            let entries = lock(&self.inner.entries);
            match entries.get(key) {
                Some(entry) => {
                    let age = Utc::now().signed_duration_since(entry.fetched_at);
                    // A negative age (clock step) counts as fresh.
                    let fresh = age
                        .to_std()
                        .map(|d| d < self.inner.config.ttl)
                        .unwrap_or(true);
                    if fresh {
                        debug!("metrics cache hit ({key})");
                        return entry.value;
                    }
                    Some(entry.value)
                }
                None => None,
            }
        };

        if let Some(value) = stale {
            debug!("metrics cache stale ({key}): serving cached value, refreshing in background");
            self.spawn_refresh(key);
            return value;
        }

        self.fetch_and_install(key).await
    }

    /// Drop the entry for `key` so the next `get` refetches.
    pub fn invalidate(&self, key: &str) {
        lock(&self.inner.entries).remove(key);
    }

    fn spawn_refresh(&self, key: &str) {
        {
            let mut refreshing = lock(&self.inner.refreshing);
            if !refreshing.insert(key.to_string()) {
                return;
            }
        }
        let cache = self.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            cache.fetch_and_install(&key).await;
            lock(&cache.inner.refreshing).remove(&key);
        });
    }

    /// One fetch attempt plus the retry/fallback cascade.
    async fn fetch_and_install(&self, key: &str) -> ModelMetrics {
        match self.fetch_once(key).await {
            Ok(value) => self.install(key, value),
            Err(err) if err.retryable() => {
                warn!(
                    "metrics fetch failed ({key}): {err}; retrying in {:?}",
                    self.inner.config.retry_backoff
                );
                tokio::time::sleep(self.inner.config.retry_backoff).await;
                match self.fetch_once(key).await {
                    Ok(value) => self.install(key, value),
                    Err(err) => {
                        warn!("metrics retry failed ({key}): {err}");
                        self.fall_back(key)
                    }
                }
            }
            Err(err) => {
                debug!("metrics fetch not retried ({key}): {err}");
                self.fall_back(key)
            }
        }
    }

    /// A single scheduled fetch, timeout applied inside the scheduled task
    /// so the boundary frees the concurrency slot like a normal completion.
    async fn fetch_once(&self, key: &str) -> Result<ModelMetrics, FetchError> {
        let source = Arc::clone(&self.inner.source);
        let timeout = self.inner.config.fetch_timeout;
        let key_owned = key.to_string();
        let task = async move {
            match tokio::time::timeout(timeout, source.fetch(&key_owned)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout),
            }
        };
        let raw = self
            .inner
            .scheduler
            .submit(task)
            .await
            .map_err(FetchError::Upstream)??;
        normalize(&raw)
    }

    fn install(&self, key: &str, value: ModelMetrics) -> ModelMetrics {
        let mut entries = lock(&self.inner.entries);
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                fetched_at: Utc::now(),
            },
        );
        debug!("metrics cache updated ({key})");
        value
    }

    /// Last resort: last known entry regardless of staleness, then the
    /// built-in defaults. The defaults are installed with the current
    /// timestamp so repeated failures don't refetch within the TTL window.
    fn fall_back(&self, key: &str) -> ModelMetrics {
        {
            let entries = lock(&self.inner.entries);
            if let Some(entry) = entries.get(key) {
                warn!("metrics upstream unavailable ({key}): serving last known value");
                return entry.value;
            }
        }
        warn!("metrics upstream unavailable ({key}) with empty cache: installing defaults");
        self.install(key, DEFAULT_METRICS)
    }
}
