//! Snapshot fetching with a time-bounded cache.
//!
//! - A fresh cache entry (`age <= ttl`) is served without touching the network.
//! - A stale or missing entry triggers exactly one request through the
//!   `SnapshotSource` port. Concurrent callers that miss the cache at the same
//!   time wait on the cache lock and share the outcome of that one request.
//! - A failed request leaves the previous entry in place.
//! - Reading the cache age never waits on an in-flight request.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::ports::SnapshotSource;

/// Decoded provider body, as returned by the tracker endpoint.
pub type RawSnapshot = serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("malformed response body: {0}")]
    Body(String),
}

struct CacheEntry {
    data: Arc<RawSnapshot>,
    fetched_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) <= ttl
    }
}

#[derive(Default)]
struct CacheState {
    entry: Option<CacheEntry>,
    // Outcome of the most recent request, if it failed.
    last_error: Option<FetchError>,
}

pub struct SnapshotFetcher {
    source: Arc<dyn SnapshotSource>,
    ttl: Duration,
    // Held across the outbound request; serializes cache misses.
    inflight: Mutex<()>,
    // Only ever held briefly, never across an await on the network.
    state: Mutex<CacheState>,
    // Completed requests; bumped while holding `inflight`.
    attempts: AtomicU64,
}

impl SnapshotFetcher {
    pub fn new(source: Arc<dyn SnapshotSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            inflight: Mutex::new(()),
            state: Mutex::new(CacheState::default()),
            attempts: AtomicU64::new(0),
        }
    }

    pub async fn get_snapshot(&self) -> Result<Arc<RawSnapshot>, FetchError> {
        self.get_snapshot_at(Instant::now()).await
    }

    pub async fn get_snapshot_at(&self, now: Instant) -> Result<Arc<RawSnapshot>, FetchError> {
        let seen = self.attempts.load(Ordering::Acquire);
        let _inflight = self.inflight.lock().await;

        {
            let st = self.state.lock().await;

            // Someone else completed a request while we were waiting: share it.
            if self.attempts.load(Ordering::Acquire) != seen {
                if let Some(err) = &st.last_error {
                    debug!("sharing failed snapshot request with waiting caller");
                    return Err(err.clone());
                }
                if let Some(entry) = &st.entry {
                    debug!("sharing fresh snapshot with waiting caller");
                    return Ok(entry.data.clone());
                }
            }

            if let Some(entry) = st.entry.as_ref().filter(|e| e.is_fresh(now, self.ttl)) {
                debug!("snapshot cache hit");
                return Ok(entry.data.clone());
            }
        }

        info!("fetching flight snapshot");
        let result = self.source.fetch().await;

        let mut st = self.state.lock().await;
        self.attempts.fetch_add(1, Ordering::AcqRel);

        match result {
            Ok(data) => {
                let data = Arc::new(data);
                st.entry = Some(CacheEntry {
                    data: data.clone(),
                    fetched_at: now,
                });
                st.last_error = None;
                Ok(data)
            }
            Err(e) => {
                warn!(error = %e, stale_entry = st.entry.is_some(), "snapshot fetch failed");
                st.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Age of the cached entry (fresh or stale), if any.
    pub async fn cache_age(&self) -> Option<Duration> {
        self.cache_age_at(Instant::now()).await
    }

    pub async fn cache_age_at(&self, now: Instant) -> Option<Duration> {
        let st = self.state.lock().await;
        st.entry
            .as_ref()
            .map(|e| now.saturating_duration_since(e.fetched_at))
    }
}
