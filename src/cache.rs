use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::WriteupApi;
use crate::error::ApiError;
use crate::models::{QueryKey, Writeup, WriteupFilters};

/// Cached results younger than this are served without a network call.
pub const DEFAULT_FRESH_FOR: Duration = Duration::from_secs(10 * 60);
/// Slots unused for this long are discarded on the next cache touch.
pub const DEFAULT_EVICT_AFTER: Duration = Duration::from_secs(60 * 60);

#[derive(Clone)]
struct CachedList {
    items: Arc<Vec<Writeup>>,
    fetched_at: Instant,
}

struct Slot {
    data: Option<CachedList>,
    error: Option<ApiError>,
    inflight: bool,
    last_used: Instant,
}

impl Slot {
    fn new() -> Self {
        Slot {
            data: None,
            error: None,
            inflight: false,
            last_used: Instant::now(),
        }
    }
}

/// Snapshot handed to the view layer. `data` retains the last successful
/// value across a failed refetch; `is_pending` is true only while a fetch is
/// in flight and no value exists yet for the key.
#[derive(Debug, Clone, Default)]
pub struct QueryView {
    pub data: Option<Arc<Vec<Writeup>>>,
    pub error: Option<ApiError>,
    pub is_pending: bool,
}

/// Per-key lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    Idle,
    Fetching,
    Fresh,
    Stale,
    Errored,
}

/// Filter-keyed fetch orchestrator. Each server-relevant filter tuple owns a
/// slot holding its last result; results only ever land in their own key's
/// slot, so a slow response for a previously active key can never overwrite
/// what the currently active key displays. There is no refetch on focus
/// regain; a stale value is shown as-is until the freshness window expires or
/// the key changes.
pub struct QueryCache<A: WriteupApi> {
    api: A,
    slots: DashMap<QueryKey, Slot>,
    locks: DashMap<QueryKey, Arc<Mutex<()>>>,
    fresh_for: Duration,
    evict_after: Duration,
}

impl<A: WriteupApi> QueryCache<A> {
    pub fn new(api: A) -> Self {
        Self::with_windows(api, DEFAULT_FRESH_FOR, DEFAULT_EVICT_AFTER)
    }

    pub fn with_windows(api: A, fresh_for: Duration, evict_after: Duration) -> Self {
        Self {
            api,
            slots: DashMap::new(),
            locks: DashMap::new(),
            fresh_for,
            evict_after,
        }
    }

    pub fn phase(&self, filters: &WriteupFilters) -> QueryPhase {
        let key = filters.query_key();
        match self.slots.get(&key) {
            None => QueryPhase::Idle,
            Some(slot) => {
                if slot.inflight {
                    QueryPhase::Fetching
                } else if slot.error.is_some() {
                    QueryPhase::Errored
                } else if let Some(cached) = &slot.data {
                    if cached.fetched_at.elapsed() < self.fresh_for {
                        QueryPhase::Fresh
                    } else {
                        QueryPhase::Stale
                    }
                } else {
                    QueryPhase::Idle
                }
            }
        }
    }

    /// Non-blocking snapshot for the given filters.
    pub fn view(&self, filters: &WriteupFilters) -> QueryView {
        let key = filters.query_key();
        match self.slots.get(&key) {
            None => QueryView::default(),
            Some(slot) => QueryView {
                data: slot.data.as_ref().map(|c| c.items.clone()),
                error: slot.error.clone(),
                is_pending: slot.inflight && slot.data.is_none(),
            },
        }
    }

    /// Serve the cached value if still fresh, otherwise fetch. Concurrent
    /// resolves for the same key coalesce into one network call; distinct
    /// keys never block each other.
    pub async fn resolve(&self, filters: &WriteupFilters) -> QueryView {
        self.evict_unused();
        let key = filters.query_key();
        if self.touch_fresh(&key) {
            return self.view(filters);
        }
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;
        // A coalesced caller finds the value the winner just fetched.
        if self.touch_fresh(&key) {
            return self.view(filters);
        }
        self.set_inflight(&key);
        let result = self.api.fetch_writeups(filters).await;
        {
            let mut slot = self.slots.entry(key).or_insert_with(Slot::new);
            slot.inflight = false;
            slot.last_used = Instant::now();
            match result {
                Ok(items) => {
                    debug!(count = items.len(), "query resolved");
                    slot.data = Some(CachedList {
                        items: Arc::new(items),
                        fetched_at: Instant::now(),
                    });
                    slot.error = None;
                }
                Err(e) => {
                    warn!(error = %e, "query failed");
                    // last successful data stays in place
                    slot.error = Some(e);
                }
            }
        }
        self.view(filters)
    }

    /// True when the slot holds a value inside the freshness window; bumps
    /// `last_used` either way.
    fn touch_fresh(&self, key: &QueryKey) -> bool {
        if let Some(mut slot) = self.slots.get_mut(key) {
            slot.last_used = Instant::now();
            if let Some(cached) = &slot.data {
                return cached.fetched_at.elapsed() < self.fresh_for;
            }
        }
        false
    }

    fn set_inflight(&self, key: &QueryKey) {
        let mut slot = self.slots.entry(key.clone()).or_insert_with(Slot::new);
        slot.inflight = true;
        slot.last_used = Instant::now();
    }

    fn evict_unused(&self) {
        let window = self.evict_after;
        self.slots
            .retain(|_, slot| slot.inflight || slot.last_used.elapsed() < window);
        self.locks
            .retain(|key, lock| Arc::strong_count(lock) > 1 || self.slots.contains_key(key));
    }
}
