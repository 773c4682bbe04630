//! Content Store: time-bounded cache of received Data, keyed by exact Name.
//!
//! Only Data with a non-zero FreshnessPeriod is cached. Each insertion
//! schedules its own removal; the removal only evicts the insertion that
//! scheduled it, so re-inserting a Name restarts its lifetime.

use crate::table::SyncTable;
use log::trace;
use ndn_common::{
    metrics::Counter,
    ndn::{Data, Name},
};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, OnceLock, Weak,
    },
    time::Instant,
};

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Data,
    stamp: u64,
    expires: Instant,
}

#[derive(Debug, Default)]
pub struct ContentStore {
    table: SyncTable<Name, CacheEntry>,
    next_stamp: AtomicU64,
    evictions: Counter,
}

static GLOBAL: OnceLock<Arc<ContentStore>> = OnceLock::new();

impl ContentStore {
    /// A private store, for faces that must not share cached Data.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The process-wide store shared by every face opened with default
    /// options.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(ContentStore::new))
    }

    /// Returns the cached Data for exactly `name` if it is still fresh.
    pub fn get(&self, name: &Name) -> Option<Data> {
        self.table
            .get(name)
            .filter(|entry| entry.expires > Instant::now())
            .map(|entry| entry.data)
    }

    /// Caches `data` for its freshness period. Returns false (and caches
    /// nothing) when the period is zero.
    pub fn insert(self: &Arc<Self>, data: &Data) -> bool {
        let freshness = data.freshness();
        if freshness.is_zero() {
            return false;
        }

        let stamp = self.next_stamp.fetch_add(1, Ordering::Relaxed);
        let name = data.name.clone();
        self.table.update(name.clone(), |_| {
            Some(CacheEntry {
                data: data.clone(),
                stamp,
                expires: Instant::now() + freshness,
            })
        });
        trace!("Cached {} for {:?}", name, freshness);

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let store: Weak<Self> = Arc::downgrade(self);
            handle.spawn(async move {
                tokio::time::sleep(freshness).await;
                if let Some(store) = store.upgrade() {
                    store.evict(&name, stamp);
                }
            });
        }
        true
    }

    fn evict(&self, name: &Name, stamp: u64) -> bool {
        let evicted = self.table.update_with(name.clone(), |current| match current {
            Some(entry) if entry.stamp == stamp => (None, true),
            other => (other, false),
        });
        if evicted {
            self.evictions.increment();
            trace!("Evicted {}", name);
        }
        evicted
    }

    pub fn remove(&self, name: &Name) -> Option<Data> {
        self.table.remove(name).map(|entry| entry.data)
    }

    pub fn clear(&self) {
        self.table.drain();
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Number of entries removed by their freshness timer.
    pub fn evictions(&self) -> u64 {
        self.evictions.value()
    }
}
