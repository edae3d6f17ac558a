// Read-through cache of published dump outputs, keyed by dump id.
// Only completed dumps are stored and published outputs never change, so a hit and a
// store read always agree. Bounded; evicts the oldest insertion.
// Every invalidation bumps a generation; a fill that started before it is dropped, so a
// store read racing a delete or prune cannot re-populate the deleted id.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use crate::dump_repo::DumpRepo;
use crate::pipeline::ProcessedDump;

#[derive(Default)]
struct Entries {
    map: HashMap<i64, Arc<ProcessedDump>>,
    order: VecDeque<i64>,
    generation: u64,
}

pub struct ResultCache {
    capacity: usize,
    entries: Mutex<Entries>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    /// `capacity == 0` disables caching; every read goes to the store.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(Entries::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub async fn get(&self, dump_id: i64) -> Option<Arc<ProcessedDump>> {
        let entries = self.entries.lock().await;
        let found = entries.map.get(&dump_id).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    pub async fn invalidate(&self, dump_id: i64) {
        let mut entries = self.entries.lock().await;
        entries.generation += 1;
        if entries.map.remove(&dump_id).is_some() {
            entries.order.retain(|id| *id != dump_id);
        }
    }

    /// Snapshot to take before reading outputs from the store.
    pub async fn generation(&self) -> u64 {
        self.entries.lock().await.generation
    }

    /// Insert unless an invalidation happened since `generation` was taken.
    /// Returns whether the entry was stored.
    pub async fn insert_if_current(
        &self,
        dump_id: i64,
        outputs: Arc<ProcessedDump>,
        generation: u64,
    ) -> bool {
        if self.capacity == 0 {
            return false;
        }
        let mut entries = self.entries.lock().await;
        if entries.generation != generation {
            return false;
        }
        if entries.map.insert(dump_id, outputs).is_none() {
            entries.order.push_back(dump_id);
        }
        while entries.map.len() > self.capacity {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            entries.map.remove(&oldest);
        }
        true
    }

    /// Cached outputs, else the store's (cached on the way out). `None` unless completed.
    pub async fn get_or_load(
        &self,
        repo: &DumpRepo,
        dump_id: i64,
    ) -> anyhow::Result<Option<Arc<ProcessedDump>>> {
        if let Some(hit) = self.get(dump_id).await {
            return Ok(Some(hit));
        }
        let generation = self.generation().await;
        let Some(loaded) = repo.load_outputs(dump_id).await? else {
            return Ok(None);
        };
        let loaded = Arc::new(loaded);
        self.insert_if_current(dump_id, Arc::clone(&loaded), generation).await;
        Ok(Some(loaded))
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// (hits, misses) since start.
    pub fn counters(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}
