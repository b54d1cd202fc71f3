//! Bounded relay list cache with expiry.
//!
//! Entries expire `ttl` after they were stored. Expired entries are not swept
//! in the background; they are dropped when a lookup finds them. When the cache
//! grows past `max_entries` the least recently used entry is evicted.

use crate::metrics;
use crate::relay_list::{EventRank, RelayList};
use nostr_sdk::PublicKey;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry {
    relay_list: RelayList,
    cached_at: Instant,
    /// The event the list was parsed from, if any.
    source: Option<EventRank>,
    /// Key of this entry in `CacheState::lru`.
    generation: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<PublicKey, CacheEntry>,
    /// Recency order keyed by generation, least recently used first.
    lru: BTreeMap<u64, PublicKey>,
    next_generation: u64,
}

impl CacheState {
    fn next_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }

    fn touch(&mut self, pubkey: &PublicKey) {
        let generation = self.next_generation();
        if let Some(entry) = self.entries.get_mut(pubkey) {
            let previous = std::mem::replace(&mut entry.generation, generation);
            self.lru.remove(&previous);
            self.lru.insert(generation, *pubkey);
        }
    }

    fn insert(&mut self, pubkey: PublicKey, relay_list: RelayList, source: Option<EventRank>) {
        let generation = self.next_generation();
        let entry = CacheEntry {
            relay_list,
            cached_at: Instant::now(),
            source,
            generation,
        };
        if let Some(previous) = self.entries.insert(pubkey, entry) {
            self.lru.remove(&previous.generation);
        }
        self.lru.insert(generation, pubkey);
    }

    fn remove(&mut self, pubkey: &PublicKey) -> Option<CacheEntry> {
        let entry = self.entries.remove(pubkey)?;
        self.lru.remove(&entry.generation);
        Some(entry)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub fresh: usize,
}

#[derive(Debug)]
pub struct RelayListCache {
    state: Mutex<CacheState>,
    max_entries: usize,
    ttl: Duration,
}

impl RelayListCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            max_entries: max_entries.max(1),
            ttl,
        }
    }

    pub fn get(&self, pubkey: &PublicKey) -> Option<RelayList> {
        let mut state = self.state.lock();

        let expired = match state.entries.get(pubkey) {
            None => {
                metrics::relay_list_cache_misses().increment(1);
                return None;
            }
            Some(entry) => entry.cached_at.elapsed() > self.ttl,
        };

        if expired {
            debug!("Relay list cache entry for {} expired", pubkey);
            state.remove(pubkey);
            metrics::relay_list_cache_evictions().increment(1);
            metrics::relay_list_cache_misses().increment(1);
            return None;
        }

        state.touch(pubkey);
        metrics::relay_list_cache_hits().increment(1);
        state
            .entries
            .get(pubkey)
            .map(|entry| entry.relay_list.clone())
    }

    pub fn insert(&self, pubkey: PublicKey, relay_list: RelayList) {
        self.insert_with_source(pubkey, relay_list, None);
    }

    pub fn insert_with_source(
        &self,
        pubkey: PublicKey,
        relay_list: RelayList,
        source: Option<EventRank>,
    ) {
        let mut state = self.state.lock();
        state.insert(pubkey, relay_list, source);

        while state.entries.len() > self.max_entries {
            let Some((_, oldest)) = state.lru.pop_first() else {
                break;
            };
            debug!("Evicting least recently used relay list for {}", oldest);
            state.entries.remove(&oldest);
            metrics::relay_list_cache_evictions().increment(1);
        }
    }

    /// The event behind a fresh entry. Does not refresh recency.
    pub fn source(&self, pubkey: &PublicKey) -> Option<EventRank> {
        let state = self.state.lock();
        state
            .entries
            .get(pubkey)
            .filter(|entry| entry.cached_at.elapsed() <= self.ttl)
            .and_then(|entry| entry.source)
    }

    pub fn remove(&self, pubkey: &PublicKey) -> bool {
        self.state.lock().remove(pubkey).is_some()
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.lru.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let fresh = state
            .entries
            .values()
            .filter(|entry| entry.cached_at.elapsed() <= self.ttl)
            .count();

        CacheStats {
            entries: state.entries.len(),
            fresh,
        }
    }
}
