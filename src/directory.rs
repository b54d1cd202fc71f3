//! Outbox/inbox relay resolution.
//!
//! A [`RelayDirectory`] answers "where does this user publish" (their write
//! relays, used to fetch their posts) and "where does this user read" (their
//! read relays, used to deliver mentions) from NIP-65 relay lists, caching
//! what it learns.
//!
//! A user with no relay list is cached as an empty [`RelayList`]. A query that
//! fails is not cached and the error is returned to the caller, so "nothing
//! published" and "could not ask" stay distinguishable.

use crate::cache::{CacheStats, RelayListCache};
use crate::config::DirectorySettings;
use crate::error::Error;
use crate::event_source::EventSource;
use crate::metrics;
use crate::relay_list::{
    is_newer, is_valid_relay_url, mentioned_pubkeys, newest_event, parse_relay_list_event,
    EventRank, RelayList,
};
use nostr_sdk::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

pub struct RelayDirectory {
    source: Arc<dyn EventSource>,
    cache: RelayListCache,
    settings: DirectorySettings,
}

impl std::fmt::Debug for RelayDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayDirectory")
            .field("cache", &self.cache)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl RelayDirectory {
    pub fn new(source: Arc<dyn EventSource>, settings: DirectorySettings) -> Self {
        let cache = RelayListCache::new(settings.cache_max_entries, settings.cache_ttl);
        Self {
            source,
            cache,
            settings,
        }
    }

    pub fn get_cached(&self, pubkey: &PublicKey) -> Option<RelayList> {
        self.cache.get(pubkey)
    }

    pub fn set_cached(&self, pubkey: PublicKey, relay_list: RelayList) {
        self.cache.insert(pubkey, relay_list);
    }

    /// Drops the cached relay list for one user.
    pub fn invalidate(&self, pubkey: &PublicKey) -> bool {
        self.cache.remove(pubkey)
    }

    pub fn clear_cache(&self) {
        debug!("Clearing relay list cache");
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub async fn fetch_user_relay_list(&self, pubkey: &PublicKey) -> Result<RelayList, Error> {
        if let Some(relay_list) = self.get_cached(pubkey) {
            return Ok(relay_list);
        }

        let filter = Filter::new()
            .kind(self.settings.relay_list_kind())
            .author(*pubkey)
            .limit(1);

        metrics::relay_list_queries().increment(1);
        let events = self
            .source
            .fetch_events(filter, self.settings.single_fetch_timeout)
            .await?;

        let kind = self.settings.relay_list_kind();
        let answers = events
            .iter()
            .filter(|event| event.pubkey == *pubkey && event.kind == kind);

        let Some(event) = newest_event(answers) else {
            debug!("No relay list published by {}", pubkey);
            self.cache.insert(*pubkey, RelayList::default());
            return Ok(RelayList::default());
        };

        let relay_list = parse_relay_list_event(event);
        self.cache
            .insert_with_source(*pubkey, relay_list.clone(), Some(EventRank::of(event)));
        Ok(relay_list)
    }

    /// Resolves many users at once. Cached users cost nothing; the rest are
    /// queried in chunks of `batch_chunk_size` authors, one chunk at a time.
    pub async fn fetch_relay_lists_batch(
        &self,
        pubkeys: &[PublicKey],
    ) -> Result<HashMap<PublicKey, RelayList>, Error> {
        let mut result = HashMap::with_capacity(pubkeys.len());
        let mut uncached = Vec::new();
        let mut seen = HashSet::new();

        for pubkey in pubkeys {
            if !seen.insert(*pubkey) {
                continue;
            }
            match self.get_cached(pubkey) {
                Some(relay_list) => {
                    result.insert(*pubkey, relay_list);
                }
                None => uncached.push(*pubkey),
            }
        }

        if uncached.is_empty() {
            return Ok(result);
        }

        debug!(
            "Relay list batch: {} cached, {} to fetch",
            result.len(),
            uncached.len()
        );

        let chunk_size = self.settings.batch_chunk_size.max(1);
        for (index, chunk) in uncached.chunks(chunk_size).enumerate() {
            debug!("Fetching relay list chunk {} ({} authors)", index, chunk.len());
            let resolved = self.fetch_chunk(chunk).await?;
            result.extend(resolved);
        }

        info!(
            "Resolved relay lists for {} users ({} fetched)",
            result.len(),
            uncached.len()
        );
        Ok(result)
    }

    async fn fetch_chunk(
        &self,
        chunk: &[PublicKey],
    ) -> Result<HashMap<PublicKey, RelayList>, Error> {
        let filter = Filter::new()
            .kind(self.settings.relay_list_kind())
            .authors(chunk.iter().copied());

        metrics::relay_list_queries().increment(1);
        let events = self
            .source
            .fetch_events(filter, self.settings.batch_fetch_timeout)
            .await?;

        let kind = self.settings.relay_list_kind();
        let requested: HashSet<&PublicKey> = chunk.iter().collect();
        let mut newest_by_author: HashMap<PublicKey, &Event> = HashMap::new();
        for event in &events {
            // Relays occasionally return authors or kinds that were not asked for
            if event.kind != kind || !requested.contains(&event.pubkey) {
                continue;
            }
            newest_by_author
                .entry(event.pubkey)
                .and_modify(|current| {
                    if is_newer(event, current) {
                        *current = event;
                    }
                })
                .or_insert(event);
        }

        let mut resolved = HashMap::with_capacity(chunk.len());
        for pubkey in chunk {
            let relay_list = match newest_by_author.get(pubkey) {
                Some(event) => {
                    let relay_list = parse_relay_list_event(event);
                    self.cache.insert_with_source(
                        *pubkey,
                        relay_list.clone(),
                        Some(EventRank::of(event)),
                    );
                    relay_list
                }
                None => {
                    self.cache.insert(*pubkey, RelayList::default());
                    RelayList::default()
                }
            };
            resolved.insert(*pubkey, relay_list);
        }

        Ok(resolved)
    }

    /// Where to fetch this user's posts from. Never empty.
    pub async fn get_user_outbox_relays(&self, pubkey: &PublicKey) -> Result<Vec<String>, Error> {
        let relay_list = self.fetch_user_relay_list(pubkey).await?;
        Ok(self.with_fallback(relay_list.write))
    }

    /// Where to deliver events that mention this user. Never empty.
    pub async fn get_user_inbox_relays(&self, pubkey: &PublicKey) -> Result<Vec<String>, Error> {
        let relay_list = self.fetch_user_relay_list(pubkey).await?;
        Ok(self.with_fallback(relay_list.read))
    }

    /// Inverts the authors' write relays into relay -> authors, so one
    /// subscription per relay can cover every author that publishes there.
    pub async fn get_optimal_fetch_relays(
        &self,
        pubkeys: &[PublicKey],
    ) -> Result<HashMap<String, Vec<PublicKey>>, Error> {
        let relay_lists = self.fetch_relay_lists_batch(pubkeys).await?;

        let mut plan: HashMap<String, Vec<PublicKey>> = HashMap::new();
        let mut planned = HashSet::new();
        for pubkey in pubkeys {
            if !planned.insert(*pubkey) {
                continue;
            }

            let write = relay_lists
                .get(pubkey)
                .map(|relay_list| relay_list.write.clone())
                .unwrap_or_default();

            for relay in self.with_fallback(write) {
                let authors = plan.entry(relay).or_default();
                if !authors.contains(pubkey) {
                    authors.push(*pubkey);
                }
            }
        }

        debug!(
            "Fetch plan covers {} authors on {} relays",
            planned.len(),
            plan.len()
        );
        Ok(plan)
    }

    /// Relays to publish to so mentioned users see the event: our own write
    /// relays plus the first few read relays of every mentioned user.
    pub async fn get_publish_relays_for_mentions(
        &self,
        mentioned: &[PublicKey],
        own_write_relays: &[String],
    ) -> Result<Vec<String>, Error> {
        let mut relays = OrderedSet::default();
        relays.extend(own_write_relays.iter().cloned());

        let relay_lists = self.fetch_relay_lists_batch(mentioned).await?;
        for pubkey in mentioned {
            if let Some(relay_list) = relay_lists.get(pubkey) {
                relays.extend(
                    relay_list
                        .read
                        .iter()
                        .take(self.settings.mention_read_relay_cap)
                        .cloned(),
                );
            }
        }

        Ok(relays
            .into_vec()
            .into_iter()
            .filter(|url| is_valid_relay_url(url))
            .collect())
    }

    /// Same as [`Self::get_publish_relays_for_mentions`], taking the mentions
    /// from the `p` tags of the event being published.
    pub async fn get_publish_relays_for_event(
        &self,
        tags: &Tags,
        own_write_relays: &[String],
    ) -> Result<Vec<String>, Error> {
        let mentioned = mentioned_pubkeys(tags);
        self.get_publish_relays_for_mentions(&mentioned, own_write_relays)
            .await
    }

    /// Feeds a relay list event seen on a live subscription into the cache.
    ///
    /// Returns `false` when the cache already holds a list parsed from a newer
    /// event by the same author. Equal timestamps go to the smaller event id,
    /// as in the fetch paths.
    pub fn ingest_relay_list_event(&self, event: &Event) -> Result<bool, Error> {
        if event.kind != self.settings.relay_list_kind() {
            return Err(Error::invalid_event(format!(
                "expected kind {}, got {}",
                self.settings.relay_list_kind, event.kind
            )));
        }

        let incoming = EventRank::of(event);
        if let Some(cached) = self.cache.source(&event.pubkey) {
            if cached > incoming {
                debug!(
                    "Ignoring relay list {} superseded by {} for {}",
                    event.id, cached.id, event.pubkey
                );
                return Ok(false);
            }
        }

        let relay_list = parse_relay_list_event(event);
        self.cache
            .insert_with_source(event.pubkey, relay_list, Some(incoming));
        Ok(true)
    }

    fn with_fallback(&self, relays: Vec<String>) -> Vec<String> {
        if relays.is_empty() {
            vec![self.settings.default_relay.clone()]
        } else {
            relays
        }
    }
}

/// Insertion-ordered set of relay URLs.
#[derive(Debug, Default)]
struct OrderedSet {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl OrderedSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, urls: I) {
        for url in urls {
            if self.seen.insert(url.clone()) {
                self.items.push(url);
            }
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.items
    }
}
