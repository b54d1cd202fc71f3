//! NIP-65 relay list metadata.
//!
//! A relay list event (kind 10002) declares the relays a user writes to
//! (their outbox) and reads from (their inbox) with `r` tags:
//!
//! ```text
//! ["r", "wss://both.example.com"]
//! ["r", "wss://inbox.example.com", "read"]
//! ["r", "wss://outbox.example.com", "write"]
//! ```

use nostr_sdk::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

const RELAY_TAG: &str = "r";
const READ_MARKER: &str = "read";
const WRITE_MARKER: &str = "write";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayListEntry {
    pub url: String,
    pub readable: bool,
    pub writable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayList {
    /// Inbox relays, used to deliver mentions to the user.
    pub read: Vec<String>,
    /// Outbox relays, used to fetch the user's own posts.
    pub write: Vec<String>,
    /// Every accepted `r` tag in declaration order.
    pub entries: Vec<RelayListEntry>,
}

impl RelayList {
    /// An empty list is a valid result: the user has not published one.
    pub fn is_empty(&self) -> bool {
        self.read.is_empty() && self.write.is_empty() && self.entries.is_empty()
    }

    fn push(&mut self, tag: RelayListTag) {
        let (readable, writable) = tag.marker.capabilities();
        if readable {
            self.read.push(tag.url.clone());
        }
        if writable {
            self.write.push(tag.url.clone());
        }
        self.entries.push(RelayListEntry {
            url: tag.url,
            readable,
            writable,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMarker {
    Read,
    Write,
    Both,
}

impl RelayMarker {
    fn from_tag_value(value: Option<&String>) -> Self {
        match value.map(String::as_str) {
            Some(READ_MARKER) => RelayMarker::Read,
            Some(WRITE_MARKER) => RelayMarker::Write,
            _ => RelayMarker::Both,
        }
    }

    /// (readable, writable)
    fn capabilities(self) -> (bool, bool) {
        match self {
            RelayMarker::Read => (true, false),
            RelayMarker::Write => (false, true),
            RelayMarker::Both => (true, true),
        }
    }
}

/// A decoded `r` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayListTag {
    pub url: String,
    pub marker: RelayMarker,
}

impl TryFrom<&Tag> for RelayListTag {
    type Error = ();

    fn try_from(tag: &Tag) -> Result<Self, Self::Error> {
        let [name, url, rest @ ..] = tag.as_slice() else {
            return Err(());
        };

        if name != RELAY_TAG || !is_valid_relay_url(url) {
            return Err(());
        }

        Ok(Self {
            url: url.clone(),
            marker: RelayMarker::from_tag_value(rest.first()),
        })
    }
}

/// Builds a [`RelayList`] from a relay list event.
///
/// The event kind is not checked. Tags that are not `r` tags, or whose URL is
/// not a `ws://`/`wss://` URL, are skipped; the rest of the event is still used.
/// No de-duplication is done.
pub fn parse_relay_list_event(event: &Event) -> RelayList {
    event
        .tags
        .iter()
        .filter_map(|tag| RelayListTag::try_from(tag).ok())
        .fold(RelayList::default(), |mut list, tag| {
            list.push(tag);
            list
        })
}

pub fn is_valid_relay_url(url: &str) -> bool {
    RelayUrl::parse(url).is_ok()
}

/// Keeps the valid relay URLs, or returns `[default_relay]` if none survive.
pub fn filter_valid_relays(relays: &[String], default_relay: &str) -> Vec<String> {
    let valid: Vec<String> = relays
        .iter()
        .filter(|url| is_valid_relay_url(url))
        .cloned()
        .collect();

    if valid.is_empty() {
        vec![default_relay.to_string()]
    } else {
        valid
    }
}

/// Picks the most recent event. Equal timestamps resolve to the smallest event id,
/// so the result does not depend on the order relays returned the events in.
pub fn newest_event<'a, I>(events: I) -> Option<&'a Event>
where
    I: IntoIterator<Item = &'a Event>,
{
    events.into_iter().reduce(|best, candidate| {
        if is_newer(candidate, best) {
            candidate
        } else {
            best
        }
    })
}

pub(crate) fn is_newer(candidate: &Event, current: &Event) -> bool {
    EventRank::of(candidate) > EventRank::of(current)
}

/// Orders relay list events by recency: later `created_at` ranks higher, and
/// on equal timestamps the smaller event id ranks higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRank {
    pub created_at: Timestamp,
    pub id: EventId,
}

impl EventRank {
    pub fn of(event: &Event) -> Self {
        Self {
            created_at: event.created_at,
            id: event.id,
        }
    }
}

impl Ord for EventRank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| other.id.as_bytes().cmp(self.id.as_bytes()))
    }
}

impl PartialOrd for EventRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Public keys referenced by `p` tags, in tag order and without repeats.
pub fn mentioned_pubkeys(tags: &Tags) -> Vec<PublicKey> {
    let mut seen = HashSet::new();
    tags.iter()
        .filter(|tag| tag.kind() == TagKind::p())
        .filter_map(|tag| tag.content())
        .filter_map(|content| PublicKey::parse(content).ok())
        .filter(|pubkey| seen.insert(*pubkey))
        .collect()
}
