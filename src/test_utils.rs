use crate::error::Error;
use crate::event_source::EventSource;
use async_trait::async_trait;
use nostr_sdk::prelude::*;
use parking_lot::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub filter: Filter,
    pub authors: Vec<PublicKey>,
    pub timeout: Duration,
}

/// In-memory event source that answers author filters from a fixed event set
/// and records every query it receives.
#[derive(Debug, Default)]
pub struct MockEventSource {
    events: Mutex<Vec<Event>>,
    calls: Mutex<Vec<RecordedCall>>,
    failure: Mutex<Option<String>>,
    ignore_authors: bool,
}

impl MockEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored event regardless of the requested authors.
    pub fn ignoring_authors(mut self) -> Self {
        self.ignore_authors = true;
        self
    }

    pub fn add_event(&self, event: Event) {
        self.events.lock().push(event);
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    async fn fetch_events(&self, filter: Filter, timeout: Duration) -> Result<Vec<Event>, Error> {
        let authors: Vec<PublicKey> = filter
            .authors
            .as_ref()
            .map(|authors| authors.iter().copied().collect())
            .unwrap_or_default();

        self.calls.lock().push(RecordedCall {
            filter: filter.clone(),
            authors: authors.clone(),
            timeout,
        });

        if let Some(message) = self.failure.lock().clone() {
            return Err(Error::transport(message));
        }

        let events = self.events.lock();
        Ok(events
            .iter()
            .filter(|event| self.ignore_authors || authors.contains(&event.pubkey))
            .cloned()
            .collect())
    }
}

pub fn r_tag(values: &[&str]) -> Tag {
    Tag::custom(
        TagKind::SingleLetter(SingleLetterTag::lowercase(Alphabet::R)),
        values.iter().map(|value| value.to_string()),
    )
}

/// Signed relay list event carrying exactly `tags`.
pub fn signed_relay_list(keys: &Keys, tags: Vec<Tag>, created_at: u64) -> Event {
    EventBuilder::new(Kind::RelayList, "")
        .tags(tags)
        .custom_created_at(Timestamp::from(created_at))
        .sign_with_keys(keys)
        .unwrap()
}

/// Signed relay list event with one `r` tag per entry of `relays`.
pub fn relay_list_event(keys: &Keys, relays: &[&[&str]], created_at: u64) -> Event {
    let tags = relays.iter().map(|values| r_tag(values)).collect();
    signed_relay_list(keys, tags, created_at)
}
