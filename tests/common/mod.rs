use async_trait::async_trait;
use nostr_sdk::prelude::*;
use parking_lot::Mutex;
use relay_directory::{EventSource, Error};
use std::time::Duration;

/// Relay stand-in holding published relay list events. Answers by author and
/// logs which authors each query asked for.
#[derive(Debug, Default)]
pub struct FakeRelay {
    events: Mutex<Vec<Event>>,
    queries: Mutex<Vec<Vec<PublicKey>>>,
    unreachable: Mutex<bool>,
}

impl FakeRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, event: Event) {
        self.events.lock().push(event);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.lock() = unreachable;
    }

    pub fn queries(&self) -> Vec<Vec<PublicKey>> {
        self.queries.lock().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().len()
    }
}

#[async_trait]
impl EventSource for FakeRelay {
    async fn fetch_events(&self, filter: Filter, _timeout: Duration) -> Result<Vec<Event>, Error> {
        let authors: Vec<PublicKey> = filter
            .authors
            .map(|authors| authors.into_iter().collect())
            .unwrap_or_default();
        self.queries.lock().push(authors.clone());

        if *self.unreachable.lock() {
            return Err(Error::transport("all relays unreachable"));
        }

        Ok(self
            .events
            .lock()
            .iter()
            .filter(|event| authors.contains(&event.pubkey))
            .cloned()
            .collect())
    }
}

pub fn relay_list_event(keys: &Keys, relays: &[&[&str]], created_at: u64) -> Event {
    EventBuilder::new(Kind::RelayList, "")
        .tags(relays.iter().map(|values| {
            Tag::custom(
                TagKind::SingleLetter(SingleLetterTag::lowercase(Alphabet::R)),
                values.iter().map(|value| value.to_string()),
            )
        }))
        .custom_created_at(Timestamp::from(created_at))
        .sign_with_keys(keys)
        .unwrap()
}
