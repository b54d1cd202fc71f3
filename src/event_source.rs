use crate::error::Error;
use async_trait::async_trait;
use nostr_sdk::prelude::*;
use std::time::Duration;
use tracing::debug;

/// Something that can answer a filter with stored events.
///
/// Connection pooling, retries and relay selection are the implementation's
/// business. An empty result means the relays answered and had nothing; any
/// failure to get an answer must be an `Err`.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_events(&self, filter: Filter, timeout: Duration) -> Result<Vec<Event>, Error>;
}

#[async_trait]
impl EventSource for Client {
    async fn fetch_events(&self, filter: Filter, timeout: Duration) -> Result<Vec<Event>, Error> {
        let events = Client::fetch_events(self, filter, timeout).await?;
        Ok(events.into_iter().collect())
    }
}

/// Sends every query to a fixed set of discovery relays instead of the
/// client's whole pool.
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    client: Client,
    discovery_relays: Vec<String>,
}

impl DiscoveryClient {
    pub fn new(client: Client, discovery_relays: Vec<String>) -> Self {
        Self {
            client,
            discovery_relays,
        }
    }

    pub fn discovery_relays(&self) -> &[String] {
        &self.discovery_relays
    }
}

#[async_trait]
impl EventSource for DiscoveryClient {
    async fn fetch_events(&self, filter: Filter, timeout: Duration) -> Result<Vec<Event>, Error> {
        debug!(
            "Querying {} discovery relays with filter: {:?}",
            self.discovery_relays.len(),
            filter
        );
        let events = self
            .client
            .fetch_events_from(self.discovery_relays.clone(), filter, timeout)
            .await?;
        Ok(events.into_iter().collect())
    }
}
