use crate::config::DirectorySettings;
use crate::event_source::DiscoveryClient;
use anyhow::Result;
use nostr_sdk::prelude::*;
use tracing::{debug, warn};

/// Builds a read-only client connected to the discovery relays.
pub async fn create_discovery_client(settings: &DirectorySettings) -> Result<DiscoveryClient> {
    let client = ClientBuilder::default().build();

    let mut added = Vec::new();
    for url in &settings.discovery_relays {
        let relay_url = match RelayUrl::parse(url) {
            Ok(relay_url) => relay_url,
            Err(e) => {
                warn!("Skipping invalid discovery relay {}: {}", url, e);
                continue;
            }
        };

        client.add_relay(relay_url).await?;
        added.push(url.clone());
    }

    if added.is_empty() {
        anyhow::bail!("No valid discovery relays configured");
    }

    debug!("Connecting to discovery relays: {:?}", added);
    client.connect().await;

    Ok(DiscoveryClient::new(client, added))
}
