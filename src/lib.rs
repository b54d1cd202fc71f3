pub mod cache;
pub mod config;
pub mod create_client;
pub mod directory;
pub mod error;
pub mod event_source;
pub mod metrics;
pub mod relay_list;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used items
pub use cache::{CacheStats, RelayListCache};
pub use config::DirectorySettings;
pub use directory::RelayDirectory;
pub use error::Error;
pub use event_source::{DiscoveryClient, EventSource};
pub use relay_list::{
    filter_valid_relays, is_valid_relay_url, mentioned_pubkeys, parse_relay_list_event,
    RelayList, RelayListEntry,
};
