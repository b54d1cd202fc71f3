use config::{Config as ConfigTree, ConfigError, Environment, File};
use nostr_sdk::Kind;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const ENVIRONMENT_PREFIX: &str = "RELAY_DIRECTORY";
const CONFIG_SEPARATOR: &str = "__";

pub const DEFAULT_FALLBACK_RELAY: &str = "wss://yabu.me";
pub const DEFAULT_DISCOVERY_RELAYS: [&str; 2] = ["wss://directory.yabu.me", "wss://purplepag.es"];

#[derive(Debug, Deserialize, Clone)]
pub struct DirectorySettings {
    #[serde(
        default = "default_cache_max_entries",
        deserialize_with = "validate_non_zero"
    )]
    pub cache_max_entries: usize,
    #[serde(with = "humantime_serde", default = "default_cache_ttl")]
    pub cache_ttl: Duration,
    #[serde(with = "humantime_serde", default = "default_single_fetch_timeout")]
    pub single_fetch_timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_batch_fetch_timeout")]
    pub batch_fetch_timeout: Duration,
    #[serde(
        default = "default_batch_chunk_size",
        deserialize_with = "validate_non_zero"
    )]
    pub batch_chunk_size: usize,
    #[serde(default = "default_relay")]
    pub default_relay: String,
    #[serde(default = "default_mention_read_relay_cap")]
    pub mention_read_relay_cap: usize,
    #[serde(default = "default_relay_list_kind")]
    pub relay_list_kind: u16,
    #[serde(default = "default_discovery_relays")]
    pub discovery_relays: Vec<String>,
}

impl DirectorySettings {
    pub fn relay_list_kind(&self) -> Kind {
        Kind::from(self.relay_list_kind)
    }
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            cache_max_entries: default_cache_max_entries(),
            cache_ttl: default_cache_ttl(),
            single_fetch_timeout: default_single_fetch_timeout(),
            batch_fetch_timeout: default_batch_fetch_timeout(),
            batch_chunk_size: default_batch_chunk_size(),
            default_relay: default_relay(),
            mention_read_relay_cap: default_mention_read_relay_cap(),
            relay_list_kind: default_relay_list_kind(),
            discovery_relays: default_discovery_relays(),
        }
    }
}

fn default_cache_max_entries() -> usize {
    500
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_single_fetch_timeout() -> Duration {
    Duration::from_secs(8)
}

fn default_batch_fetch_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_batch_chunk_size() -> usize {
    50
}

fn default_relay() -> String {
    DEFAULT_FALLBACK_RELAY.to_string()
}

fn default_mention_read_relay_cap() -> usize {
    2
}

fn default_relay_list_kind() -> u16 {
    10002
}

fn default_discovery_relays() -> Vec<String> {
    DEFAULT_DISCOVERY_RELAYS
        .iter()
        .map(|url| url.to_string())
        .collect()
}

fn validate_non_zero<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = usize::deserialize(deserializer)?;
    if value == 0 {
        return Err(D::Error::custom("value must be greater than 0"));
    }
    Ok(value)
}

#[derive(Debug, Clone)]
pub struct Config {
    config: ConfigTree,
}

impl Config {
    pub fn new<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let environment =
            std::env::var(format!("{ENVIRONMENT_PREFIX}{CONFIG_SEPARATOR}ENVIRONMENT"))
                .unwrap_or_else(|_| "development".into());

        let config_dir = config_dir.as_ref();
        let default_config = config_dir.join("settings.yml");
        let env_config = config_dir.join(format!("settings.{}.yml", environment));
        let local_config = config_dir.join("settings.local.yml");

        let config = ConfigTree::builder()
            .add_source(File::from(default_config))
            .add_source(File::from(env_config).required(false))
            .add_source(File::from(local_config).required(false))
            .add_source(
                Environment::with_prefix(ENVIRONMENT_PREFIX)
                    .separator(CONFIG_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;

        Ok(Config { config })
    }

    pub fn get_settings(&self) -> Result<DirectorySettings, ConfigError> {
        let settings: DirectorySettings = self.config.get("directory")?;
        tracing::debug!(
            "Directory config: cache_max_entries={}, cache_ttl={:?}, batch_chunk_size={}, discovery_relays={:?}",
            settings.cache_max_entries,
            settings.cache_ttl,
            settings.batch_chunk_size,
            settings.discovery_relays,
        );
        Ok(settings)
    }
}
