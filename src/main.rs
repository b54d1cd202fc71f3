use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nostr_sdk::prelude::*;
use relay_directory::{config, create_client::create_discovery_client, metrics, RelayDirectory};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "relay_directory",
    version = "0.1.0",
    about = "Resolves NIP-65 outbox and inbox relays for Nostr users"
)]
struct Args {
    /// Path to config directory
    #[arg(short, long, default_value = "config")]
    config_dir: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Relays a user publishes to
    Outbox { pubkey: String },
    /// Relays a user reads mentions from
    Inbox { pubkey: String },
    /// Relay -> authors plan for fetching posts from many users
    Plan { pubkeys: Vec<String> },
    /// Relays to publish a note mentioning the given users to
    Mentions {
        /// Our own write relays
        #[arg(short, long)]
        own: Vec<String>,
        pubkeys: Vec<String>,
    },
}

fn setup_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,relay_directory=debug"));

    fmt()
        .with_env_filter(env_filter)
        .with_timer(fmt::time::SystemTime)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_level(true)
        .init();
}

fn parse_pubkeys(values: &[String]) -> Result<Vec<PublicKey>> {
    values
        .iter()
        .map(|value| {
            PublicKey::parse(value).with_context(|| format!("Invalid public key: {value}"))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();
    metrics::describe_metrics();

    let args = Args::parse();
    let config = config::Config::new(&args.config_dir).context("Failed to load configuration")?;
    let settings = config
        .get_settings()
        .context("Failed to get directory settings")?;

    let source = create_discovery_client(&settings).await?;
    info!("Discovery relays: {:?}", source.discovery_relays());

    let directory = RelayDirectory::new(Arc::new(source), settings);

    match args.command {
        Command::Outbox { pubkey } => {
            let pubkey = PublicKey::parse(&pubkey).context("Invalid public key")?;
            for relay in directory.get_user_outbox_relays(&pubkey).await? {
                println!("{relay}");
            }
        }
        Command::Inbox { pubkey } => {
            let pubkey = PublicKey::parse(&pubkey).context("Invalid public key")?;
            for relay in directory.get_user_inbox_relays(&pubkey).await? {
                println!("{relay}");
            }
        }
        Command::Plan { pubkeys } => {
            let pubkeys = parse_pubkeys(&pubkeys)?;
            let plan = directory.get_optimal_fetch_relays(&pubkeys).await?;

            let mut relays: Vec<_> = plan.into_iter().collect();
            relays.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));
            for (relay, authors) in relays {
                println!("{relay} ({} authors)", authors.len());
                for author in authors {
                    println!("  {}", author.to_hex());
                }
            }
        }
        Command::Mentions { own, pubkeys } => {
            let pubkeys = parse_pubkeys(&pubkeys)?;
            for relay in directory
                .get_publish_relays_for_mentions(&pubkeys, &own)
                .await?
            {
                println!("{relay}");
            }
        }
    }

    let stats = directory.cache_stats();
    info!(
        "Relay list cache: {} entries ({} fresh)",
        stats.entries, stats.fresh
    );

    Ok(())
}
