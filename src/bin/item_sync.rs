//! Keeps a local JSON copy of the item catalogue in step with the API.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use backoffice_api::{
    config::init_tracing_with,
    sync::{poll, CacheStore, SyncClient},
};

#[derive(Parser, Debug)]
#[command(name = "item-sync", about = "Mirror items from the back-office API into a local cache")]
struct Cli {
    /// API root, e.g. http://localhost:8080
    #[arg(long, env = "ITEM_SYNC_BASE_URL", default_value = "http://localhost:8080")]
    base_url: String,

    /// Bearer token used for /api/items/updated
    #[arg(long, env = "ITEM_SYNC_TOKEN")]
    token: String,

    /// Cache file location
    #[arg(long, env = "ITEM_SYNC_CACHE", default_value = "items-cache.json")]
    cache: PathBuf,

    /// Log level when RUST_LOG is unset
    #[arg(long, env = "ITEM_SYNC_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit JSON log lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single sync round and exit (default)
    Once,
    /// Poll until interrupted
    Watch {
        #[arg(long, default_value_t = 30)]
        interval_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with(
        &format!("item_sync={0},backoffice_api={0}", cli.log_level),
        cli.log_json,
    );

    let client = SyncClient::new(cli.base_url, cli.token)?;
    let store = CacheStore::new(cli.cache);
    let mut cache = store.load().await;
    info!(
        cached = cache.len(),
        since = cache.last_synced(),
        base_url = client.base_url(),
        "item cache loaded"
    );

    match cli.command.unwrap_or(Command::Once) {
        Command::Once => {
            let outcome = client.sync_once(&mut cache).await?;
            store.save(&cache).await?;
            println!(
                "added {} updated {} removed {}{} ({} items cached, cursor {})",
                outcome.added,
                outcome.updated,
                outcome.removed,
                if outcome.full_refresh { " [full refresh]" } else { "" },
                cache.len(),
                cache.last_synced()
            );
        }
        Command::Watch { interval_secs } => {
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("failed to install Ctrl+C handler: {}", e);
                }
            };
            let stats = poll(
                &client,
                &mut cache,
                &store,
                Duration::from_secs(interval_secs.max(1)),
                shutdown,
            )
            .await;
            println!(
                "{} rounds, {} failed ({} items cached)",
                stats.rounds,
                stats.failures,
                cache.len()
            );
        }
    }

    Ok(())
}
