mod app;

use app::{App, Commands};
use clap::Parser;
use event_cache::domain::StoreConfig;
use event_cache::ports::StorageFactory;
use event_cache::{EventCache, Reconciler};
use shared::config::{Config, StoreKind};
use std::sync::Arc;
use storage_engine::UnifiedStorageFactory;
use sync_client::ApiClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "groupcal-cache")]
#[command(about = "Inspect and reconcile the local group calendar event cache")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load environment variables
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    let config = Config::from_env();

    // ============================================
    // STEP 1: Open the key-value store
    // ============================================
    let store = UnifiedStorageFactory.create_from_config(&store_config(&config))?;

    // ============================================
    // STEP 2: Build the cache and its reconciler
    // ============================================
    let cache = EventCache::new(store)
        .with_default_ttl(config.default_ttl)
        .with_key_prefix(config.key_prefix.clone());

    info!("Event source: {}", config.api_base_url);
    let source = Arc::new(ApiClient::from_config(&config)?);
    let reconciler = Reconciler::new(Arc::new(cache.clone()), source);

    // ============================================
    // STEP 3: Run the command
    // ============================================
    let app = App::new(cache, reconciler);
    app.run(cli.command, &mut std::io::stdout().lock()).await?;

    Ok(())
}

fn store_config(config: &Config) -> StoreConfig {
    match config.store {
        StoreKind::Memory => StoreConfig::Memory {
            name: "event_cache".to_string(),
            max_entries: config.memory_max_entries,
        },
        StoreKind::Sled => StoreConfig::Sled {
            path: config.sled_path(),
        },
    }
}
