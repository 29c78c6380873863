pub mod moka_store;
pub mod sled_store;

use event_cache::domain::StoreConfig;
use event_cache::ports::{KeyValueStore, StorageFactory};
use shared::Result;
use std::sync::Arc;
use tracing::info;

pub use moka_store::MokaStore;
pub use sled_store::SledStore;

/// Builds whichever backend the configuration names
#[derive(Clone, Copy, Debug, Default)]
pub struct UnifiedStorageFactory;

impl StorageFactory for UnifiedStorageFactory {
    fn create_from_config(&self, config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>> {
        match config {
            StoreConfig::Memory { name, max_entries } => {
                info!(
                    "Using in-memory event store '{}' (max entries: {:?})",
                    name, max_entries
                );
                Ok(Arc::new(MokaStore::new(name, *max_entries)))
            }
            StoreConfig::Sled { path } => {
                info!("Using sled event store at {}", path.display());
                Ok(Arc::new(SledStore::new(path)?))
            }
        }
    }
}
