#![deny(clippy::all)]

use crate::domain::response::{DeleteResponse, GetResponse, PutResponse};
use crate::domain::{Delta, FullSnapshot, GroupId, StoreConfig, VersionMarker};
use async_trait::async_trait;
use shared::Result;
use std::sync::Arc;

// Ports are the pluggable extension points for storage, the server and time

/// Port for creating a key-value store from configuration
pub trait StorageFactory: Send + Sync + 'static {
    fn create_from_config(&self, config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>>;
}

/// Port for the byte-oriented store the cache persists into (e.g. sled, moka)
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    async fn put(&self, key: String, value: Vec<u8>) -> Result<PutResponse>;
    /// A missing key is `Err(Error::NotFound)`
    async fn get(&self, key: &str) -> Result<GetResponse<Vec<u8>>>;
    async fn delete(&self, key: &str) -> Result<DeleteResponse>;
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Port for the server that owns the events
#[async_trait]
pub trait EventSource: Send + Sync + 'static {
    /// Full event list for a group
    async fn fetch_all(&self, group: &GroupId) -> Result<FullSnapshot>;

    /// Changes since the versions the client already holds
    async fn fetch_delta(&self, group: &GroupId, known: &[VersionMarker]) -> Result<Delta>;
}

/// Port for wall-clock time in milliseconds since the Unix epoch
pub trait Clock: Send + Sync + 'static {
    fn now_ms(&self) -> u64;
}
