use async_trait::async_trait;
use event_cache::domain::response::{DeleteResponse, GetResponse, PutResponse};
use event_cache::ports::KeyValueStore;
use moka::future::Cache;
use shared::{Error, Result};

/// Moka-based in-memory store.
///
/// Entries carry their own freshness, so the moka cache itself has no TTL;
/// a capacity bound is optional.
pub struct MokaStore {
    cache: Cache<String, Vec<u8>>,
}

impl MokaStore {
    /// Create a named Moka store, holding at most `max_entries` keys when set
    pub fn new(name: &str, max_entries: Option<u64>) -> Self {
        let mut builder = Cache::builder().name(name);

        if let Some(capacity) = max_entries {
            builder = builder.max_capacity(capacity);
        }

        Self {
            cache: builder.build(),
        }
    }
}

#[async_trait]
impl KeyValueStore for MokaStore {
    async fn put(&self, key: String, value: Vec<u8>) -> Result<PutResponse> {
        let created = !self.cache.contains_key(&key);
        self.cache.insert(key, value).await;
        Ok(PutResponse::new(created, "Successfully inserted"))
    }

    async fn get(&self, key: &str) -> Result<GetResponse<Vec<u8>>> {
        match self.cache.get(key).await {
            Some(value) => Ok(GetResponse::new(true, value)),
            None => Err(Error::NotFound), // Either never stored or evicted
        }
    }

    async fn delete(&self, key: &str) -> Result<DeleteResponse> {
        let existed = self.cache.remove(key).await.is_some();
        Ok(DeleteResponse::new(existed))
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let keys = self
            .cache
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.to_string())
            .collect();
        Ok(keys)
    }
}

impl std::fmt::Debug for MokaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore")
            .field("entry_count", &self.cache.entry_count())
            .field("weighted_size", &self.cache.weighted_size())
            .finish()
    }
}
