use async_trait::async_trait;
use event_cache::domain::response::{DeleteResponse, GetResponse, PutResponse};
use event_cache::ports::KeyValueStore;
use shared::{Error, Result};
use std::path::Path;

const EVENT_CACHE_TREE: &str = "event_cache";

/// Sled-backed store that survives restarts
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl SledStore {
    /// Open (or create) the database at `path`
    /// Creates the parent directory if it doesn't exist
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create directory: {}", e)))?;
        }

        let db = sled::open(path)
            .map_err(|e| Error::Storage(format!("Failed to open Sled database: {}", e)))?;
        let tree = db
            .open_tree(EVENT_CACHE_TREE)
            .map_err(|e| Error::Storage(format!("Failed to open tree: {}", e)))?;

        Ok(Self { db, tree })
    }

    fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| Error::Storage(format!("Failed to flush database: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SledStore {
    async fn put(&self, key: String, value: Vec<u8>) -> Result<PutResponse> {
        let previous = self
            .tree
            .insert(key.as_bytes(), value)
            .map_err(|e| Error::Storage(format!("Failed to write '{}': {}", key, e)))?;
        self.flush()?;

        Ok(PutResponse::new(previous.is_none(), "Successfully inserted"))
    }

    async fn get(&self, key: &str) -> Result<GetResponse<Vec<u8>>> {
        let value = self
            .tree
            .get(key.as_bytes())
            .map_err(|e| Error::Storage(format!("Failed to read '{}': {}", key, e)))?;

        match value {
            Some(bytes) => Ok(GetResponse::new(true, bytes.to_vec())),
            None => Err(Error::NotFound),
        }
    }

    async fn delete(&self, key: &str) -> Result<DeleteResponse> {
        let removed = self
            .tree
            .remove(key.as_bytes())
            .map_err(|e| Error::Storage(format!("Failed to delete '{}': {}", key, e)))?
            .is_some();
        self.flush()?;

        Ok(DeleteResponse::new(removed))
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        for item in self.tree.scan_prefix(prefix.as_bytes()) {
            let (key, _) =
                item.map_err(|e| Error::Storage(format!("Failed to iterate database: {}", e)))?;
            keys.push(String::from_utf8_lossy(&key).into_owned());
        }

        Ok(keys)
    }
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore")
            .field("entries", &self.tree.len())
            .finish()
    }
}
