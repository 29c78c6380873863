use crate::clock::SystemClock;
use crate::domain::{CacheEntry, CachedEvent, EventId, GroupId};
use crate::planes::data::operation::CacheOperations;
use crate::ports::{Clock, KeyValueStore};
use async_trait::async_trait;
use shared::{Error, Result, TtlMs};
use std::sync::Arc;
use tracing::{debug, warn};

/// Application service that owns the per-group event cache.
///
/// Construct one at start-up and hand it (or an `Arc` of it) to whatever
/// renders calendars. All state lives in the injected store.
#[derive(Clone)]
pub struct EventCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    default_ttl: TtlMs,
    key_prefix: String,
}

impl EventCache {
    pub const DEFAULT_KEY_PREFIX: &'static str = "calendar_events_";
    /// Joins a group's primary key and a sub-entry suffix. Group ids must not
    /// contain it.
    pub const SUB_ENTRY_SEPARATOR: char = '\u{1f}';

    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            default_ttl: TtlMs::DEFAULT,
            key_prefix: Self::DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_default_ttl(mut self, ttl: TtlMs) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn default_ttl(&self) -> TtlMs {
        self.default_ttl
    }

    /// Storage key of a group's primary entry
    pub fn entry_key(&self, group: &GroupId) -> String {
        format!("{}{}", self.key_prefix, group)
    }

    /// Storage key of an additional entry filed under the group
    pub fn sub_entry_key(&self, group: &GroupId, suffix: &str) -> String {
        format!(
            "{}{}{}",
            self.entry_key(group),
            Self::SUB_ENTRY_SEPARATOR,
            suffix
        )
    }

    /// The primary key itself, or one of its sub-entries
    fn belongs_to_group(&self, group_key: &str, key: &str) -> bool {
        key == group_key
            || key
                .strip_prefix(group_key)
                .is_some_and(|rest| rest.starts_with(Self::SUB_ENTRY_SEPARATOR))
    }

    async fn load_raw(&self, key: &str) -> Option<Vec<u8>> {
        match self.store.get(key).await {
            Ok(response) => Some(response.value),
            Err(Error::NotFound) => None,
            Err(e) => {
                warn!("Failed to read cache key '{}': {}", key, e);
                None
            }
        }
    }

    async fn discard(&self, key: &str, reason: &str) {
        match self.store.delete(key).await {
            Ok(_) => debug!("Discarded {} cache entry '{}'", reason, key),
            Err(e) => warn!("Failed to discard {} cache entry '{}': {}", reason, key, e),
        }
    }

    fn decode(group: &GroupId, bytes: &[u8]) -> Result<CacheEntry> {
        let mut entry: CacheEntry = serde_json::from_slice(bytes)?;
        entry.group_id = group.clone();
        Ok(entry)
    }

    async fn store_entry(&self, key: String, entry: &CacheEntry) -> Result<()> {
        let bytes = serde_json::to_vec(entry)?;
        self.store.put(key, bytes).await?;
        Ok(())
    }

    /// Delete every expired or unreadable entry; returns how many went away
    pub async fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now_ms();
        let mut purged = 0;

        for key in self.store.keys_with_prefix(&self.key_prefix).await? {
            let Some(bytes) = self.load_raw(&key).await else {
                continue;
            };

            let stale = match serde_json::from_slice::<CacheEntry>(&bytes) {
                Ok(entry) => !entry.is_fresh(now),
                Err(_) => true,
            };

            if stale && self.store.delete(&key).await?.deleted {
                purged += 1;
            }
        }

        debug!("Purged {} stale cache entries", purged);
        Ok(purged)
    }
}

impl std::fmt::Debug for EventCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventCache")
            .field("key_prefix", &self.key_prefix)
            .field("default_ttl", &self.default_ttl)
            .field("store", &"<dyn KeyValueStore>")
            .finish()
    }
}

#[async_trait]
impl CacheOperations for EventCache {
    async fn read(&self, group: &GroupId) -> Option<CacheEntry> {
        let key = self.entry_key(group);
        let bytes = self.load_raw(&key).await?;

        let entry = match Self::decode(group, &bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Cache entry for group '{}' is unreadable: {}", group, e);
                self.discard(&key, "malformed").await;
                return None;
            }
        };

        let now = self.clock.now_ms();
        if !entry.is_fresh(now) {
            debug!(
                "Cache entry for group '{}' expired at {} (now {})",
                group,
                entry.expires_at(),
                now
            );
            self.discard(&key, "expired").await;
            return None;
        }

        debug!(
            "Cache hit for group '{}' with {} event(s)",
            group,
            entry.events.len()
        );
        Some(entry)
    }

    async fn write(
        &self,
        group: &GroupId,
        events: Vec<CachedEvent>,
        ttl: Option<TtlMs>,
    ) -> Result<()> {
        let entry = CacheEntry::new(
            group.clone(),
            events,
            self.clock.now_ms(),
            ttl.unwrap_or(self.default_ttl),
        );

        self.store_entry(self.entry_key(group), &entry).await?;
        debug!(
            "Cached {} event(s) for group '{}' (ttl {} ms)",
            entry.events.len(),
            group,
            entry.ttl_millis
        );
        Ok(())
    }

    async fn clear_group(&self, group: &GroupId) -> Result<()> {
        let group_key = self.entry_key(group);

        for key in self.store.keys_with_prefix(&group_key).await? {
            if self.belongs_to_group(&group_key, &key) {
                self.store.delete(&key).await?;
            }
        }

        debug!("Cleared cache for group '{}'", group);
        Ok(())
    }

    async fn clear_event(&self, group: &GroupId, event_id: &EventId) -> bool {
        let key = self.entry_key(group);
        let Some(bytes) = self.load_raw(&key).await else {
            return false;
        };

        let mut entry = match Self::decode(group, &bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(
                    "Cannot evict event '{}' from unreadable entry of group '{}': {}",
                    event_id, group, e
                );
                return false;
            }
        };

        if !entry.remove_event(event_id) {
            return false;
        }

        match self.store_entry(key, &entry).await {
            Ok(()) => {
                debug!("Evicted event '{}' from group '{}'", event_id, group);
                true
            }
            Err(e) => {
                warn!(
                    "Failed to store group '{}' after evicting '{}': {}",
                    group, event_id, e
                );
                false
            }
        }
    }

    async fn clear_all(&self) -> Result<()> {
        let keys = self.store.keys_with_prefix(&self.key_prefix).await?;
        let count = keys.len();

        for key in keys {
            self.store.delete(&key).await?;
        }

        debug!("Cleared {} cache entries", count);
        Ok(())
    }
}
