use crate::domain::{CachedEvent, GroupId};
use crate::planes::data::CacheOperations;
use crate::planes::sync::merge::apply_delta;
use crate::ports::EventSource;
use shared::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Loads a group's events, using the cache where it can and the server where
/// it must.
///
/// Two loads for the same group racing each other both write their result;
/// the later write wins. A load whose caller has gone away still writes.
#[derive(Clone)]
pub struct Reconciler {
    cache: Arc<dyn CacheOperations>,
    source: Arc<dyn EventSource>,
}

impl Reconciler {
    pub fn new(cache: Arc<dyn CacheOperations>, source: Arc<dyn EventSource>) -> Self {
        Self { cache, source }
    }

    /// Current view of a group's events.
    ///
    /// Cold or expired cache: full fetch, seeded with the server-declared TTL.
    /// Fresh cache: delta exchange, merged and written back under the entry's
    /// own TTL. Any server failure is returned and leaves the cache as it was.
    pub async fn load(&self, group: &GroupId) -> Result<Vec<CachedEvent>> {
        let Some(entry) = self.cache.read(group).await else {
            return self.load_full(group).await;
        };

        let known = entry.version_markers();
        let ttl = entry.ttl();

        let delta = self.source.fetch_delta(group, &known).await.map_err(|e| {
            warn!("Delta request for group '{}' failed: {}", group, e);
            e
        })?;

        debug!(
            "Delta for group '{}': {} updated, {} deleted",
            group,
            delta.updated.len(),
            delta.deleted.len()
        );

        let merged = apply_delta(entry.events, delta);
        self.commit(group, &merged, Some(ttl)).await;
        Ok(merged)
    }

    /// Drop whatever is cached for the group and fetch it from scratch
    pub async fn refresh(&self, group: &GroupId) -> Result<Vec<CachedEvent>> {
        self.cache.clear_group(group).await?;
        self.load_full(group).await
    }

    async fn load_full(&self, group: &GroupId) -> Result<Vec<CachedEvent>> {
        let snapshot = self.source.fetch_all(group).await.map_err(|e| {
            warn!("Full fetch for group '{}' failed: {}", group, e);
            e
        })?;

        info!(
            "Fetched {} event(s) for group '{}'",
            snapshot.events.len(),
            group
        );

        self.commit(group, &snapshot.events, snapshot.ttl).await;
        Ok(snapshot.events)
    }

    // Write failures are logged only; the caller still gets the fetched events.
    async fn commit(&self, group: &GroupId, events: &[CachedEvent], ttl: Option<shared::TtlMs>) {
        if let Err(e) = self.cache.write(group, events.to_vec(), ttl).await {
            warn!("Could not cache events for group '{}': {}", group, e);
        }
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}
