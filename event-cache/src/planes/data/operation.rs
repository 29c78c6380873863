use crate::domain::{CacheEntry, CachedEvent, EventId, GroupId};
use async_trait::async_trait;
use shared::{Result, TtlMs};

/// Per-group cache operations used by the reconciliation logic
#[async_trait]
pub trait CacheOperations: Send + Sync + 'static {
    /// Fresh entry for the group, or `None` (missing, expired and malformed
    /// entries all read as absent)
    async fn read(&self, group: &GroupId) -> Option<CacheEntry>;

    /// Replace the group's snapshot and restart its freshness clock
    async fn write(
        &self,
        group: &GroupId,
        events: Vec<CachedEvent>,
        ttl: Option<TtlMs>,
    ) -> Result<()>;

    async fn clear_group(&self, group: &GroupId) -> Result<()>;

    /// Remove one event; `false` when nothing was removed
    async fn clear_event(&self, group: &GroupId, event_id: &EventId) -> bool;

    async fn clear_all(&self) -> Result<()>;
}
