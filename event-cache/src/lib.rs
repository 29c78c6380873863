//! Client-side calendar event cache.
//!
//! Each group's events are stored as one entry with a TTL. A fresh entry is
//! reconciled against the server by sending version markers and applying the
//! returned delta; an absent or expired entry triggers a full fetch.

pub mod clock;
pub mod domain;
pub mod planes;
pub mod ports;

#[cfg(test)]
mod test_support;

pub use clock::{ManualClock, SystemClock};
pub use domain::{
    CacheEntry, CacheVersion, CachedEvent, Delta, EventId, FullSnapshot, GroupId, StoreConfig,
    VersionMarker,
};
pub use planes::data::{CacheOperations, EventCache};
pub use planes::sync::Reconciler;
