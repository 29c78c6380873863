use event_cache::domain::{CachedEvent, Delta, EventId, FullSnapshot};
use serde::{Deserialize, Serialize};
use shared::TtlMs;

/// Response body of the delta endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaResponse {
    #[serde(default, alias = "updatedEvents")]
    pub updated_events: Vec<CachedEvent>,
    #[serde(default, alias = "deletedEventIds", alias = "deletedEvents")]
    pub deleted_events: Vec<EventId>,
}

impl From<DeltaResponse> for Delta {
    fn from(response: DeltaResponse) -> Self {
        Delta {
            updated: response.updated_events,
            deleted: response.deleted_events,
        }
    }
}

/// Response body of the full-fetch endpoint: a bare array, or the array
/// wrapped together with a server-declared TTL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FullFetchResponse {
    Events(Vec<CachedEvent>),
    WithTtl {
        events: Vec<CachedEvent>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ttl: Option<u64>,
    },
}

impl From<FullFetchResponse> for FullSnapshot {
    fn from(response: FullFetchResponse) -> Self {
        match response {
            FullFetchResponse::Events(events) => FullSnapshot { events, ttl: None },
            FullFetchResponse::WithTtl { events, ttl } => FullSnapshot {
                events,
                ttl: ttl.map(TtlMs),
            },
        }
    }
}

// Error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
