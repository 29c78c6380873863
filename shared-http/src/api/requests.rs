use event_cache::domain::VersionMarker;
use serde::{Deserialize, Serialize};

/// Request body for the delta endpoint: what the client already holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaRequest {
    pub events: Vec<VersionMarker>,
}

impl DeltaRequest {
    pub fn new(events: &[VersionMarker]) -> Self {
        Self {
            events: events.to_vec(),
        }
    }
}
