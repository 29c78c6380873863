use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use shared::TtlMs;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

pub mod response {
    #[derive(Clone, Debug)]
    pub struct PutResponse {
        pub created: bool,
        pub message: String,
    }

    impl PutResponse {
        pub fn new(created: bool, message: impl Into<String>) -> Self {
            Self {
                created,
                message: message.into(),
            }
        }
    }

    #[derive(Clone, Debug)]
    pub struct GetResponse<V> {
        pub found: bool,
        pub value: V,
    }

    impl<V> GetResponse<V> {
        pub fn new(found: bool, value: V) -> Self {
            Self { found, value }
        }
    }

    #[derive(Clone, Debug)]
    pub struct DeleteResponse {
        pub deleted: bool,
    }

    impl DeleteResponse {
        pub fn new(deleted: bool) -> Self {
            Self { deleted }
        }
    }
}

/// Identifier of a server-side group; the key of the cache
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(String);

impl GroupId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for GroupId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for GroupId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<i32> for GroupId {
    fn from(value: i32) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Event identifier as the server sends it (integer or string).
///
/// Identity is the textual form, so `5` and `"5"` name the same event; the
/// original JSON form is kept for the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventId {
    Int(i64),
    Text(String),
}

impl EventId {
    fn canonical(&self) -> Cow<'_, str> {
        match self {
            EventId::Int(id) => Cow::Owned(id.to_string()),
            EventId::Text(id) => Cow::Borrowed(id.as_str()),
        }
    }
}

impl PartialEq for EventId {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for EventId {}

impl Hash for EventId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl PartialOrd for EventId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical().cmp(&other.canonical())
    }
}

impl From<i64> for EventId {
    fn from(value: i64) -> Self {
        EventId::Int(value)
    }
}

impl From<i32> for EventId {
    fn from(value: i32) -> Self {
        EventId::Int(i64::from(value))
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        EventId::Text(value.to_string())
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        EventId::Text(value)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventId::Int(id) => write!(f, "{}", id),
            EventId::Text(id) => f.write_str(id),
        }
    }
}

/// Server-assigned revision marker, compared for equality only
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheVersion(pub Value);

impl From<i64> for CacheVersion {
    fn from(value: i64) -> Self {
        Self(Value::from(value))
    }
}

impl From<i32> for CacheVersion {
    fn from(value: i32) -> Self {
        Self(Value::from(value))
    }
}

impl From<&str> for CacheVersion {
    fn from(value: &str) -> Self {
        Self(Value::from(value))
    }
}

/// A calendar event as held in the cache.
///
/// The known fields mirror the server's event model but their values are
/// opaque JSON. Each one is three-state: `None` when the key was absent,
/// `Some(Value::Null)` when the server sent an explicit `null`. Anything else
/// the server sends is kept verbatim in `extra`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedEvent {
    #[serde(alias = "event_id", alias = "id")]
    pub event_id: EventId,
    #[serde(
        default,
        alias = "cache_version",
        alias = "cache_number",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub cache_version: Option<CacheVersion>,
    #[serde(
        default,
        alias = "event_name",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<Value>,
    #[serde(
        default,
        alias = "start_time",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub start: Option<Value>,
    #[serde(
        default,
        alias = "end_time",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub creator: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub participants: Option<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// A key that is present maps to `Some`, even when its value is `null`
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl CachedEvent {
    pub fn new(event_id: impl Into<EventId>) -> Self {
        Self {
            event_id: event_id.into(),
            cache_version: None,
            title: None,
            start: None,
            end: None,
            description: None,
            creator: None,
            participants: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<CacheVersion>) -> Self {
        self.cache_version = Some(version.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(Value::String(title.into()));
        self
    }

    /// Title when the server sent it as a string
    pub fn title(&self) -> Option<&str> {
        self.title.as_ref().and_then(Value::as_str)
    }

    /// Shallow merge: every key present on `incoming` overwrites ours,
    /// including explicit `null`s; everything it leaves out survives.
    pub fn merge_from(&mut self, incoming: CachedEvent) {
        overwrite(&mut self.cache_version, incoming.cache_version);
        overwrite(&mut self.title, incoming.title);
        overwrite(&mut self.start, incoming.start);
        overwrite(&mut self.end, incoming.end);
        overwrite(&mut self.description, incoming.description);
        overwrite(&mut self.creator, incoming.creator);
        overwrite(&mut self.participants, incoming.participants);
        self.extra.extend(incoming.extra);
    }

    pub fn version_marker(&self) -> VersionMarker {
        VersionMarker {
            event_id: self.event_id.clone(),
            cache_version: self.cache_version.clone(),
        }
    }
}

fn overwrite<T>(slot: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *slot = incoming;
    }
}

/// What the client tells the delta endpoint about one cached event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMarker {
    pub event_id: EventId,
    pub cache_version: Option<CacheVersion>,
}

/// Server answer to a delta request
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Delta {
    pub updated: Vec<CachedEvent>,
    pub deleted: Vec<EventId>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.deleted.is_empty()
    }
}

/// Server answer to a full fetch
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FullSnapshot {
    pub events: Vec<CachedEvent>,
    pub ttl: Option<TtlMs>,
}

fn default_ttl_ms() -> u64 {
    TtlMs::DEFAULT.0
}

/// One group's cached snapshot.
///
/// Serialized as `{ "data": [...], "timestamp": <ms>, "ttl": <ms> }`. The group
/// id is the storage key and is not part of the stored value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(skip)]
    pub group_id: GroupId,
    #[serde(rename = "data")]
    pub events: Vec<CachedEvent>,
    #[serde(rename = "timestamp")]
    pub stored_at: u64,
    #[serde(rename = "ttl", default = "default_ttl_ms")]
    pub ttl_millis: u64,
}

impl CacheEntry {
    pub fn new(group_id: GroupId, events: Vec<CachedEvent>, stored_at: u64, ttl: TtlMs) -> Self {
        Self {
            group_id,
            events: collapse_duplicates(events),
            stored_at,
            ttl_millis: ttl.0,
        }
    }

    pub fn ttl(&self) -> TtlMs {
        TtlMs(self.ttl_millis)
    }

    pub fn expires_at(&self) -> u64 {
        self.stored_at.saturating_add(self.ttl_millis)
    }

    /// Fresh through the last millisecond of its TTL, inclusive
    pub fn is_fresh(&self, now_ms: u64) -> bool {
        now_ms <= self.expires_at()
    }

    pub fn event(&self, event_id: &EventId) -> Option<&CachedEvent> {
        self.events.iter().find(|e| &e.event_id == event_id)
    }

    pub fn version_markers(&self) -> Vec<VersionMarker> {
        self.events.iter().map(CachedEvent::version_marker).collect()
    }

    /// Drop one event, leaving `stored_at` and `ttl_millis` untouched
    pub fn remove_event(&mut self, event_id: &EventId) -> bool {
        let before = self.events.len();
        self.events.retain(|e| &e.event_id != event_id);
        self.events.len() != before
    }
}

/// Collapse repeated ids onto their first occurrence, merging later copies in order
pub fn collapse_duplicates(events: Vec<CachedEvent>) -> Vec<CachedEvent> {
    let mut position: HashMap<EventId, usize> = HashMap::with_capacity(events.len());
    let mut unique: Vec<CachedEvent> = Vec::with_capacity(events.len());

    for event in events {
        match position.get(&event.event_id) {
            Some(&idx) => unique[idx].merge_from(event),
            None => {
                position.insert(event.event_id.clone(), unique.len());
                unique.push(event);
            }
        }
    }

    unique
}

/// Where the key-value store lives
#[derive(Clone, Debug)]
pub enum StoreConfig {
    Memory {
        name: String,
        max_entries: Option<u64>,
    },
    Sled {
        path: PathBuf,
    },
}
