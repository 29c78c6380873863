use crate::domain::response::{DeleteResponse, GetResponse, PutResponse};
use crate::domain::{Delta, FullSnapshot, GroupId, VersionMarker};
use crate::ports::{EventSource, KeyValueStore};
use async_trait::async_trait;
use shared::{Error, Result};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// BTreeMap-backed store with a switch to make every call fail
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
    broken: AtomicBool,
}

impl MemoryStore {
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &[u8]) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }

    pub fn break_store(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            Err(Error::Storage("disk on fire".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn put(&self, key: String, value: Vec<u8>) -> Result<PutResponse> {
        self.check()?;
        let created = self.entries.lock().unwrap().insert(key, value).is_none();
        Ok(PutResponse::new(created, "stored"))
    }

    async fn get(&self, key: &str) -> Result<GetResponse<Vec<u8>>> {
        self.check()?;
        self.raw(key)
            .map(|value| GetResponse::new(true, value))
            .ok_or(Error::NotFound)
    }

    async fn delete(&self, key: &str) -> Result<DeleteResponse> {
        self.check()?;
        let deleted = self.entries.lock().unwrap().remove(key).is_some();
        Ok(DeleteResponse::new(deleted))
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.check()?;
        Ok(self
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }
}

/// Event source that replays queued answers and records what it was asked
#[derive(Default)]
pub struct ScriptedSource {
    full: Mutex<VecDeque<Result<FullSnapshot>>>,
    deltas: Mutex<VecDeque<Result<Delta>>>,
    pub delta_requests: Mutex<Vec<(GroupId, Vec<VersionMarker>)>>,
    pub full_requests: Mutex<Vec<GroupId>>,
}

impl ScriptedSource {
    pub fn push_full(&self, answer: Result<FullSnapshot>) {
        self.full.lock().unwrap().push_back(answer);
    }

    pub fn push_delta(&self, answer: Result<Delta>) {
        self.deltas.lock().unwrap().push_back(answer);
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn fetch_all(&self, group: &GroupId) -> Result<FullSnapshot> {
        self.full_requests.lock().unwrap().push(group.clone());
        self.full
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Internal("no scripted full fetch".to_string())))
    }

    async fn fetch_delta(&self, group: &GroupId, known: &[VersionMarker]) -> Result<Delta> {
        self.delta_requests
            .lock()
            .unwrap()
            .push((group.clone(), known.to_vec()));
        self.deltas
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Internal("no scripted delta".to_string())))
    }
}
