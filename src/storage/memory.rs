use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::{BlobInfo, BlobStore};
use crate::error::{PaperError, PaperResult};

#[derive(Debug, Clone)]
struct Entry {
    content: Vec<u8>,
    last_modified: DateTime<Utc>,
}

/// Process-local store for tests and dry runs. Every write gets a
/// timestamp strictly later than the previous one so "latest" queries are
/// deterministic.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, Entry>>,
    clock: Mutex<Option<DateTime<Utc>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a blob with an explicit modification time.
    pub fn insert_at(&self, key: &str, content: Vec<u8>, last_modified: DateTime<Utc>) {
        self.lock().insert(
            key.to_string(),
            Entry {
                content,
                last_modified,
            },
        );
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Entry>> {
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn tick(&self) -> DateTime<Utc> {
        let mut clock = self.clock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Utc::now();
        let next = match *clock {
            Some(last) if now <= last => last + chrono::Duration::milliseconds(1),
            _ => now,
        };
        *clock = Some(next);
        next
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn exists(&self, key: &str) -> PaperResult<bool> {
        Ok(self.lock().contains_key(key))
    }

    async fn put(&self, key: &str, content: Vec<u8>) -> PaperResult<()> {
        let last_modified = self.tick();
        self.insert_at(key, content, last_modified);
        Ok(())
    }

    async fn get(&self, key: &str) -> PaperResult<Vec<u8>> {
        self.lock()
            .get(key)
            .map(|entry| entry.content.clone())
            .ok_or_else(|| PaperError::BlobNotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> PaperResult<()> {
        self.lock()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| PaperError::BlobNotFound(key.to_string()))
    }

    async fn list(&self, prefix: Option<&str>) -> PaperResult<Vec<BlobInfo>> {
        let prefix = prefix.unwrap_or_default();
        Ok(self
            .lock()
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, entry)| BlobInfo {
                name: name.clone(),
                last_modified: entry.last_modified,
                size: entry.content.len() as u64,
            })
            .collect())
    }

    fn signed_url(&self, key: &str, expiry: chrono::Duration) -> PaperResult<String> {
        let expires = (Utc::now() + expiry).format("%Y-%m-%dT%H:%M:%SZ");
        Ok(format!("memory://{key}?se={expires}"))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
