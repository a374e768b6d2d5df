use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use opentelemetry::KeyValue;

use super::{BlobInfo, BlobStore};
use crate::error::{PaperError, PaperResult};
use crate::telemetry::metrics::{
    BLOB_BYTES, BLOB_ERROR_COUNT, BLOB_OPERATION_DURATION, BLOB_OPERATIONS,
};

/// Most recent modification in a container, plus its blob count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub last_modified: DateTime<Utc>,
    pub name: String,
    pub total: usize,
}

/// Report-level storage operations over a single `BlobStore`. Every call is
/// one attempt; failures propagate unchanged.
#[derive(Clone)]
pub struct BlobGateway {
    store: Arc<dyn BlobStore>,
}

impl BlobGateway {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    async fn observed<T, F>(&self, operation: &'static str, fut: F) -> PaperResult<T>
    where
        F: Future<Output = PaperResult<T>>,
    {
        let start = Instant::now();
        let result = fut.await;
        let attrs = [
            KeyValue::new("blob.operation", operation),
            KeyValue::new("blob.store", self.store.name().to_string()),
        ];

        BLOB_OPERATIONS.add(1, &attrs);
        BLOB_OPERATION_DURATION.record(start.elapsed().as_secs_f64(), &attrs);
        if let Err(err) = &result {
            BLOB_ERROR_COUNT.add(
                1,
                &[
                    KeyValue::new("blob.operation", operation),
                    KeyValue::new("error.type", err.kind()),
                ],
            );
        }
        result
    }

    fn count_bytes(&self, direction: &'static str, len: usize) {
        BLOB_BYTES.add(
            len as u64,
            &[
                KeyValue::new("blob.direction", direction),
                KeyValue::new("blob.store", self.store.name().to_string()),
            ],
        );
    }

    #[tracing::instrument(name = "blob exists", skip(self))]
    pub async fn exists(&self, key: &str) -> PaperResult<bool> {
        self.observed("exists", self.store.exists(key)).await
    }

    /// Fails with `BlobExists` when `key` is taken and `overwrite` is off.
    #[tracing::instrument(name = "blob upload", skip(self, content), fields(blob.size = content.len()))]
    pub async fn upload(&self, key: &str, content: Vec<u8>, overwrite: bool) -> PaperResult<()> {
        if self.exists(key).await? {
            if !overwrite {
                return Err(PaperError::BlobExists(key.to_string()));
            }
            tracing::info!(key, "overwriting existing blob");
        }
        let len = content.len();
        self.observed("upload", self.store.put(key, content)).await?;
        self.count_bytes("upload", len);
        Ok(())
    }

    /// Returns the blob's bytes, also writing them to `local_path` if given.
    #[tracing::instrument(name = "blob download", skip(self))]
    pub async fn download(&self, key: &str, local_path: Option<&Path>) -> PaperResult<Vec<u8>> {
        let content = self.observed("download", self.store.get(key)).await?;
        self.count_bytes("download", content.len());
        if let Some(path) = local_path {
            std::fs::write(path, &content)?;
        }
        Ok(content)
    }

    #[tracing::instrument(name = "blob delete", skip(self))]
    pub async fn delete(&self, key: &str) -> PaperResult<()> {
        self.observed("delete", self.store.delete(key)).await
    }

    #[tracing::instrument(name = "blob list", skip(self))]
    pub async fn list(&self, prefix: Option<&str>) -> PaperResult<Vec<BlobInfo>> {
        self.observed("list", self.store.list(prefix)).await
    }

    /// Deletes every blob matching any of `prefixes`, or every blob when
    /// `prefixes` is empty. Returns how many were deleted.
    #[tracing::instrument(name = "blob delete_all", skip(self))]
    pub async fn delete_all(&self, prefixes: &[&str]) -> PaperResult<usize> {
        let mut total = 0;
        for blob in self.list(None).await? {
            if !matches_any_prefix(&blob.name, prefixes) {
                continue;
            }
            self.delete(&blob.name).await?;
            total += 1;
        }
        tracing::info!(total, "blobs deleted");
        Ok(total)
    }

    /// Most recently modified blob under `prefix`, with its content.
    #[tracing::instrument(name = "blob latest", skip(self))]
    pub async fn latest(&self, prefix: &str) -> PaperResult<(BlobInfo, Vec<u8>)> {
        let newest = self
            .list(Some(prefix))
            .await?
            .into_iter()
            .fold(None::<BlobInfo>, |best, blob| match best {
                Some(best) if best.last_modified >= blob.last_modified => Some(best),
                _ => Some(blob),
            })
            .ok_or_else(|| PaperError::BlobNotFound(prefix.to_string()))?;
        let content = self.download(&newest.name, None).await?;
        Ok((newest, content))
    }

    /// First blob listed under `prefix`, with its content.
    #[tracing::instrument(name = "blob first", skip(self))]
    pub async fn first(&self, prefix: &str) -> PaperResult<(BlobInfo, Vec<u8>)> {
        let blob = self
            .list(Some(prefix))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PaperError::BlobNotFound(prefix.to_string()))?;
        let content = self.download(&blob.name, None).await?;
        Ok((blob, content))
    }

    pub fn download_link(&self, key: &str, hours: u32) -> PaperResult<String> {
        self.store
            .signed_url(key, chrono::Duration::hours(i64::from(hours)))
    }

    #[tracing::instrument(name = "blob upload_and_link", skip(self, content))]
    pub async fn upload_and_link(
        &self,
        key: &str,
        content: Vec<u8>,
        hours: u32,
        overwrite: bool,
    ) -> PaperResult<String> {
        self.upload(key, content, overwrite).await?;
        self.download_link(key, hours)
    }

    /// Downloads, deletes and re-uploads a blob, refreshing its
    /// modification time. The content is returned so a caller can recover it
    /// if the upload fails after the delete.
    #[tracing::instrument(name = "blob reupload", skip(self))]
    pub async fn reupload(&self, key: &str) -> PaperResult<Vec<u8>> {
        let content = self.download(key, None).await?;
        self.delete(key).await?;
        if let Err(err) = self.upload(key, content.clone(), false).await {
            tracing::error!(key, error = %err, "reupload failed after delete");
            return Err(err);
        }
        Ok(content)
    }

    /// Re-uploads blobs modified after `date` whose name matches any of
    /// `prefixes` (all blobs when empty). Returns how many were touched.
    #[tracing::instrument(name = "blob reupload_modified_after", skip(self))]
    pub async fn reupload_modified_after(
        &self,
        date: DateTime<Utc>,
        prefixes: &[&str],
    ) -> PaperResult<usize> {
        let mut total = 0;
        for blob in self.list(None).await? {
            if blob.last_modified <= date || !matches_any_prefix(&blob.name, prefixes) {
                continue;
            }
            self.reupload(&blob.name).await?;
            total += 1;
        }
        Ok(total)
    }

    /// Downloads every blob under `prefix` to `local_dir/<blob name>`. Names
    /// that would land outside `local_dir` are skipped.
    #[tracing::instrument(name = "blob download_folder", skip(self))]
    pub async fn download_folder(&self, prefix: &str, local_dir: &Path) -> PaperResult<Vec<PathBuf>> {
        let mut written = Vec::new();
        for blob in self.list(Some(prefix)).await? {
            let Some(relative) = contained_path(&blob.name) else {
                tracing::warn!(key = %blob.name, "skipping blob whose name escapes the target directory");
                continue;
            };
            let target = local_dir.join(relative);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            self.download(&blob.name, Some(&target)).await?;
            written.push(target);
        }
        Ok(written)
    }

    /// `None` for an empty container.
    #[tracing::instrument(name = "blob last_modified", skip(self))]
    pub async fn last_modified(&self) -> PaperResult<Option<ContainerSummary>> {
        let blobs = self.list(None).await?;
        let total = blobs.len();
        Ok(blobs
            .into_iter()
            .fold(None::<BlobInfo>, |best, blob| match best {
                Some(best) if best.last_modified >= blob.last_modified => Some(best),
                _ => Some(blob),
            })
            .map(|newest| ContainerSummary {
                last_modified: newest.last_modified,
                name: newest.name,
                total,
            }))
    }
}

/// Relative path for a blob name made only of plain segments.
fn contained_path(name: &str) -> Option<PathBuf> {
    let mut path = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(segment) => path.push(segment),
            _ => return None,
        }
    }
    (!path.as_os_str().is_empty()).then_some(path)
}

/// True when `prefixes` is empty or `name` starts with one of them.
pub fn matches_any_prefix(name: &str, prefixes: &[&str]) -> bool {
    prefixes.is_empty() || prefixes.iter().any(|prefix| name.starts_with(prefix))
}
