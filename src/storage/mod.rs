//! Remote object storage: a `BlobStore` trait with Azure and in-memory
//! implementations, and the `BlobGateway` that layers the report
//! operations on top of one store.

pub mod azure;
pub mod connection;
pub mod gateway;
mod listing;
pub mod memory;

use chrono::{DateTime, Utc};

use crate::error::PaperResult;

pub use azure::AzureBlobStore;
pub use connection::ConnectionString;
pub use gateway::{BlobGateway, ContainerSummary};
pub use memory::MemoryBlobStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    pub name: String,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
}

#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn exists(&self, key: &str) -> PaperResult<bool>;
    /// Unconditional write; replaces an existing blob.
    async fn put(&self, key: &str, content: Vec<u8>) -> PaperResult<()>;
    /// Fails with `BlobNotFound` for a missing key.
    async fn get(&self, key: &str) -> PaperResult<Vec<u8>>;
    async fn delete(&self, key: &str) -> PaperResult<()>;
    /// Every blob whose name starts with `prefix`, in name order.
    async fn list(&self, prefix: Option<&str>) -> PaperResult<Vec<BlobInfo>>;
    /// Read-only URL valid for `expiry` from now.
    fn signed_url(&self, key: &str, expiry: chrono::Duration) -> PaperResult<String>;
    fn name(&self) -> &str;
}
