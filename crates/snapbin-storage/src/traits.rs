use async_trait::async_trait;
use std::io;
use std::path::PathBuf;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid filename: {0}")]
    InvalidName(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Storage configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Durable write/read/delete of raw bytes under orchestrator-generated
/// filenames. Implementations must reject names that could escape the
/// storage root and must treat deleting a missing file as success.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn store(&self, filename: &str, data: Vec<u8>) -> StorageResult<()>;

    async fn read(&self, filename: &str) -> StorageResult<Vec<u8>>;

    /// Idempotent: deleting a missing file is not an error.
    async fn delete(&self, filename: &str) -> StorageResult<()>;

    async fn exists(&self, filename: &str) -> StorageResult<bool>;

    /// Root directory backing this store, for capacity monitoring.
    fn root(&self) -> PathBuf;
}
