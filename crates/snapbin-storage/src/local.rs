use crate::traits::{AssetStore, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage. All files live flat under `base_path`.
#[derive(Clone)]
pub struct LocalAssetStore {
    base_path: PathBuf,
}

impl LocalAssetStore {
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalAssetStore { base_path })
    }

    /// Resolve a filename to its on-disk path. Filenames are generated by the
    /// pipeline, but user input can still reach `read`/`delete` via URLs, so
    /// path separators, traversal sequences, and dotfiles are all rejected.
    fn path_for(&self, filename: &str) -> StorageResult<PathBuf> {
        if filename.is_empty()
            || filename.contains("..")
            || filename.contains('/')
            || filename.contains('\\')
            || filename.starts_with('.')
        {
            return Err(StorageError::InvalidName(filename.to_string()));
        }
        Ok(self.base_path.join(filename))
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn store(&self, filename: &str, data: Vec<u8>) -> StorageResult<()> {
        let path = self.path_for(filename)?;
        let size = data.len();
        let start = std::time::Instant::now();

        // Write to a temp name and rename into place, so overwriting an
        // existing file never truncates it: a failure mid-write leaves the
        // previous bytes untouched. The dot prefix keeps the temp name
        // unreachable through `path_for`.
        let tmp_path = self.base_path.join(format!(".{filename}.tmp"));

        let written = async {
            let mut file = fs::File::create(&tmp_path).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to create file {}: {}",
                    tmp_path.display(),
                    e
                ))
            })?;

            file.write_all(&data).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to write file {}: {}",
                    tmp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to sync file {}: {}",
                    tmp_path.display(),
                    e
                ))
            })?;

            fs::rename(&tmp_path, &path).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to move file into place {}: {}",
                    path.display(),
                    e
                ))
            })
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e);
        }

        tracing::debug!(
            filename = %filename,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stored asset bytes"
        );

        Ok(())
    }

    async fn read(&self, filename: &str) -> StorageResult<Vec<u8>> {
        let path = self.path_for(filename)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(filename.to_string()));
        }

        fs::read(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })
    }

    async fn delete(&self, filename: &str) -> StorageResult<()> {
        let path = self.path_for(filename)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::debug!(filename = %filename, "Deleted asset bytes");
        Ok(())
    }

    async fn exists(&self, filename: &str) -> StorageResult<bool> {
        let path = self.path_for(filename)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn root(&self) -> PathBuf {
        self.base_path.clone()
    }
}

impl std::fmt::Debug for LocalAssetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAssetStore")
            .field("base_path", &self.base_path)
            .finish()
    }
}

#[allow(dead_code)]
fn _assert_store_is_object_safe(_: &dyn AssetStore) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn store_then_read_round_trip() {
        let dir = tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path()).await.unwrap();

        let data = b"test data".to_vec();
        store.store("abc123.jpg", data.clone()).await.unwrap();

        assert!(store.exists("abc123.jpg").await.unwrap());
        assert_eq!(store.read("abc123.jpg").await.unwrap(), data);
    }

    #[tokio::test]
    async fn path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path()).await.unwrap();

        for name in ["../../../etc/passwd", "a/b.jpg", "..\\evil", ".hidden", ""] {
            let result = store.read(name).await;
            assert!(
                matches!(result, Err(StorageError::InvalidName(_))),
                "expected InvalidName for {name:?}"
            );
        }
    }

    #[tokio::test]
    async fn delete_missing_file_is_not_an_error() {
        let dir = tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path()).await.unwrap();

        assert!(store.delete("nonexistent.jpg").await.is_ok());
    }

    #[tokio::test]
    async fn delete_removes_the_file() {
        let dir = tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path()).await.unwrap();

        store.store("gone.png", b"x".to_vec()).await.unwrap();
        store.delete("gone.png").await.unwrap();
        assert!(!store.exists("gone.png").await.unwrap());
    }

    #[tokio::test]
    async fn overwrite_replaces_content_and_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path()).await.unwrap();

        store
            .store("photo.png", b"original bytes".to_vec())
            .await
            .unwrap();
        store.store("photo.png", b"resized".to_vec()).await.unwrap();

        assert_eq!(store.read("photo.png").await.unwrap(), b"resized");

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["photo.png".to_string()]);
    }

    #[tokio::test]
    async fn failed_store_keeps_the_tree_clean() {
        let dir = tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path()).await.unwrap();

        // A directory occupying the target name makes the final rename fail.
        std::fs::create_dir(dir.path().join("blocked.png")).unwrap();

        let result = store.store("blocked.png", b"data".to_vec()).await;
        assert!(matches!(result, Err(StorageError::WriteFailed(_))));

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["blocked.png".to_string()]);
    }

    #[tokio::test]
    async fn read_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path()).await.unwrap();

        assert!(matches!(
            store.read("missing.jpg").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
