//! Byte storage for uploaded file content.
//!
//! Records only carry an opaque `stored_path`; the bytes behind it live in a
//! [`BlobStorage`] implementation. [`FsBlobStore`] keeps them as flat files
//! under one base directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, StoreError};

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Write `data` under `name`. Returns the stored path and byte count.
    async fn store(&self, data: &[u8], name: &str) -> Result<(String, i64)>;

    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    async fn delete(&self, path: &str) -> Result<()>;
}

/// Resolve `target` against `base`, refusing anything that leaves it.
fn ensure_within(base: &Path, target: &Path) -> Result<PathBuf> {
    let relative = target.strip_prefix(base).unwrap_or(target);
    let mut resolved = base.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(c) => resolved.push(c),
            Component::CurDir => {}
            // ParentDir, RootDir, Prefix
            _ => {
                return Err(StoreError::BadRequest(
                    "Path traversal detected".to_string(),
                ));
            }
        }
    }
    if resolved == base {
        return Err(StoreError::BadRequest("Empty blob path".to_string()));
    }
    Ok(resolved)
}

#[derive(Debug, Clone)]
pub struct FsBlobStore {
    base_path: PathBuf,
    max_size: usize,
}

impl FsBlobStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            StoreError::BlobStorage(format!(
                "Failed to create blob directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;
        // stored paths are absolute so they stay valid if the cwd changes
        let base_path = fs::canonicalize(&base_path).await.map_err(|e| {
            StoreError::BlobStorage(format!(
                "Failed to resolve blob directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Blob store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn safe_name_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(StoreError::BadRequest(format!("Invalid blob name: {name}")));
        }
        ensure_within(&self.base_path, Path::new(name))
    }
}

#[async_trait]
impl BlobStorage for FsBlobStore {
    async fn store(&self, data: &[u8], name: &str) -> Result<(String, i64)> {
        if data.is_empty() {
            return Err(StoreError::BlobStorage("Empty blob".to_string()));
        }
        if data.len() > self.max_size {
            return Err(StoreError::BlobTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let path = self.safe_name_path(name)?;
        fs::write(&path, data).await.map_err(|e| {
            StoreError::BlobStorage(format!("Failed to write blob {}: {}", name, e))
        })?;

        debug!(name, size = data.len(), "Stored blob");
        Ok((path.to_string_lossy().into_owned(), data.len() as i64))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let resolved = ensure_within(&self.base_path, Path::new(path))?;
        if !resolved.exists() {
            return Err(StoreError::BlobNotFound(path.to_string()));
        }

        let data = fs::read(&resolved).await.map_err(|e| {
            StoreError::BlobStorage(format!("Failed to read blob {}: {}", path, e))
        })?;

        debug!(path, size = data.len(), "Retrieved blob");
        Ok(data)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let resolved = ensure_within(&self.base_path, Path::new(path))?;
        if !resolved.exists() {
            return Err(StoreError::BlobNotFound(path.to_string()));
        }

        fs::remove_file(&resolved).await.map_err(|e| {
            StoreError::BlobStorage(format!("Failed to delete blob {}: {}", path, e))
        })?;

        debug!(path, "Deleted blob");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (FsBlobStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path().join("uploads"), 1024)
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_store_and_read() {
        let (store, _dir) = test_store().await;

        let (path, size) = store.store(b"hello", "f1").await.unwrap();
        assert_eq!(size, 5);
        assert!(Path::new(&path).starts_with(store.base_path()));
        assert_eq!(store.read(&path).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, _dir) = test_store().await;
        let (path, _) = store.store(b"delete-me", "f2").await.unwrap();

        store.delete(&path).await.unwrap();
        assert!(matches!(
            store.read(&path).await,
            Err(StoreError::BlobNotFound(_))
        ));
        assert!(store.delete(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_blob_rejected() {
        let (store, _dir) = test_store().await;
        assert!(store.store(b"", "empty").await.is_err());
    }

    #[tokio::test]
    async fn test_too_large_rejected() {
        let (store, _dir) = test_store().await;
        let data = vec![0u8; 2048];
        assert!(matches!(
            store.store(&data, "big").await,
            Err(StoreError::BlobTooLarge { size: 2048, max: 1024 })
        ));
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (store, _dir) = test_store().await;
        assert!(store.store(b"x", "../escape").await.is_err());
        assert!(store.read("/etc/passwd").await.is_err());
        assert!(store.delete("../../outside").await.is_err());
    }
}
