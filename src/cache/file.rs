//! File-backed cache
//!
//! Values are stored one per file using the layout
//! `BASE/ab/abcdef...` where `abcdef...` is the hex SHA-256 of the key and
//! `ab` its first two characters.

use crate::cache::{Cache, CacheError, CacheResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Directory-based cache keyed by the hash of a string key
#[derive(Debug, Clone)]
pub struct FileCache {
    folder: PathBuf,
}

impl FileCache {
    /// Creates a cache rooted at `folder`
    ///
    /// The folder is created lazily on the first write.
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    /// Returns the root folder of the cache
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Returns the file path used to store `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        self.folder.join(&digest[..2]).join(digest)
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for FileCache
where
    K: AsRef<str> + Sync,
    V: Serialize + DeserializeOwned + Send + Sync,
{
    async fn get(&self, key: &K) -> CacheResult<V> {
        let path = self.path_for(key.as_ref());
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(CacheError::NotFound),
            Err(source) => return Err(CacheError::Read { path, source }),
        };

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn set(&self, key: &K, value: &V) -> CacheResult<()> {
        let path = self.path_for(key.as_ref());
        let bytes = serde_json::to_vec(value)?;

        if let Some(directory) = path.parent() {
            tokio::fs::create_dir_all(directory)
                .await
                .map_err(|source| CacheError::Write {
                    path: directory.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| CacheError::Write { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_cache_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path());
        let value = vec![1, 2, 3];

        cache.set(&"key", &value).await.unwrap();
        let loaded: Vec<i32> = cache.get(&"key").await.unwrap();
        assert_eq!(loaded, value);

        let missing: CacheResult<Vec<i32>> = cache.get(&"fake_key").await;
        assert!(matches!(missing, Err(CacheError::NotFound)));
    }

    #[test]
    fn test_path_layout() {
        let cache = FileCache::new("/cache");
        let path = cache.path_for("key");

        let file_name = path.file_name().unwrap().to_str().unwrap();
        let bucket = path.parent().unwrap().file_name().unwrap().to_str().unwrap();

        assert_eq!(file_name.len(), 64);
        assert_eq!(bucket, &file_name[..2]);
        assert!(path.starts_with("/cache"));
        assert_eq!(cache.path_for("key"), path);
        assert_ne!(cache.path_for("other"), path);
    }

    #[tokio::test]
    async fn test_file_cache_unwritable_folder() {
        let dir = TempDir::new().unwrap();
        // A regular file where the cache expects a directory
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let cache = FileCache::new(&blocker);
        let result = cache.set(&"key", &vec![1, 2, 3]).await;
        assert!(matches!(result, Err(CacheError::Write { .. })));
    }

    #[tokio::test]
    async fn test_file_cache_corrupt_entry() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path());
        let path = cache.path_for("key");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{not json").unwrap();

        let result: CacheResult<Vec<i32>> = cache.get(&"key").await;
        assert!(matches!(result, Err(CacheError::Serialization(_))));
    }
}
