//! Backends for the session jar

use async_trait::async_trait;
use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Error, Result};

/// One stored value with its absolute expiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    /// The raw value, usually JSON
    pub value: String,

    /// Unix timestamp (seconds) after which the value is gone
    pub expires_at: i64,
}

impl StoredCookie {
    pub fn new(value: String, expires_at: i64) -> Self {
        Self { value, expires_at }
    }

    /// Check if the value has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.expires_at
    }
}

/// Key/value jar that holds the client-side session.
///
/// Writes overwrite the whole value; with several writers the last one wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<StoredCookie>>;
    async fn write(&self, key: &str, cookie: StoredCookie) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local jar
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    cookies: Mutex<HashMap<String, StoredCookie>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredCookie>>> {
        self.cookies
            .lock()
            .map_err(|_| Error::session("session jar lock poisoned"))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn read(&self, key: &str) -> Result<Option<StoredCookie>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn write(&self, key: &str, cookie: StoredCookie) -> Result<()> {
        self.lock()?.insert(key.to_string(), cookie);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Jar persisted as a JSON file, surviving process restarts
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_jar(&self) -> Result<HashMap<String, StoredCookie>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(jar) => Ok(jar),
            Err(e) => {
                warn!("discarding unreadable session jar {}: {}", self.path.display(), e);
                Ok(HashMap::new())
            }
        }
    }

    async fn store_jar(&self, jar: &HashMap<String, StoredCookie>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec_pretty(jar)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn read(&self, key: &str) -> Result<Option<StoredCookie>> {
        Ok(self.load_jar().await?.remove(key))
    }

    async fn write(&self, key: &str, cookie: StoredCookie) -> Result<()> {
        let mut jar = self.load_jar().await?;
        jar.insert(key.to_string(), cookie);
        self.store_jar(&jar).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut jar = self.load_jar().await?;
        if jar.remove(key).is_some() {
            self.store_jar(&jar).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_overwrites() {
        let store = MemorySessionStore::new();
        store.write("k", StoredCookie::new("a".into(), i64::MAX)).await.unwrap();
        store.write("k", StoredCookie::new("b".into(), i64::MAX)).await.unwrap();
        assert_eq!(store.read("k").await.unwrap().unwrap().value, "b");
        store.remove("k").await.unwrap();
        assert!(store.read("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("jar.json");

        FileSessionStore::new(&path)
            .write("k", StoredCookie::new("v".into(), i64::MAX))
            .await
            .unwrap();

        let reopened = FileSessionStore::new(&path);
        assert_eq!(reopened.read("k").await.unwrap().unwrap().value, "v");
    }

    #[tokio::test]
    async fn corrupt_jar_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jar.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = FileSessionStore::new(&path);
        assert!(store.read("k").await.unwrap().is_none());
        store.write("k", StoredCookie::new("v".into(), i64::MAX)).await.unwrap();
        assert_eq!(store.read("k").await.unwrap().unwrap().value, "v");
    }

    #[test]
    fn expiry_is_inclusive() {
        assert!(StoredCookie::new(String::new(), 0).is_expired());
        assert!(!StoredCookie::new(String::new(), i64::MAX).is_expired());
    }
}
