//! 本地键值存储 - 基础设施层
//!
//! 只用来缓存登录令牌和用户资料，不是离线存储引擎

use crate::error::{AppError, AppResult, StorageError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::fs;
use tracing::debug;

/// 登录令牌的键
pub const TOKEN_KEY: &str = "token";
/// 用户资料（JSON 字符串）的键
pub const USER_DATA_KEY: &str = "userData";

/// 键值存储
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;
    async fn remove(&self, key: &str) -> AppResult<()>;
}

/// 基于单个 JSON 文件的存储
///
/// 每次写入都整体重写文件；内容只有几个键，不需要更复杂的格式
pub struct FileKvStore {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl FileKvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn load(&self) -> AppResult<BTreeMap<String, String>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(AppError::storage_read_failed(self.display_path(), e)),
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            AppError::Storage(StorageError::Corrupted {
                path: self.display_path(),
                source: Box::new(e),
            })
        })
    }

    async fn save(&self, map: &BTreeMap<String, String>) -> AppResult<()> {
        let content = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, content)
            .await
            .map_err(|e| AppError::storage_write_failed(self.display_path(), e))
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        map.insert(key.to_string(), value.to_string());
        self.save(&map).await?;
        debug!("存储写入: {}", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        if map.remove(key).is_some() {
            self.save(&map).await?;
            debug!("存储删除: {}", key);
        }
        Ok(())
    }
}

/// 内存存储
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一个令牌
    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(TOKEN_KEY.to_string(), token.to_string());
        }
        store
    }

    fn entries(&self) -> AppResult<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| AppError::Other(format!("存储锁已损坏: {}", e)))
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileKvStore::new(&path);
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
        store.set(TOKEN_KEY, "abc").await.unwrap();
        store.set(USER_DATA_KEY, "{\"id\":\"1\"}").await.unwrap();

        let reopened = FileKvStore::new(&path);
        assert_eq!(reopened.get(TOKEN_KEY).await.unwrap().as_deref(), Some("abc"));

        reopened.remove(TOKEN_KEY).await.unwrap();
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
        assert!(store.get(USER_DATA_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_file_store_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileKvStore::new(&path);
        let err = store.get(TOKEN_KEY).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(StorageError::Corrupted { .. })));
    }

    #[tokio::test]
    async fn test_memory_store_with_token() {
        let store = MemoryKvStore::with_token("t");
        assert_eq!(store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("t"));
        store.remove(TOKEN_KEY).await.unwrap();
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
    }
}
