use crate::core::error::StoreError;
use crate::store::RateStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory store implementation using HashMap and Mutex
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// Creates a new empty MemoryStore
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent operation fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check_available()?;
        let store = self.inner.lock().await;
        let value = store.get(key).cloned();
        if value.is_some() {
            debug!("Store HIT for key: {}", key);
        } else {
            debug!("Store MISS for key: {}", key);
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.check_available()?;
        let mut store = self.inner.lock().await;
        debug!("Store PUT for key: {}", key);
        store.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let mut store = self.inner.lock().await;
        store.remove(key);
        debug!("Store REMOVE for key: {}", key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_get_set() {
        let store = MemoryStore::new();

        // Initially, store is empty
        assert!(store.get("key1").await.unwrap().is_none());

        store.set("key1", "value".to_string()).await.unwrap();
        assert_eq!(store.get("key1").await.unwrap().as_deref(), Some("value"));

        // Get a non-existent key
        assert!(store.get("key2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_set_overwrites() {
        let store = MemoryStore::new();

        store.set("key1", "first".to_string()).await.unwrap();
        store.set("key1", "second".to_string()).await.unwrap();

        assert_eq!(store.get("key1").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_store_remove() {
        let store = MemoryStore::new();

        store.set("key1", "value".to_string()).await.unwrap();
        store.remove("key1").await.unwrap();
        assert!(store.get("key1").await.unwrap().is_none());

        // Removing a missing key is not an error
        store.remove("key1").await.unwrap();
    }

    #[tokio::test]
    async fn test_store_unavailable() {
        let store = MemoryStore::new();
        store.set("key1", "value".to_string()).await.unwrap();

        store.set_unavailable(true);
        assert!(matches!(
            store.get("key1").await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.set("key1", "x".to_string()).await.is_err());
        assert!(store.remove("key1").await.is_err());

        store.set_unavailable(false);
        assert_eq!(store.get("key1").await.unwrap().as_deref(), Some("value"));
    }
}
