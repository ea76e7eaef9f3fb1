use crate::core::error::StoreError;
use crate::store::RateStore;
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION_NAME: &str = "rates";

fn unavailable(e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

/// Persistent store backed by a fjall partition.
pub struct DiskStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path).map_err(unavailable)?;

        let keyspace = Config::new(path).open().map_err(unavailable)?;
        let partition = keyspace
            .open_partition(PARTITION_NAME, PartitionCreateOptions::default())
            .map_err(unavailable)?;
        debug!("Opened rate store at {}", path.display());
        Ok(Self {
            keyspace,
            partition,
        })
    }

    fn persist(&self) -> Result<(), StoreError> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .map_err(unavailable)
    }
}

#[async_trait]
impl RateStore for DiskStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.partition.get(key).map_err(unavailable)? {
            Some(value) => {
                debug!("Store HIT for key: {}", key);
                let value = String::from_utf8(value.to_vec()).map_err(unavailable)?;
                Ok(Some(value))
            }
            None => {
                debug!("Store MISS for key: {}", key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.partition
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(unavailable)?;
        self.persist()?;
        debug!("Store PUT for key: {}", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.partition.remove(key.as_bytes()).map_err(unavailable)?;
        self.persist()?;
        debug!("Store REMOVE for key: {}", key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_disk_store_get_set() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();

        // Initially, store is empty
        assert!(store.get("key1").await.unwrap().is_none());

        store.set("key1", r#"{"a":1}"#.to_string()).await.unwrap();
        assert_eq!(
            store.get("key1").await.unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );

        // Get a non-existent key
        assert!(store.get("key2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disk_store_overwrite() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();

        store.set("key1", "first".to_string()).await.unwrap();
        store.set("key1", "second".to_string()).await.unwrap();
        assert_eq!(store.get("key1").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_disk_store_remove() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();

        store.set("key1", "value".to_string()).await.unwrap();
        store.remove("key1").await.unwrap();
        assert!(store.get("key1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disk_store_keeps_keys_independent() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();

        store.set("latest_rates", "rates".to_string()).await.unwrap();
        store
            .set("conversion_history", "[]".to_string())
            .await
            .unwrap();
        store.remove("conversion_history").await.unwrap();

        assert_eq!(
            store.get("latest_rates").await.unwrap().as_deref(),
            Some("rates")
        );
    }
}
