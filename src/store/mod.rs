pub mod disk;
pub mod memory;

use crate::core::error::StoreError;
use async_trait::async_trait;
use disk::DiskStore;
use memory::MemoryStore;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Key holding the serialized latest rate snapshot.
pub const RATES_KEY: &str = "latest_rates";

/// Key holding the serialized conversion history.
pub const HISTORY_KEY: &str = "conversion_history";

/// Async string key-value backend.
///
/// Values are opaque blobs; callers own their encoding. Writes to different
/// keys are independent and carry no transactional guarantee.
#[async_trait]
pub trait RateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Opens the persistent store under `data_path`.
///
/// Falls back to an in-memory store when the disk keyspace cannot be opened,
/// so conversions still work for the current session.
pub fn open(data_path: &Path) -> Arc<dyn RateStore> {
    match DiskStore::open(&data_path.join("cache")) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(
                "Could not open rate store at {}: {}. Using in-memory store",
                data_path.display(),
                e
            );
            Arc::new(MemoryStore::new())
        }
    }
}
