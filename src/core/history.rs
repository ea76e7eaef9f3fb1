//! Bounded, newest-first log of past conversions.

use crate::core::error::HistoryError;
use crate::store::{HISTORY_KEY, RateStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Maximum number of conversions kept.
pub const HISTORY_CAPACITY: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRecord {
    pub id: String,
    pub from_currency: String,
    pub to_currency: String,
    pub amount: f64,
    pub result: f64,
    pub rate: f64,
    /// Creation time in milliseconds since the epoch.
    pub timestamp: i64,
}

/// A conversion about to be recorded; the ledger assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConversion {
    pub from_currency: String,
    pub to_currency: String,
    pub amount: f64,
    pub result: f64,
    pub rate: f64,
}

impl NewConversion {
    fn into_record(self, timestamp: i64) -> ConversionRecord {
        ConversionRecord {
            id: timestamp.to_string(),
            from_currency: self.from_currency,
            to_currency: self.to_currency,
            amount: self.amount,
            result: self.result,
            rate: self.rate,
            timestamp,
        }
    }
}

/// Newest-first sequence that never holds more than [`HISTORY_CAPACITY`]
/// records. Pushing onto a full history evicts the oldest record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundedHistory {
    records: VecDeque<ConversionRecord>,
}

impl BoundedHistory {
    pub fn new() -> Self {
        Self {
            records: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Builds a history from a newest-first list, keeping the newest entries.
    pub fn from_records(records: Vec<ConversionRecord>) -> Self {
        Self {
            records: records.into_iter().take(HISTORY_CAPACITY).collect(),
        }
    }

    pub fn push_front(&mut self, record: ConversionRecord) {
        if self.records.len() == HISTORY_CAPACITY {
            self.records.pop_back();
        }
        self.records.push_front(record);
    }

    pub fn newest(&self) -> Option<&ConversionRecord> {
        self.records.front()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_vec(self) -> Vec<ConversionRecord> {
        self.records.into()
    }
}

/// Persists conversions under [`HISTORY_KEY`].
pub struct HistoryLedger {
    store: Arc<dyn RateStore>,
}

impl HistoryLedger {
    pub fn new(store: Arc<dyn RateStore>) -> Self {
        Self { store }
    }

    async fn load(&self) -> Result<BoundedHistory, HistoryError> {
        match self.store.get(HISTORY_KEY).await? {
            Some(raw) => {
                let records: Vec<ConversionRecord> = serde_json::from_str(&raw)?;
                Ok(BoundedHistory::from_records(records))
            }
            None => Ok(BoundedHistory::new()),
        }
    }

    /// Records a conversion as the newest entry and persists the whole list.
    ///
    /// The id is the creation time in milliseconds. Two appends within the
    /// same millisecond get consecutive timestamps so ids stay unique and
    /// ordered.
    pub async fn append(
        &self,
        conversion: NewConversion,
    ) -> Result<ConversionRecord, HistoryError> {
        if [conversion.amount, conversion.result, conversion.rate]
            .iter()
            .any(|v| !v.is_finite())
        {
            return Err(HistoryError::InvalidRecord(format!(
                "non-finite value in {} -> {} conversion",
                conversion.from_currency, conversion.to_currency
            )));
        }
        let mut history = self.load().await?;

        let mut timestamp = Utc::now().timestamp_millis();
        if let Some(newest) = history.newest()
            && newest.timestamp >= timestamp
        {
            timestamp = newest.timestamp + 1;
        }
        let record = conversion.into_record(timestamp);
        history.push_front(record.clone());

        let raw = serde_json::to_string(&history.into_vec())?;
        self.store.set(HISTORY_KEY, raw).await?;
        debug!(
            "Recorded conversion {} {} -> {}",
            record.id, record.from_currency, record.to_currency
        );
        Ok(record)
    }

    /// All recorded conversions, newest first. Empty when nothing is stored.
    pub async fn list(&self) -> Result<Vec<ConversionRecord>, HistoryError> {
        Ok(self.load().await?.into_vec())
    }

    pub async fn clear(&self) -> Result<(), HistoryError> {
        self.store.remove(HISTORY_KEY).await?;
        debug!("Cleared conversion history");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::StoreError;
    use crate::store::memory::MemoryStore;

    fn conversion(amount: f64) -> NewConversion {
        NewConversion {
            from_currency: "USD".to_string(),
            to_currency: "BRL".to_string(),
            amount,
            result: amount * 5.0,
            rate: 5.0,
        }
    }

    #[tokio::test]
    async fn test_append_assigns_id_and_timestamp() {
        let ledger = HistoryLedger::new(Arc::new(MemoryStore::new()));
        let before = Utc::now().timestamp_millis();

        let record = ledger.append(conversion(10.0)).await.unwrap();

        assert!(record.timestamp >= before);
        assert_eq!(record.id, record.timestamp.to_string());
        assert_eq!(record.result, 50.0);
        assert_eq!(ledger.list().await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let ledger = HistoryLedger::new(Arc::new(MemoryStore::new()));

        ledger.append(conversion(1.0)).await.unwrap();
        ledger.append(conversion(2.0)).await.unwrap();
        ledger.append(conversion(3.0)).await.unwrap();

        let history = ledger.list().await.unwrap();
        let amounts: Vec<f64> = history.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![3.0, 2.0, 1.0]);
        assert!(history.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
    }

    #[tokio::test]
    async fn test_history_capped_at_twenty() {
        let ledger = HistoryLedger::new(Arc::new(MemoryStore::new()));

        for i in 0..25 {
            ledger.append(conversion(i as f64)).await.unwrap();
        }

        let history = ledger.list().await.unwrap();
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history[0].amount, 24.0);
        assert_eq!(history[19].amount, 5.0);
        for dropped in 0..5 {
            assert!(history.iter().all(|r| r.amount != dropped as f64));
        }
        let mut ids: Vec<&str> = history.iter().map(|r| r.id.as_str()).collect();
        ids.dedup();
        assert_eq!(ids.len(), HISTORY_CAPACITY);
    }

    #[tokio::test]
    async fn test_clear_then_list_is_empty() {
        let ledger = HistoryLedger::new(Arc::new(MemoryStore::new()));
        ledger.append(conversion(1.0)).await.unwrap();

        ledger.clear().await.unwrap();

        assert!(ledger.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_without_history_is_empty() {
        let ledger = HistoryLedger::new(Arc::new(MemoryStore::new()));
        assert!(ledger.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_append_and_clear() {
        let store = Arc::new(MemoryStore::new());
        store.set_unavailable(true);
        let ledger = HistoryLedger::new(store);

        assert!(matches!(
            ledger.append(conversion(1.0)).await,
            Err(HistoryError::Persistence(StoreError::Unavailable(_)))
        ));
        assert!(matches!(
            ledger.clear().await,
            Err(HistoryError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn test_non_finite_conversion_leaves_history_readable() {
        let ledger = HistoryLedger::new(Arc::new(MemoryStore::new()));
        ledger.append(conversion(1.0)).await.unwrap();

        let mut overflowed = conversion(1e308);
        overflowed.result = f64::INFINITY;
        assert!(matches!(
            ledger.append(overflowed).await,
            Err(HistoryError::InvalidRecord(_))
        ));

        ledger.append(conversion(2.0)).await.unwrap();
        let amounts: Vec<f64> = ledger.list().await.unwrap().iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![2.0, 1.0]);
    }

    #[tokio::test]
    async fn test_persisted_format() {
        let store = Arc::new(MemoryStore::new());
        let ledger = HistoryLedger::new(store.clone());
        ledger.append(conversion(2.0)).await.unwrap();

        let raw = store.get(HISTORY_KEY).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let first = &value.as_array().unwrap()[0];
        assert_eq!(first["fromCurrency"], "USD");
        assert_eq!(first["toCurrency"], "BRL");
        assert_eq!(first["amount"], 2.0);
        assert!(first["timestamp"].is_i64());
    }

    #[tokio::test]
    async fn test_oversized_stored_list_is_trimmed_on_append() {
        let store = Arc::new(MemoryStore::new());
        let records: Vec<ConversionRecord> = (0..30)
            .map(|i| conversion(i as f64).into_record(1_000 - i))
            .collect();
        store
            .set(HISTORY_KEY, serde_json::to_string(&records).unwrap())
            .await
            .unwrap();
        let ledger = HistoryLedger::new(store);

        ledger.append(conversion(99.0)).await.unwrap();

        let history = ledger.list().await.unwrap();
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history[0].amount, 99.0);
        assert_eq!(history[1].amount, 0.0);
    }

    #[test]
    fn test_bounded_history_evicts_oldest() {
        let mut history = BoundedHistory::new();
        for i in 0..(HISTORY_CAPACITY as i64 + 3) {
            history.push_front(conversion(i as f64).into_record(i));
            assert!(history.len() <= HISTORY_CAPACITY);
        }
        assert_eq!(history.newest().unwrap().timestamp, 22);
        let records = history.into_vec();
        assert_eq!(records.last().unwrap().timestamp, 3);
    }
}
