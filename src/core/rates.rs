//! Rate snapshots and the cache-or-fetch policy that produces them.

use crate::core::error::{RatesError, StoreError};
use crate::store::{RATES_KEY, RateStore};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A table of multipliers relative to `base_code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    #[serde(default)]
    pub base_code: String,
    #[serde(rename = "conversion_rates", default)]
    pub rates: HashMap<String, f64>,
    #[serde(rename = "time_last_update_unix", default)]
    pub fetched_at_unix: i64,
}

impl RateSnapshot {
    pub fn new(base_code: &str, rates: HashMap<String, f64>, fetched_at_unix: i64) -> Self {
        Self {
            base_code: base_code.to_string(),
            rates,
            fetched_at_unix,
        }
    }

    /// A snapshot without rates, or with any rate that is not a finite
    /// positive multiplier, is treated as no snapshot at all.
    pub fn is_usable(&self) -> bool {
        !self.rates.is_empty() && self.invalid_rate().is_none()
    }

    fn invalid_rate(&self) -> Option<(&str, f64)> {
        self.rates
            .iter()
            .find(|(_, rate)| !rate.is_finite() || **rate <= 0.0)
            .map(|(code, rate)| (code.as_str(), *rate))
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.fetched_at_unix, 0).single()
    }

    /// Currency codes of the table, sorted.
    pub fn supported_currencies(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.rates.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// Replaces codes the table does not know with sensible defaults.
    ///
    /// An unknown `from` becomes USD when present, else the first code. An
    /// unknown `to` becomes BRL when present, else the second code (or the
    /// first when there is only one). Returns `None` for an empty table.
    pub fn resolve_pair(&self, from: &str, to: &str) -> Option<(String, String)> {
        let codes = self.supported_currencies();
        let first = codes.first()?;

        let from = if self.rates.contains_key(from) {
            from.to_string()
        } else if self.rates.contains_key("USD") {
            "USD".to_string()
        } else {
            first.clone()
        };

        let to = if self.rates.contains_key(to) {
            to.to_string()
        } else if self.rates.contains_key("BRL") {
            "BRL".to_string()
        } else {
            codes.get(1).unwrap_or(first).clone()
        };

        Some((from, to))
    }
}

/// True when the snapshot is older than `threshold` at `now`.
pub fn is_stale(snapshot: &RateSnapshot, threshold: Duration, now: DateTime<Utc>) -> bool {
    let age_secs = now.timestamp().saturating_sub(snapshot.fetched_at_unix);
    age_secs > i64::try_from(threshold.as_secs()).unwrap_or(i64::MAX)
}

/// Remote source of rate tables.
#[async_trait]
pub trait RateFetcher: Send + Sync {
    async fn fetch_rates(&self, base: &str) -> anyhow::Result<RateSnapshot>;
}

/// Where the snapshot returned by [`RateProvider::obtain_rates`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Cache,
    Network,
    NetworkAfterFallback,
}

impl Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RateSource::Cache => "cache",
                RateSource::Network => "network",
                RateSource::NetworkAfterFallback => "network-after-fallback",
            }
        )
    }
}

#[derive(Debug)]
pub struct ObtainedRates {
    pub snapshot: RateSnapshot,
    pub source: RateSource,
    /// The fetch failure that forced a fallback to the cached snapshot.
    pub fallback_reason: Option<RatesError>,
}

/// Reads the cached snapshot. A corrupt or rate-less record counts as absent.
pub async fn load_snapshot(store: &dyn RateStore) -> Result<Option<RateSnapshot>, StoreError> {
    let Some(raw) = store.get(RATES_KEY).await? else {
        return Ok(None);
    };
    match serde_json::from_str::<RateSnapshot>(&raw) {
        Ok(snapshot) if snapshot.is_usable() => Ok(Some(snapshot)),
        Ok(_) => {
            debug!("Cached rate snapshot has no usable rates");
            Ok(None)
        }
        Err(e) => {
            warn!("Ignoring corrupt cached rate snapshot: {}", e);
            Ok(None)
        }
    }
}

/// Overwrites the cached snapshot.
pub async fn save_snapshot(
    store: &dyn RateStore,
    snapshot: &RateSnapshot,
) -> Result<(), RatesError> {
    let raw = serde_json::to_string(snapshot)?;
    store.set(RATES_KEY, raw).await?;
    Ok(())
}

/// Decides between the cached snapshot and a fresh fetch.
///
/// Holds no state between calls; every call starts from what is persisted.
pub struct RateProvider {
    store: Arc<dyn RateStore>,
    fetcher: Arc<dyn RateFetcher>,
}

impl RateProvider {
    pub fn new(store: Arc<dyn RateStore>, fetcher: Arc<dyn RateFetcher>) -> Self {
        Self { store, fetcher }
    }

    /// Returns a usable snapshot and where it came from.
    ///
    /// A fetch happens when `force_refresh` is set, nothing usable is cached,
    /// or the cached snapshot is older than `staleness_threshold`. A failed
    /// fetch falls back to the cache when there is one. The cached snapshot is
    /// returned as-is even when its base differs from `base`.
    pub async fn obtain_rates(
        &self,
        base: &str,
        force_refresh: bool,
        staleness_threshold: Option<Duration>,
    ) -> Result<ObtainedRates, RatesError> {
        let cached = load_snapshot(self.store.as_ref()).await?;

        let stale = match (&cached, staleness_threshold) {
            (Some(snapshot), Some(threshold)) => is_stale(snapshot, threshold, Utc::now()),
            _ => false,
        };

        if let Some(snapshot) = cached.as_ref()
            && !force_refresh
            && !stale
        {
            debug!("Using cached rates based on {}", snapshot.base_code);
            return Ok(ObtainedRates {
                snapshot: snapshot.clone(),
                source: RateSource::Cache,
                fallback_reason: None,
            });
        }

        match self.fetch_validated(base).await {
            Ok(snapshot) => {
                if let Err(e) = save_snapshot(self.store.as_ref(), &snapshot).await {
                    return Err(RatesError::NotPersisted {
                        snapshot: Box::new(snapshot),
                        reason: e.to_string(),
                    });
                }
                info!(
                    "Fetched {} rates based on {}",
                    snapshot.rates.len(),
                    snapshot.base_code
                );
                Ok(ObtainedRates {
                    snapshot,
                    source: RateSource::Network,
                    fallback_reason: None,
                })
            }
            Err(e) => match cached {
                Some(snapshot) => {
                    warn!("{}. Using cached rates", e);
                    Ok(ObtainedRates {
                        snapshot,
                        source: RateSource::NetworkAfterFallback,
                        fallback_reason: Some(e),
                    })
                }
                None => Err(RatesError::NoRatesAvailable(e.to_string())),
            },
        }
    }

    async fn fetch_validated(&self, base: &str) -> Result<RateSnapshot, RatesError> {
        debug!("Fetching rates for {}", base);
        let fetch_failed = |reason: String| RatesError::FetchFailed {
            base: base.to_string(),
            reason,
        };

        let snapshot = self
            .fetcher
            .fetch_rates(base)
            .await
            .map_err(|e| fetch_failed(format!("{e:#}")))?;

        if snapshot.rates.is_empty() {
            return Err(fetch_failed("response has no conversion rates".to_string()));
        }
        if let Some((code, rate)) = snapshot.invalid_rate() {
            return Err(fetch_failed(format!("response has invalid rate {rate} for {code}")));
        }
        Ok(snapshot)
    }
}
