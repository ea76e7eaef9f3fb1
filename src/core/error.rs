//! Error types for rate acquisition, conversion and history.

use crate::core::rates::RateSnapshot;
use thiserror::Error;

/// Failures of the key-value backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be read or written.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while converting an amount.
#[derive(Debug, Error, PartialEq)]
pub enum ConvertError {
    /// Malformed request: non-finite or negative amount, or an empty code.
    #[error("Invalid conversion input: {0}")]
    InvalidInput(String),

    /// The rate table has no entries.
    #[error("Exchange rates are not loaded")]
    MissingRates,

    /// The rate table has entries, but not for this currency.
    #[error("No rate available for {0}")]
    UnknownCurrency(String),

    /// The rate or the converted amount is not a finite number.
    #[error("Conversion out of range: {0}")]
    OutOfRange(String),
}

/// Errors raised while obtaining a rate snapshot.
#[derive(Debug, Error)]
pub enum RatesError {
    /// The remote fetch failed or returned unusable data.
    #[error("Failed to fetch rates for {base}: {reason}")]
    FetchFailed { base: String, reason: String },

    /// Neither a fresh nor a cached snapshot exists.
    #[error("No rates available: {0}")]
    NoRatesAvailable(String),

    /// The cached snapshot could not be read or written.
    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("Failed to encode rates: {0}")]
    Encode(#[from] serde_json::Error),

    /// Fresh rates were fetched but could not be cached. The snapshot is
    /// still usable for the current session.
    #[error("Fetched rates could not be saved: {reason}")]
    NotPersisted {
        snapshot: Box<RateSnapshot>,
        reason: String,
    },
}

/// Errors raised by the conversion history.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Failed to persist conversion history: {0}")]
    Persistence(#[from] StoreError),

    #[error("Conversion history is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Amounts that JSON cannot hold are refused before they reach the store.
    #[error("Refusing to record conversion: {0}")]
    InvalidRecord(String),
}
