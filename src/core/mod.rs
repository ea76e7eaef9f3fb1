//! Core business logic: rate acquisition, conversion and history

pub mod config;
pub mod convert;
pub mod error;
pub mod history;
pub mod log;
pub mod rates;

// Re-export main types for cleaner imports
pub use convert::{Conversion, ConversionPath, convert};
pub use error::{ConvertError, HistoryError, RatesError, StoreError};
pub use history::{ConversionRecord, HistoryLedger, NewConversion};
pub use rates::{ObtainedRates, RateFetcher, RateProvider, RateSnapshot, RateSource};
