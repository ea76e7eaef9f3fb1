pub mod exchangerate_api;
pub mod util;

pub use exchangerate_api::ExchangeRateApiFetcher;
