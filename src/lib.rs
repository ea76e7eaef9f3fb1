pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::{HistoryLedger, RateProvider};
use crate::providers::ExchangeRateApiFetcher;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub enum AppCommand {
    Rates {
        base: Option<String>,
        refresh: bool,
    },
    Convert(cli::convert::ConvertRequest),
    History {
        clear: bool,
    },
}

fn build_provider(config: &AppConfig, store: Arc<dyn store::RateStore>) -> Result<RateProvider> {
    let api_key = config.api_key().unwrap_or_else(|e| {
        warn!("{}. Only cached rates will be available", e);
        String::new()
    });
    let fetcher =
        ExchangeRateApiFetcher::new(&config.providers.exchangerate_api.base_url, &api_key)?;
    Ok(RateProvider::new(store, Arc::new(fetcher)))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("cambio starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let store = store::open(&config.default_data_path()?);
    let staleness_threshold = config.staleness_threshold();

    match command {
        AppCommand::Rates { base, refresh } => {
            let provider = build_provider(&config, store)?;
            let base = base.as_deref().unwrap_or(&config.base_currency);
            cli::rates::run(&provider, base, refresh, staleness_threshold).await
        }
        AppCommand::Convert(request) => {
            let provider = build_provider(&config, Arc::clone(&store))?;
            let ledger = HistoryLedger::new(store);
            cli::convert::run(
                &provider,
                &ledger,
                request,
                &config.base_currency,
                &config.target_currency,
                staleness_threshold,
            )
            .await
        }
        AppCommand::History { clear } => {
            let ledger = HistoryLedger::new(store);
            cli::history::run(&ledger, clear).await
        }
    }
}
