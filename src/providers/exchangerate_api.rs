use crate::core::{RateFetcher, RateSnapshot};
use crate::providers::util::{redact, with_retry};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Fetches latest rates from the ExchangeRate-API v6 endpoint.
pub struct ExchangeRateApiFetcher {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ExchangeRateApiFetcher {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("cambio/1.0")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ExchangeRateApiFetcher {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }
}

#[derive(Deserialize, Debug)]
struct LatestRatesResponse {
    result: Option<String>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    base_code: Option<String>,
    conversion_rates: Option<HashMap<String, f64>>,
    time_last_update_unix: Option<i64>,
}

#[async_trait]
impl RateFetcher for ExchangeRateApiFetcher {
    #[instrument(
        name = "ExchangeRateFetch",
        skip(self),
        fields(base = %base)
    )]
    async fn fetch_rates(&self, base: &str) -> Result<RateSnapshot> {
        if self.api_key.is_empty() {
            bail!("No API key configured for the rates API");
        }
        let url = format!("{}/v6/{}/latest/{}", self.base_url, self.api_key, base);
        debug!(
            "Requesting rates from {}/v6/{}/latest/{}",
            self.base_url,
            redact(&self.api_key),
            base
        );

        let response = with_retry(|| async { self.client.get(&url).send().await }, 3, 500)
            .await
            .with_context(|| format!("Failed to send rates request for {base}"))?;
        let status = response.status();

        let response_text = response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for {base}"))?;

        if response_text.trim().is_empty() {
            return Err(anyhow!("Received empty rates response for {} ({})", base, status));
        }

        let parsed: LatestRatesResponse =
            serde_json::from_str(&response_text).with_context(|| {
                format!("Failed to parse rates response for {base} ({status}): '{response_text}'")
            })?;

        if parsed.result.as_deref() == Some("error") {
            bail!(
                "Rates API returned an error for {}: {}",
                base,
                parsed.error_type.as_deref().unwrap_or("unknown")
            );
        }
        if !status.is_success() {
            bail!("Rates API returned status {} for {}", status, base);
        }

        let rates = parsed.conversion_rates.unwrap_or_default();
        debug!("Received {} rates for {}", rates.len(), base);

        Ok(RateSnapshot::new(
            parsed.base_code.as_deref().unwrap_or(base),
            rates,
            parsed
                .time_last_update_unix
                .unwrap_or_else(|| Utc::now().timestamp()),
        ))
    }
}
