use super::ui;
use crate::core::{RateProvider, RateSnapshot, RateSource, RatesError};
use anyhow::Result;
use std::time::Duration;
use tracing::warn;

/// Obtains rates behind a spinner and reports degraded outcomes.
///
/// Rates that were fetched but could not be cached are still returned.
pub async fn obtain(
    provider: &RateProvider,
    base: &str,
    refresh: bool,
    staleness_threshold: Option<Duration>,
) -> Result<(RateSnapshot, RateSource)> {
    let pb = ui::new_spinner("Loading rates...");
    let obtained = provider
        .obtain_rates(base, refresh, staleness_threshold)
        .await;
    pb.finish_and_clear();

    match obtained {
        Ok(obtained) => {
            if let Some(reason) = &obtained.fallback_reason {
                eprintln!(
                    "{}",
                    ui::style_text(
                        &format!("{reason}. Using the last saved rates."),
                        ui::StyleType::Warning
                    )
                );
            }
            Ok((obtained.snapshot, obtained.source))
        }
        Err(RatesError::NotPersisted { snapshot, reason }) => {
            warn!("Fetched rates were not cached: {}", reason);
            eprintln!(
                "{}",
                ui::style_text(
                    &format!("Rates could not be saved for offline use: {reason}"),
                    ui::StyleType::Warning
                )
            );
            Ok((*snapshot, RateSource::Network))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn display_rates(snapshot: &RateSnapshot, source: RateSource) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Rate (1 {})", snapshot.base_code)),
    ]);

    for code in snapshot.supported_currencies() {
        let rate = snapshot.rates.get(&code).copied().unwrap_or_default();
        table.add_row(vec![comfy_table::Cell::new(&code), ui::number_cell(rate, 4)]);
    }

    let updated = snapshot
        .fetched_at()
        .map_or("unknown".to_string(), |t| t.format("%Y-%m-%d %H:%M UTC").to_string());

    let mut output = format!(
        "Rates: {}\n\n",
        ui::style_text(&snapshot.base_code, ui::StyleType::Title)
    );
    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n\nLast update: {} ({})",
        ui::style_text(&updated, ui::StyleType::TotalLabel),
        ui::source_label(source)
    ));
    output
}

pub async fn run(
    provider: &RateProvider,
    base: &str,
    refresh: bool,
    staleness_threshold: Option<Duration>,
) -> Result<()> {
    let (snapshot, source) = obtain(provider, base, refresh, staleness_threshold).await?;
    println!("{}", display_rates(&snapshot, source));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_display_rates_lists_sorted_codes() {
        let snapshot = RateSnapshot::new(
            "USD",
            HashMap::from([("USD".to_string(), 1.0), ("BRL".to_string(), 5.0)]),
            1_700_000_000,
        );

        let output = console::strip_ansi_codes(&display_rates(&snapshot, RateSource::Cache))
            .to_string();

        let brl = output.find("BRL").unwrap();
        let usd = output.rfind("USD").unwrap();
        assert!(brl < usd);
        assert!(output.contains("5.0000"));
        assert!(output.contains("2023-11-14 22:13 UTC"));
        assert!(output.contains("loaded from cache"));
    }
}
