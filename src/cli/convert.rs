use super::{rates, ui};
use crate::core::{Conversion, HistoryLedger, NewConversion, RateProvider, RateSnapshot, convert};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::warn;

/// A conversion request as typed by the user.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub amount: f64,
    pub from: Option<String>,
    pub to: Option<String>,
    pub refresh: bool,
    pub swap: bool,
}

/// Picks the currency pair: explicit codes win, omitted ones fall back to
/// the defaults, resolved against what the table actually has.
pub fn select_pair(
    request: &ConvertRequest,
    default_from: &str,
    default_to: &str,
    snapshot: &RateSnapshot,
) -> (String, String) {
    let fallback_from = request.from.as_deref().unwrap_or(default_from);
    let fallback_to = request.to.as_deref().unwrap_or(default_to);
    let (resolved_from, resolved_to) = snapshot
        .resolve_pair(fallback_from, fallback_to)
        .unwrap_or((fallback_from.to_string(), fallback_to.to_string()));

    let from = request.from.clone().unwrap_or(resolved_from);
    let to = request.to.clone().unwrap_or(resolved_to);
    if request.swap { (to, from) } else { (from, to) }
}

/// The currency the fetched table should be based on: whichever code ends
/// up as the source after `--swap`, so the conversion can take the direct path.
pub fn fetch_base<'a>(
    request: &'a ConvertRequest,
    default_from: &'a str,
    default_to: &'a str,
) -> &'a str {
    if request.swap {
        request.to.as_deref().unwrap_or(default_to)
    } else {
        request.from.as_deref().unwrap_or(default_from)
    }
}

pub fn display_conversion(amount: f64, from: &str, to: &str, conversion: &Conversion) -> String {
    let mut output = format!(
        "{amount:.2} {from} = {} {to}\n",
        ui::style_text(&format!("{:.2}", conversion.result), ui::StyleType::TotalValue)
    );
    output.push_str(&ui::style_text(
        &format!("1 {from} = {:.6} {to}", conversion.rate),
        ui::StyleType::Subtle,
    ));
    if conversion.is_approximate() {
        output.push('\n');
        output.push_str(&ui::style_text(
            &format!(
                "Rates are not based on {from}; this {} rate is approximate.",
                conversion.path
            ),
            ui::StyleType::Warning,
        ));
    }
    output
}

pub async fn run(
    provider: &RateProvider,
    ledger: &HistoryLedger,
    request: ConvertRequest,
    default_from: &str,
    default_to: &str,
    staleness_threshold: Option<Duration>,
) -> Result<()> {
    let base = fetch_base(&request, default_from, default_to);
    let (snapshot, _) = rates::obtain(provider, base, request.refresh, staleness_threshold).await?;

    let (from, to) = select_pair(&request, default_from, default_to, &snapshot);
    let conversion = convert(request.amount, &from, &to, &snapshot)
        .with_context(|| format!("Could not convert {from} to {to}"))?;

    println!(
        "{}",
        display_conversion(request.amount, &from, &to, &conversion)
    );

    let record = NewConversion {
        from_currency: from,
        to_currency: to,
        amount: request.amount,
        result: conversion.result,
        rate: conversion.rate,
    };
    if let Err(e) = ledger.append(record).await {
        warn!("Conversion not recorded: {}", e);
        eprintln!(
            "{}",
            ui::style_text(
                &format!("Conversion was not saved to history: {e}"),
                ui::StyleType::Warning
            )
        );
    }
    Ok(())
}
