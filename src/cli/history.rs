use super::ui;
use crate::core::{ConversionRecord, HistoryLedger};
use anyhow::Result;
use chrono::{Local, TimeZone};
use comfy_table::Cell;

pub fn display_history(records: &[ConversionRecord]) -> String {
    if records.is_empty() {
        return ui::style_text("No conversions yet.", ui::StyleType::Subtle);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("When"),
        ui::header_cell("Amount"),
        ui::header_cell("From"),
        ui::header_cell("Result"),
        ui::header_cell("To"),
        ui::header_cell("Rate"),
    ]);

    for record in records {
        let when = Local
            .timestamp_millis_opt(record.timestamp)
            .single()
            .map_or("N/A".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        table.add_row(vec![
            Cell::new(when),
            ui::number_cell(record.amount, 2),
            Cell::new(&record.from_currency),
            ui::number_cell(record.result, 2),
            Cell::new(&record.to_currency),
            ui::number_cell(record.rate, 6),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Conversion history", ui::StyleType::Title),
        table
    )
}

pub async fn run(ledger: &HistoryLedger, clear: bool) -> Result<()> {
    if clear {
        ledger.clear().await?;
        println!("{}", ui::style_text("History cleared.", ui::StyleType::Subtle));
        return Ok(());
    }

    let records = ledger.list().await?;
    println!("{}", display_history(&records));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history_message() {
        let output = console::strip_ansi_codes(&display_history(&[])).to_string();
        assert_eq!(output, "No conversions yet.");
    }

    #[test]
    fn test_history_rows() {
        let record = ConversionRecord {
            id: "1700000000000".to_string(),
            from_currency: "USD".to_string(),
            to_currency: "BRL".to_string(),
            amount: 10.0,
            result: 50.0,
            rate: 5.0,
            timestamp: 1_700_000_000_000,
        };

        let output = console::strip_ansi_codes(&display_history(&[record])).to_string();

        assert!(output.contains("10.00"));
        assert!(output.contains("50.00"));
        assert!(output.contains("5.000000"));
        assert!(output.contains("BRL"));
    }
}
