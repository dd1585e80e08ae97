use super::ui;
use crate::core::catalog::{Currency, country_code, currency_list, search};
use crate::core::currency::{CurrencyRateProvider, RateTable};
use crate::core::format::format_rate;
use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

/// Lists the currencies the provider quotes against `base`, optionally
/// filtered by code or name.
pub async fn run(provider: &dyn CurrencyRateProvider, base: &str, term: Option<&str>) -> Result<()> {
    let pb = ui::new_spinner(&format!("Fetching {base} rates"));
    let result = provider.latest_rates(base).await;
    pb.finish_and_clear();
    let table = result.with_context(|| format!("Failed to load rates for {base}"))?;

    let currencies = currency_list(&table);
    let matches = search(&currencies, term.unwrap_or(""));
    if matches.is_empty() {
        println!("No currencies match {}", term.unwrap_or(""));
        return Ok(());
    }

    println!("{}", currencies_table(&matches, &table));
    println!(
        "{}",
        ui::style_text(
            &format!("{} of {} currencies", matches.len(), currencies.len()),
            ui::StyleType::Subtle
        )
    );
    Ok(())
}

pub fn currencies_table(currencies: &[&Currency], rates: &RateTable) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Country"),
        ui::header_cell(&format!("Rate ({})", rates.base)),
    ]);

    for currency in currencies {
        table.add_row(vec![
            Cell::new(&currency.code),
            Cell::new(&currency.name),
            ui::subtle_cell(country_code(&currency.code)),
            ui::amount_cell(&format_rate(rates.rate(&currency.code))),
        ]);
    }
    table
}
