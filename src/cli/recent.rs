use super::ui;
use crate::core::converter::Converter;
use crate::core::format::Amount;
use crate::core::recent::RecentAmountEntry;
use crate::core::state::{EditDirection, Input};
use anyhow::Result;
use comfy_table::{Cell, Table};
use tokio::time::Instant;

/// Lists the recent amounts for a pair, the configured one by default.
pub fn run(converter: &mut Converter, from: Option<String>, to: Option<String>) -> Result<()> {
    if let (Some(from), Some(to)) = (from, to) {
        converter.apply(Input::SetPair { from, to }, Instant::now());
    }

    let state = converter.state();
    let entries = converter.visible_recent_amounts();
    if entries.is_empty() {
        println!(
            "No recent amounts for {}/{}.",
            state.from_currency, state.to_currency
        );
        return Ok(());
    }

    println!(
        "\n{}",
        ui::style_text(
            &format!("Recent {}/{}", state.from_currency, state.to_currency),
            ui::StyleType::Title
        )
    );
    println!(
        "{}",
        recent_table(&entries, &state.from_currency, &state.to_currency)
    );
    Ok(())
}

pub fn recent_table(entries: &[&RecentAmountEntry], from_currency: &str, to_currency: &str) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell(from_currency),
        ui::header_cell(to_currency),
        ui::header_cell("Typed"),
    ]);

    for (i, entry) in entries.iter().enumerate() {
        let typed = match entry.last_edited {
            EditDirection::From => from_currency,
            EditDirection::To => to_currency,
        };
        table.add_row(vec![
            Cell::new(i + 1),
            ui::amount_cell(&Amount::from_text(entry.from.as_str()).display()),
            ui::amount_cell(&Amount::from_text(entry.to.as_str()).display()),
            ui::subtle_cell(typed),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_table() {
        let entry = RecentAmountEntry {
            from: "2500".to_string(),
            to: "30.123456".to_string(),
            last_edited: EditDirection::To,
            id: "USD_EUR-1".to_string(),
            fading_out: false,
        };

        let rendered = recent_table(&[&entry], "INR", "USD").to_string();
        assert!(rendered.contains("2,500"));
        assert!(rendered.contains("30.12"));
        assert!(!rendered.contains("30.123"));
    }
}
