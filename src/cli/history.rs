use super::ui;
use crate::core::converter::Converter;
use crate::core::format::{Amount, format_rate, format_relative};
use crate::core::history::HistoryEntry;
use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Table};
use tokio::time::Instant;

#[derive(Debug, Clone, Default)]
pub enum HistoryAction {
    #[default]
    List,
    Remove {
        id: String,
    },
    Describe {
        id: String,
        text: String,
    },
    Clear,
}

pub async fn run(converter: &mut Converter, action: HistoryAction) -> Result<()> {
    match action {
        HistoryAction::List => {
            let entries = converter.history().entries();
            if entries.is_empty() {
                println!("No conversions saved yet.");
            } else {
                println!(
                    "\n{}",
                    ui::style_text("Conversion history", ui::StyleType::Title)
                );
                println!("{}", history_table(entries, Utc::now()));
            }
        }
        HistoryAction::Remove { id } => {
            if !converter.remove_history(&id).await {
                bail!("No history entry with id {}", id);
            }
            println!("Removed history entry {id}");
        }
        HistoryAction::Describe { id, text } => {
            if !converter.update_history_description(&id, &text).await {
                bail!("No history entry with id {}", id);
            }
            println!("Updated history entry {id}");
        }
        HistoryAction::Clear => {
            converter.clear_history(Instant::now()).await;
            println!("History cleared");
        }
    }
    Ok(())
}

fn amount_text(amount: &str, currency: &str) -> String {
    format!("{} {}", Amount::from_text(amount).display(), currency)
}

/// Most recent first, numbered from 1.
pub fn history_table(entries: &[HistoryEntry], now: DateTime<Utc>) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("When"),
        ui::header_cell("From"),
        ui::header_cell("To"),
        ui::header_cell("Rate"),
        ui::header_cell("Description"),
        ui::header_cell("ID"),
    ]);

    for (i, entry) in entries.iter().enumerate() {
        let when = entry
            .created_millis()
            .map(|ms| format_relative(ms, now))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(when),
            ui::amount_cell(&amount_text(&entry.from_amount, &entry.from_currency)),
            ui::amount_cell(&amount_text(&entry.to_amount, &entry.to_currency)),
            ui::amount_cell(&format_rate(Some(entry.rate))),
            Cell::new(entry.description.as_deref().unwrap_or("")),
            ui::subtle_cell(&entry.id),
        ]);
    }
    table
}
