use super::ui;
use crate::core::catalog::currency_name;
use crate::core::converter::Converter;
use crate::core::favorites::FavoritePair;
use crate::core::state::Input;
use anyhow::{Result, bail};
use comfy_table::{Cell, Table};
use tokio::time::Instant;

#[derive(Debug, Clone, Default)]
pub enum FavoritesAction {
    #[default]
    List,
    Toggle {
        from: String,
        to: String,
    },
    Remove {
        id: String,
    },
}

pub async fn run(converter: &mut Converter, action: FavoritesAction) -> Result<()> {
    match action {
        FavoritesAction::List => {
            let pairs = converter.favorites().pairs();
            if pairs.is_empty() {
                println!("No favorite pairs yet.");
            } else {
                println!("\n{}", ui::style_text("Favorites", ui::StyleType::Title));
                println!("{}", favorites_table(pairs));
            }
        }
        FavoritesAction::Toggle { from, to } => {
            converter.apply(Input::SetPair { from, to }, Instant::now());
            let state = converter.state();
            let pair = format!("{}/{}", state.from_currency, state.to_currency);
            if converter.toggle_favorite().await {
                println!("Added {pair} to favorites");
            } else {
                println!("Removed {pair} from favorites");
            }
        }
        FavoritesAction::Remove { id } => match converter.remove_favorite(&id).await {
            Some(pair) => println!(
                "Removed {}/{} from favorites",
                pair.from_currency, pair.to_currency
            ),
            None => bail!("No favorite with id {}", id),
        },
    }
    Ok(())
}

pub fn pair_label(pair: &FavoritePair) -> String {
    format!("{} → {}", pair.from_currency, pair.to_currency)
}

pub fn favorites_table(pairs: &[FavoritePair]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Pair"),
        ui::header_cell("Currencies"),
        ui::header_cell("ID"),
    ]);

    for (i, pair) in pairs.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(pair_label(pair)),
            Cell::new(format!(
                "{} to {}",
                currency_name(&pair.from_currency),
                currency_name(&pair.to_currency)
            )),
            ui::subtle_cell(&pair.id),
        ]);
    }
    table
}
