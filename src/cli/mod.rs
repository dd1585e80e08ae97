pub mod convert;
pub mod currencies;
pub mod favorites;
pub mod history;
pub mod interactive;
pub mod recent;
pub mod setup;
pub mod ui;

use crate::core::converter::Converter;
use crate::core::currency::CurrencyRateProvider;
use crate::core::state::Input;
use anyhow::{Context, Result};
use tokio::time::Instant;

/// Fetches rates for the converter's base currency behind a spinner and
/// applies them.
pub async fn load_rates(converter: &mut Converter, provider: &dyn CurrencyRateProvider) -> Result<()> {
    let request = converter.request_rates();
    let pb = ui::new_spinner(&format!("Fetching {} rates", request.base));
    let result = provider.latest_rates(&request.base).await;
    pb.finish_and_clear();

    let table = result.with_context(|| format!("Failed to load rates for {}", request.base))?;
    converter.apply(
        Input::RatesLoaded {
            seq: request.seq,
            table,
        },
        Instant::now(),
    );
    Ok(())
}
