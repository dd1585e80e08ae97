use super::{load_rates, ui};
use crate::core::catalog::currency_name;
use crate::core::converter::Converter;
use crate::core::currency::CurrencyRateProvider;
use crate::core::format::{InputEdit, format_rate, sanitize_input};
use crate::core::state::{ConverterState, EditDirection, Input};
use anyhow::{Result, bail};
use tokio::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct ConvertArgs {
    pub amount: String,
    pub from: Option<String>,
    pub to: Option<String>,
    /// Treat the amount as the target side.
    pub reverse: bool,
    /// `Some` saves to the history, with an optional description.
    pub save: Option<Option<String>>,
}

pub async fn run(
    converter: &mut Converter,
    provider: &dyn CurrencyRateProvider,
    args: ConvertArgs,
) -> Result<()> {
    if sanitize_input(&args.amount) == InputEdit::Rejected {
        bail!("Invalid amount: {}", args.amount);
    }

    let now = Instant::now();
    let from = args
        .from
        .unwrap_or_else(|| converter.state().from_currency.clone());
    let to = args
        .to
        .unwrap_or_else(|| converter.state().to_currency.clone());
    converter.apply(Input::SetPair { from, to }, now);

    load_rates(converter, provider).await?;

    let edit = if args.reverse {
        Input::EditTo(args.amount)
    } else {
        Input::EditFrom(args.amount)
    };
    converter.apply(edit, now);
    converter.settle();

    for line in conversion_lines(converter.state()) {
        println!("{line}");
    }

    if let Some(description) = args.save {
        let notification = converter.save(description).await;
        println!("{}", ui::notification_text(&notification));
    }
    Ok(())
}

/// The conversion and the rate it used, as plain lines.
pub fn conversion_lines(state: &ConverterState) -> Vec<String> {
    let from = format!("{} {}", state.amount.display(), state.from_currency);
    let to = format!("{} {}", state.to_amount.display(), state.to_currency);
    let conversion = match state.last_edited {
        EditDirection::From => format!("{from} = {to}"),
        EditDirection::To => format!("{to} = {from}"),
    };

    vec![
        conversion,
        format!(
            "1 {} = {} {} ({} to {})",
            state.from_currency,
            format_rate(state.current_rate()),
            state.to_currency,
            currency_name(&state.from_currency),
            currency_name(&state.to_currency)
        ),
    ]
}
