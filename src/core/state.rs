//! Conversion state and the transitions applied to it by user input and
//! incoming rate tables.

use crate::core::currency::RateTable;
use crate::core::format::{Amount, InputEdit, sanitize_input};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::debug;

/// Which amount field the user edited last. That field is the source of truth
/// whenever rates or currencies change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditDirection {
    #[default]
    From,
    To,
}

impl EditDirection {
    pub fn flipped(self) -> Self {
        match self {
            EditDirection::From => EditDirection::To,
            EditDirection::To => EditDirection::From,
        }
    }
}

impl Display for EditDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                EditDirection::From => "editing-from",
                EditDirection::To => "editing-to",
            }
        )
    }
}

/// Number pad keys. They always edit the "from" field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypadKey {
    Digit(char),
    Point,
    Backspace,
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    EditFrom(String),
    EditTo(String),
    Keypad(KeypadKey),
    SetFromCurrency(String),
    SetToCurrency(String),
    SetPair { from: String, to: String },
    Swap,
    RatesLoaded { seq: u64, table: RateTable },
    /// Restores a previously recorded pair of amounts.
    LoadAmounts {
        from: Amount,
        to: Amount,
        direction: EditDirection,
    },
    /// Zeroes both amounts and switches to the given pair.
    Reset { from: String, to: String },
}

/// Rates the caller has to fetch. Only the response carrying the latest `seq`
/// is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRequest {
    pub base: String,
    pub seq: u64,
}

#[derive(Debug, Clone)]
pub struct ConverterState {
    pub amount: Amount,
    pub to_amount: Amount,
    pub last_edited: EditDirection,
    pub from_currency: String,
    pub to_currency: String,
    rates: Option<RateTable>,
    latest_seq: u64,
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl ConverterState {
    pub fn new(from_currency: &str, to_currency: &str) -> Self {
        Self {
            amount: Amount::zero(),
            to_amount: Amount::zero(),
            last_edited: EditDirection::From,
            from_currency: normalize_code(from_currency),
            to_currency: normalize_code(to_currency),
            rates: None,
            latest_seq: 0,
        }
    }

    /// Issues a fetch for the current base currency, superseding any request
    /// still in flight.
    pub fn request_rates(&mut self) -> RateRequest {
        self.latest_seq += 1;
        RateRequest {
            base: self.from_currency.clone(),
            seq: self.latest_seq,
        }
    }

    /// The table for the current base currency, if it has arrived.
    pub fn rates(&self) -> Option<&RateTable> {
        self.rates
            .as_ref()
            .filter(|table| table.base == self.from_currency)
    }

    pub fn current_rate(&self) -> Option<f64> {
        self.rates()
            .and_then(|table| table.rate(&self.to_currency))
    }

    /// Applies one input, returning a rate fetch when the base currency changed.
    pub fn apply(&mut self, input: Input) -> Option<RateRequest> {
        match input {
            Input::EditFrom(raw) => {
                self.edit(EditDirection::From, &raw);
                None
            }
            Input::EditTo(raw) => {
                self.edit(EditDirection::To, &raw);
                None
            }
            Input::Keypad(key) => {
                self.keypad(key);
                None
            }
            Input::SetFromCurrency(code) => {
                let to = self.to_currency.clone();
                self.set_pair(&code, &to)
            }
            Input::SetToCurrency(code) => {
                let from = self.from_currency.clone();
                self.set_pair(&from, &code)
            }
            Input::SetPair { from, to } => self.set_pair(&from, &to),
            Input::Swap => self.swap(),
            Input::RatesLoaded { seq, table } => {
                self.rates_loaded(seq, table);
                None
            }
            Input::LoadAmounts {
                from,
                to,
                direction,
            } => {
                match direction {
                    EditDirection::From => self.amount = from,
                    EditDirection::To => self.to_amount = to,
                }
                self.last_edited = direction;
                self.recompute();
                None
            }
            Input::Reset { from, to } => {
                self.amount = Amount::zero();
                self.to_amount = Amount::zero();
                self.set_pair(&from, &to)
            }
        }
    }

    fn edit(&mut self, direction: EditDirection, raw: &str) {
        match sanitize_input(raw) {
            InputEdit::Rejected => {
                debug!("Ignoring input with multiple decimal points: {}", raw);
            }
            InputEdit::Empty => {
                self.amount = Amount::zero();
                self.to_amount = Amount::zero();
            }
            InputEdit::Value(cleaned) => {
                match direction {
                    EditDirection::From => self.amount = Amount::from_text(cleaned),
                    EditDirection::To => self.to_amount = Amount::from_text(cleaned),
                }
                self.last_edited = direction;
                self.recompute();
            }
        }
    }

    fn keypad(&mut self, key: KeypadKey) {
        let current = self.amount.as_str();
        let next = match key {
            KeypadKey::Digit(d) if d.is_ascii_digit() => {
                if current == "0" {
                    d.to_string()
                } else {
                    format!("{current}{d}")
                }
            }
            KeypadKey::Digit(_) => return,
            KeypadKey::Point if current.contains('.') => return,
            KeypadKey::Point => format!("{current}."),
            KeypadKey::Backspace => {
                let mut chars = current.chars();
                chars.next_back();
                match chars.as_str() {
                    "" => "0".to_string(),
                    rest => rest.to_string(),
                }
            }
            KeypadKey::Clear => "0".to_string(),
        };
        self.edit(EditDirection::From, &next);
    }

    fn set_pair(&mut self, from: &str, to: &str) -> Option<RateRequest> {
        let from = normalize_code(from);
        let to = normalize_code(to);
        if from.is_empty() || to.is_empty() {
            return None;
        }

        let base_changed = from != self.from_currency;
        self.from_currency = from;
        self.to_currency = to;

        if base_changed {
            // Amounts are held until the new table arrives.
            Some(self.request_rates())
        } else {
            self.recompute();
            None
        }
    }

    fn swap(&mut self) -> Option<RateRequest> {
        std::mem::swap(&mut self.from_currency, &mut self.to_currency);
        std::mem::swap(&mut self.amount, &mut self.to_amount);
        self.last_edited = self.last_edited.flipped();

        if self.from_currency != self.to_currency {
            Some(self.request_rates())
        } else {
            None
        }
    }

    fn rates_loaded(&mut self, seq: u64, table: RateTable) {
        if seq != self.latest_seq {
            debug!(
                "Discarding stale rates for {} (seq {}, latest {})",
                table.base, seq, self.latest_seq
            );
            return;
        }
        if table.base != self.from_currency {
            debug!(
                "Discarding rates for {} while base is {}",
                table.base, self.from_currency
            );
            return;
        }
        self.rates = Some(table);
        self.recompute();
    }

    /// Recomputes the field that was not edited last from the one that was.
    fn recompute(&mut self) {
        let rate = self.current_rate();
        match self.last_edited {
            EditDirection::From => {
                self.to_amount = match (self.amount.value(), rate) {
                    (Some(v), Some(rate)) if self.amount.is_nonzero() => Amount::from_value(v * rate),
                    _ => Amount::zero(),
                };
            }
            EditDirection::To => {
                self.amount = match (self.to_amount.value(), rate) {
                    (Some(v), Some(rate)) if self.to_amount.is_nonzero() => Amount::from_value(v / rate),
                    _ => Amount::zero(),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn table(base: &str, rates: &[(&str, f64)]) -> RateTable {
        RateTable::new(
            base,
            rates
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn loaded(from: &str, to: &str, rates: &[(&str, f64)]) -> ConverterState {
        let mut state = ConverterState::new(from, to);
        let request = state.request_rates();
        state.apply(Input::RatesLoaded {
            seq: request.seq,
            table: table(from, rates),
        });
        state
    }

    #[test]
    fn test_edit_from_then_to() {
        let mut state = loaded("USD", "EUR", &[("EUR", 0.9), ("USD", 1.0)]);

        state.apply(Input::EditFrom("100".to_string()));
        assert_eq!(state.to_amount.display(), "90");
        assert_eq!(state.last_edited, EditDirection::From);

        state.apply(Input::EditTo("45".to_string()));
        assert_eq!(state.amount.display(), "50");
        assert_eq!(state.last_edited, EditDirection::To);
        assert_eq!(state.last_edited.to_string(), "editing-to");
    }

    #[test]
    fn test_unknown_target_currency_leaves_zero() {
        let mut state = loaded("USD", "EUR", &[("EUR", 0.9)]);
        state.apply(Input::SetToCurrency("ABC".to_string()));
        state.apply(Input::EditFrom("100".to_string()));

        assert_eq!(state.amount.display(), "100");
        assert_eq!(state.to_amount.display(), "0");
        assert!(state.current_rate().is_none());
    }

    #[test]
    fn test_missing_table_leaves_zero() {
        let mut state = ConverterState::new("USD", "EUR");
        state.apply(Input::EditFrom("100".to_string()));
        assert_eq!(state.to_amount.as_str(), "0");
    }

    #[test]
    fn test_multiple_points_are_rejected() {
        let mut state = loaded("USD", "EUR", &[("EUR", 0.9)]);
        state.apply(Input::EditFrom("12.5".to_string()));
        state.apply(Input::EditFrom("12.5.".to_string()));
        assert_eq!(state.amount.as_str(), "12.5");
    }

    #[test]
    fn test_empty_input_zeroes_both_fields() {
        let mut state = loaded("USD", "EUR", &[("EUR", 0.9)]);
        state.apply(Input::EditTo("45".to_string()));
        state.apply(Input::EditTo("".to_string()));

        assert_eq!(state.amount.as_str(), "0");
        assert_eq!(state.to_amount.as_str(), "0");
        assert_eq!(state.last_edited, EditDirection::To);
    }

    #[test]
    fn test_trailing_point_is_kept_while_typing() {
        let mut state = loaded("USD", "EUR", &[("EUR", 0.9)]);
        state.apply(Input::EditFrom("12.".to_string()));
        assert_eq!(state.amount.display(), "12.");
        assert_eq!(state.to_amount.display(), "10.8");
    }

    #[test]
    fn test_swap_transposes_and_requests_rates() {
        let mut state = loaded("USD", "EUR", &[("EUR", 0.9)]);
        state.apply(Input::EditFrom("100".to_string()));

        let request = state.apply(Input::Swap).expect("swap changes base");
        assert_eq!(request.base, "EUR");
        assert_eq!(state.from_currency, "EUR");
        assert_eq!(state.to_currency, "USD");
        assert_eq!(state.amount.display(), "90");
        assert_eq!(state.to_amount.display(), "100");
        assert_eq!(state.last_edited, EditDirection::To);

        // The held amount is the last edited one ("to" after the swap).
        state.apply(Input::RatesLoaded {
            seq: request.seq,
            table: table("EUR", &[("USD", 1.25)]),
        });
        assert_eq!(state.to_amount.display(), "100");
        assert_eq!(state.amount.display(), "80");
    }

    #[test]
    fn test_base_change_holds_last_edited_amount() {
        let mut state = loaded("USD", "EUR", &[("EUR", 0.9), ("GBP", 0.8)]);
        state.apply(Input::EditTo("45".to_string()));

        let request = state
            .apply(Input::SetFromCurrency("gbp".to_string()))
            .expect("base changed");
        assert_eq!(request.base, "GBP");
        assert_eq!(state.to_amount.display(), "45");

        state.apply(Input::RatesLoaded {
            seq: request.seq,
            table: table("GBP", &[("EUR", 1.5)]),
        });
        assert_eq!(state.to_amount.display(), "45");
        assert_eq!(state.amount.display(), "30");
    }

    #[test]
    fn test_stale_rate_response_is_discarded() {
        let mut state = loaded("USD", "EUR", &[("EUR", 0.9)]);
        state.apply(Input::EditFrom("100".to_string()));

        let first = state.apply(Input::SetFromCurrency("GBP".to_string())).unwrap();
        let second = state.apply(Input::SetFromCurrency("JPY".to_string())).unwrap();
        assert!(second.seq > first.seq);

        state.apply(Input::RatesLoaded {
            seq: second.seq,
            table: table("JPY", &[("EUR", 0.006)]),
        });
        // The older GBP response arrives last and must not win.
        state.apply(Input::RatesLoaded {
            seq: first.seq,
            table: table("GBP", &[("EUR", 1.2)]),
        });

        assert_eq!(state.rates().map(|t| t.base.as_str()), Some("JPY"));
        assert_eq!(state.to_amount.display(), "0.6");
    }

    #[test]
    fn test_same_base_does_not_refetch() {
        let mut state = loaded("USD", "EUR", &[("EUR", 0.9), ("GBP", 0.8)]);
        state.apply(Input::EditFrom("10".to_string()));

        assert!(
            state
                .apply(Input::SetPair {
                    from: "USD".to_string(),
                    to: "GBP".to_string()
                })
                .is_none()
        );
        assert_eq!(state.to_amount.display(), "8");
    }

    #[test]
    fn test_keypad_edits_from_field() {
        let mut state = loaded("USD", "EUR", &[("EUR", 0.5)]);

        state.apply(Input::Keypad(KeypadKey::Digit('4')));
        state.apply(Input::Keypad(KeypadKey::Digit('2')));
        state.apply(Input::Keypad(KeypadKey::Point));
        state.apply(Input::Keypad(KeypadKey::Point));
        state.apply(Input::Keypad(KeypadKey::Digit('5')));
        assert_eq!(state.amount.as_str(), "42.5");
        assert_eq!(state.to_amount.display(), "21.25");

        state.apply(Input::Keypad(KeypadKey::Backspace));
        assert_eq!(state.amount.as_str(), "42.");

        state.apply(Input::Keypad(KeypadKey::Clear));
        assert_eq!(state.amount.as_str(), "0");
        assert_eq!(state.to_amount.as_str(), "0");

        state.apply(Input::Keypad(KeypadKey::Backspace));
        assert_eq!(state.amount.as_str(), "0");
    }

    #[test]
    fn test_load_amounts_restores_edited_field() {
        let mut state = loaded("USD", "EUR", &[("EUR", 0.9)]);
        state.apply(Input::LoadAmounts {
            from: Amount::from_text("1"),
            to: Amount::from_text("9"),
            direction: EditDirection::To,
        });

        assert_eq!(state.to_amount.as_str(), "9");
        assert_eq!(state.amount.display(), "10");
        assert_eq!(state.last_edited, EditDirection::To);
    }

    #[test]
    fn test_reset_zeroes_amounts() {
        let mut state = loaded("USD", "EUR", &[("EUR", 0.9)]);
        state.apply(Input::EditFrom("100".to_string()));

        let request = state.apply(Input::Reset {
            from: "INR".to_string(),
            to: "USD".to_string(),
        });
        assert_eq!(request.map(|r| r.base), Some("INR".to_string()));
        assert_eq!(state.amount.as_str(), "0");
        assert_eq!(state.to_amount.as_str(), "0");
    }
}
