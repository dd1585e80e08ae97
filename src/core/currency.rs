//! Exchange rate abstractions

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Rates for every known currency against a single base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub base: String,
    rates: HashMap<String, f64>,
}

impl RateTable {
    /// Builds a table, dropping rates that are not positive finite numbers.
    pub fn new(base: &str, rates: HashMap<String, f64>) -> Self {
        let rates = rates
            .into_iter()
            .filter(|(code, rate)| {
                let valid = rate.is_finite() && *rate > 0.0;
                if !valid {
                    debug!("Dropping invalid rate {} for {}", rate, code);
                }
                valid
            })
            .map(|(code, rate)| (code.to_uppercase(), rate))
            .collect();

        Self {
            base: base.to_uppercase(),
            rates,
        }
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    /// Fetches the latest rates for `base` against every supported currency.
    async fn latest_rates(&self, base: &str) -> Result<RateTable>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_table_drops_invalid_rates() {
        let rates = HashMap::from([
            ("eur".to_string(), 0.9),
            ("XXX".to_string(), 0.0),
            ("YYY".to_string(), -1.0),
            ("ZZZ".to_string(), f64::NAN),
        ]);
        let table = RateTable::new("usd", rates);

        assert_eq!(table.base, "USD");
        assert_eq!(table.len(), 1);
        assert_eq!(table.rate("EUR"), Some(0.9));
        assert!(table.rate("XXX").is_none());
        assert!(table.rate("GBP").is_none());
    }
}
