use crate::core::currency::{CurrencyRateProvider, RateTable};
use crate::providers::util::{join_url, with_retry};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Latest rates from exchangerate-api.com (v6).
pub struct ExchangeRateApiProvider {
    base_url: String,
    api_key: String,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        ExchangeRateApiProvider {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    result: String,
    #[serde(default)]
    conversion_rates: HashMap<String, f64>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
}

#[async_trait]
impl CurrencyRateProvider for ExchangeRateApiProvider {
    #[instrument(name = "ExchangeRateFetch", skip(self), fields(base = %base))]
    async fn latest_rates(&self, base: &str) -> Result<RateTable> {
        if self.api_key.is_empty() {
            bail!("No API key configured for the exchange rate provider");
        }

        let base = base.trim().to_uppercase();
        let url = join_url(&self.base_url, &format!("{}/latest/{}", self.api_key, base));
        debug!("Requesting latest rates for {}", base);

        let client = reqwest::Client::builder().user_agent("xfx/1.0").build()?;
        let response = with_retry(|| client.get(&url).send(), 3, 500)
            .await
            .map_err(|e| anyhow!("Request error for base currency {}: {}", base, redact_url(e)))?;

        let status = response.status();
        let text = response.text().await?;

        // The API answers errors with a JSON body too, read it before the status.
        let data: LatestRatesResponse = match serde_json::from_str(&text) {
            Ok(data) => data,
            Err(e) if status.is_success() => {
                bail!("Failed to parse rates response for {}: {}", base, e)
            }
            Err(_) => bail!("HTTP error: {} for base currency: {}", status, base),
        };

        if data.result != "success" || !status.is_success() {
            bail!(
                "Exchange rate API error for {}: {}",
                base,
                data.error_type.as_deref().unwrap_or("unknown")
            );
        }

        let table = RateTable::new(&base, data.conversion_rates);
        debug!("Received {} rates for {}", table.len(), base);
        Ok(table)
    }
}

/// Drops the request URL, which embeds the API key, from transport errors.
fn redact_url(err: anyhow::Error) -> anyhow::Error {
    match err.downcast::<reqwest::Error>() {
        Ok(e) => anyhow::Error::from(e.without_url()),
        Err(other) => other,
    }
}
