//! Fetches a rate table over HTTP from an open.er-api.com compatible
//! endpoint (`GET {base_url}/{BASE}`).

use crate::currency::RateTable;
use crate::error::{DashboardError, Result};
use crate::schema::Currency;
use log::{debug, info};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;

const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest";

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    result: Option<String>,
    base_code: String,
    rates: BTreeMap<String, f64>,
}

/// Builds a rate table from a response body. Codes outside [`Currency`]
/// are skipped; an unknown base code is an error.
pub fn parse_rate_response(body: &str) -> Result<RateTable> {
    let response: LatestRatesResponse = serde_json::from_str(body)?;

    if let Some(result) = response.result.as_deref() {
        if result != "success" {
            return Err(DashboardError::ValidationError {
                record: "rate response".to_string(),
                details: format!("provider returned result '{}'", result),
            });
        }
    }

    let base = Currency::from_str(&response.base_code)?;
    let mut rates = Vec::new();

    for (code, rate) in &response.rates {
        let Ok(currency) = Currency::from_str(code) else {
            debug!("Skipping unsupported currency {} in rate response", code);
            continue;
        };
        let rate = Decimal::try_from(*rate).map_err(|e| DashboardError::InvalidRate {
            currency: code.clone(),
            rate: e.to_string(),
        })?;
        rates.push((currency, rate));
    }

    RateTable::new(base, rates)
}

#[derive(Clone)]
pub struct RateClient {
    client: Client,
    base_url: String,
}

impl RateClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_RATES_URL.to_string(),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetches the latest rates quoted against `base`. Call once per pass and
    /// reuse the returned table for every conversion in it.
    pub async fn fetch(&self, base: Currency) -> Result<RateTable> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), base.code());
        info!("Fetching exchange rates from {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(DashboardError::ValidationError {
                record: "rate response".to_string(),
                details: format!("request failed (status {}): {}", status, error_text),
            });
        }

        let body = response.text().await?;
        parse_rate_response(&body)
    }
}

impl Default for RateClient {
    fn default() -> Self {
        Self::new()
    }
}
