use crate::client::service::check_status;
use crate::config::MarketConfig;
use crate::error::AppResult;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// USD spot prices from a CoinGecko-style simple-price endpoint
pub struct PriceClient {
    http: Client,
    price_url: String,
    default_symbol: String,
}

impl std::fmt::Debug for PriceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceClient")
            .field("price_url", &self.price_url)
            .finish_non_exhaustive()
    }
}

impl PriceClient {
    pub fn new(config: &MarketConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            price_url: config.price_url.clone(),
            default_symbol: config.default_symbol.clone(),
        })
    }

    pub fn default_symbol(&self) -> &str {
        &self.default_symbol
    }

    /// Price of `symbol` in USD. Symbols are lower-cased; an unknown symbol is `None`.
    pub async fn price(&self, symbol: &str) -> AppResult<Option<f64>> {
        let symbol = symbol.trim().to_lowercase();
        debug!("Fetching {} price from {}", symbol, self.price_url);

        let response = self
            .http
            .get(&self.price_url)
            .query(&[("ids", symbol.as_str()), ("vs_currencies", "usd")])
            .send()
            .await?;
        let body: Value = check_status(response).await?.json().await?;

        Ok(body
            .get(&symbol)
            .and_then(|entry| entry.get("usd"))
            .and_then(Value::as_f64))
    }
}
