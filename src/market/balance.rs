use crate::config::MarketConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: [&'a str; 2],
}

/// Coin balance lookups through the fullnode JSON-RPC `suix_getBalance` call
pub struct BalanceClient {
    http: Client,
    node_url: String,
    default_coin_type: String,
}

impl std::fmt::Debug for BalanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceClient")
            .field("node_url", &self.node_url)
            .finish_non_exhaustive()
    }
}

impl BalanceClient {
    pub fn new(config: &MarketConfig, node_url: impl Into<String>) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            node_url: node_url.into(),
            default_coin_type: config.default_coin_type.clone(),
        })
    }

    pub fn default_coin_type(&self) -> &str {
        &self.default_coin_type
    }

    /// Total balance of `coin_type` held by `address`, as the node's decimal
    /// string. A non-2xx node response is [`AppError::Upstream`] with the raw body.
    pub async fn balance(&self, address: &str, coin_type: &str) -> AppResult<Option<String>> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "suix_getBalance",
            params: [address, coin_type],
        };
        debug!("Fetching {} balance for {} from {}", coin_type, address, self.node_url);

        let response = self.http.post(&self.node_url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Balance lookup failed with status {}: {}", status, message);
            return Err(AppError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        Ok(match body.pointer("/result/totalBalance") {
            Some(Value::String(total)) => Some(total.clone()),
            Some(Value::Number(total)) => Some(total.to_string()),
            _ => None,
        })
    }
}
