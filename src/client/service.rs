use crate::config::ServicesConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chatwallet_types::{
    AggregateRequest, BuildParams, NewTransactionRecord, StatusUpdate, TransactionDraft,
    TransactionKind, TransactionRecord,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

/// Remote transaction builder and record service.
#[async_trait]
pub trait TransactionService: Send + Sync {
    /// `POST /transactions/build/{kind}`
    async fn build(&self, params: &BuildParams) -> AppResult<TransactionDraft>;

    /// `POST /transactions/build/aggregate`
    async fn aggregate(&self, drafts: &[TransactionDraft]) -> AppResult<TransactionDraft>;

    /// `POST /transactions`
    async fn create_record(&self, record: &NewTransactionRecord) -> AppResult<TransactionRecord>;

    /// `PATCH /transactions/{id}/status`
    async fn update_status(&self, id: i64, update: &StatusUpdate) -> AppResult<()>;

    /// `GET /users/{id}/transactions`
    async fn list_user_transactions(&self, user_id: i64) -> AppResult<Vec<TransactionRecord>>;
}

/// HTTP client for the builder and record endpoints
pub struct HttpTransactionService {
    http: Client,
    config: ServicesConfig,
}

impl std::fmt::Debug for HttpTransactionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransactionService")
            .field("base_url", &self.config.url)
            .finish_non_exhaustive()
    }
}

impl HttpTransactionService {
    pub fn new(config: &ServicesConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    fn build_url(&self, kind: TransactionKind) -> String {
        self.config
            .endpoint(&format!("transactions/build/{}", kind.build_path()))
    }
}

/// Decode a JSON body, turning non-2xx responses into [`AppError::Upstream`]
/// carrying the body's `error` field when it has one.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> AppResult<T> {
    let response = check_status(response).await?;
    response.json().await.map_err(AppError::from)
}

pub(crate) async fn check_status(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

    error!("Service request failed with status {}: {}", status, message);
    Err(AppError::Upstream {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl TransactionService for HttpTransactionService {
    async fn build(&self, params: &BuildParams) -> AppResult<TransactionDraft> {
        let url = self.build_url(params.kind());
        debug!("Building {} transaction via {}", params.kind(), url);

        let request = self.http.post(&url);
        let request = match params {
            BuildParams::Transfer(p) => request.json(p),
            BuildParams::MoveCall(p) => request.json(p),
            BuildParams::NftMint(p) => request.json(p),
        };

        read_json(request.send().await?).await
    }

    async fn aggregate(&self, drafts: &[TransactionDraft]) -> AppResult<TransactionDraft> {
        let url = self.build_url(TransactionKind::Aggregate);
        debug!("Aggregating {} transactions via {}", drafts.len(), url);

        let body = AggregateRequest {
            transactions: drafts.to_vec(),
        };
        let response = self.http.post(&url).json(&body).send().await?;
        read_json(response).await
    }

    async fn create_record(&self, record: &NewTransactionRecord) -> AppResult<TransactionRecord> {
        let url = self.config.endpoint("transactions");
        debug!("Recording pending {} transaction", record.tx_type);

        let response = self.http.post(&url).json(record).send().await?;
        read_json(response).await
    }

    async fn update_status(&self, id: i64, update: &StatusUpdate) -> AppResult<()> {
        let url = self.config.endpoint(&format!("transactions/{}/status", id));
        debug!("Updating transaction {} to {:?}", id, update.status);

        let response = self.http.patch(&url).json(update).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn list_user_transactions(&self, user_id: i64) -> AppResult<Vec<TransactionRecord>> {
        let url = self.config.endpoint(&format!("users/{}/transactions", user_id));
        let response = self.http.get(&url).send().await?;
        read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_urls() {
        let service = HttpTransactionService::new(&ServicesConfig {
            url: "http://localhost:3000/api/".to_string(),
            timeout_secs: 5,
        })
        .unwrap();

        assert_eq!(
            service.build_url(TransactionKind::MoveCall),
            "http://localhost:3000/api/transactions/build/move-call"
        );
        assert_eq!(
            service.build_url(TransactionKind::Aggregate),
            "http://localhost:3000/api/transactions/build/aggregate"
        );
    }
}
