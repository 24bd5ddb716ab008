use crate::chat::Assistant;
use crate::error::AppError;
use crate::market::{BalanceClient, PriceClient};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared handles for the proxy routes
#[derive(Clone)]
pub struct AppState {
    pub prices: Arc<PriceClient>,
    pub balances: Arc<BalanceClient>,
    pub assistant: Arc<dyn Assistant>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Forward a node error with its own status and body text.
fn upstream_failure(status: u16, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(json!({ "error": message }))).into_response()
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub symbol: Option<String>,
}

#[derive(Serialize)]
pub struct PriceResponse {
    pub price: Option<f64>,
}

/// `GET /api/price?symbol=`
pub async fn price(State(state): State<AppState>, Query(query): Query<PriceQuery>) -> Response {
    let symbol = query
        .symbol
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| state.prices.default_symbol().to_string());

    match state.prices.price(&symbol).await {
        Ok(price) => Json(PriceResponse { price }).into_response(),
        Err(e) => {
            error!("Price lookup for {} failed: {}", symbol, e);
            AppError::internal("Failed to fetch price").into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub address: Option<String>,
    #[serde(rename = "coinType")]
    pub coin_type: Option<String>,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub balance: Option<String>,
}

/// `GET /api/sui/balance?address=&coinType=`
pub async fn balance(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> Response {
    let Some(address) = query.address.filter(|a| !a.trim().is_empty()) else {
        return AppError::InvalidRequest("address is required".to_string()).into_response();
    };
    let coin_type = query
        .coin_type
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| state.balances.default_coin_type().to_string());

    match state.balances.balance(&address, &coin_type).await {
        Ok(balance) => Json(BalanceResponse { balance }).into_response(),
        Err(AppError::Upstream { status, message }) => upstream_failure(status, &message),
        Err(e) => {
            error!("Balance lookup for {} failed: {}", address, e);
            AppError::internal("Failed to fetch balance").into_response()
        }
    }
}

#[derive(Serialize)]
pub struct AssistantStatus {
    pub available: bool,
    pub message: String,
}

/// `GET /api/services/claude`
pub async fn assistant_status(State(state): State<AppState>) -> Json<AssistantStatus> {
    let available = state.assistant.is_available();
    let message = if available {
        "Claude API is available and configured."
    } else {
        "Claude API is not configured. Please set ANTHROPIC_API_KEY env var."
    };

    Json(AssistantStatus {
        available,
        message: message.to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /api/services/claude/ask`
pub async fn ask(State(state): State<AppState>, Json(request): Json<AskRequest>) -> Response {
    let Some(message) = request.message.filter(|m| !m.trim().is_empty()) else {
        return AppError::InvalidRequest("message is required".to_string()).into_response();
    };

    match state.assistant.respond(&message).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => {
            error!("Assistant request failed: {}", e);
            e.into_response()
        }
    }
}

/// `GET /api/services/claude/ask`
pub async fn ask_ready() -> Json<serde_json::Value> {
    Json(json!({ "message": "Claude ask API is up." }))
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/price", get(price))
        .route("/api/sui/balance", get(balance))
        .route("/api/services/claude", get(assistant_status))
        .route("/api/services/claude/ask", get(ask_ready).post(ask))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{AssistantReply, TransactionIntent};
    use crate::config::MarketConfig;
    use crate::error::AppResult;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    struct EchoAssistant;

    #[async_trait]
    impl Assistant for EchoAssistant {
        fn is_available(&self) -> bool {
            true
        }

        async fn respond(&self, message: &str) -> AppResult<AssistantReply> {
            Ok(AssistantReply {
                answer: format!("You said: {}", message),
                intent: TransactionIntent::unknown(),
            })
        }
    }

    // Nothing listens on the discard port, so every market call fails to connect.
    fn app() -> Router {
        let market = MarketConfig {
            price_url: "http://127.0.0.1:9/simple/price".to_string(),
            timeout_secs: 2,
            ..MarketConfig::default()
        };
        create_router(AppState {
            prices: Arc::new(PriceClient::new(&market).unwrap()),
            balances: Arc::new(BalanceClient::new(&market, "http://127.0.0.1:9/").unwrap()),
            assistant: Arc::new(EchoAssistant),
        })
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_balance_requires_address() {
        let (status, body) = send(get("/api/sui/balance")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "address is required", "code": 400}));
    }

    #[tokio::test]
    async fn test_market_transport_failures() {
        let (status, body) = send(get("/api/sui/balance?address=0xAAA")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to fetch balance", "code": 500}));

        let (status, body) = send(get("/api/price?symbol=SUI")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to fetch price", "code": 500}));
    }

    #[tokio::test]
    async fn test_assistant_routes() {
        let (status, body) = send(get("/api/services/claude")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["available"], true);

        let (status, body) = send(get("/api/services/claude/ask")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Claude ask API is up.");

        let request = Request::builder()
            .method("POST")
            .uri("/api/services/claude/ask")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"message": "hello"}"#))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "You said: hello");
        assert_eq!(body["intent"]["type"], "unknown");
    }

    #[tokio::test]
    async fn test_ask_requires_message() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/services/claude/ask")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "message is required");
        assert_eq!(body["code"], 400);
    }
}
