use crate::chat::intent::TransactionIntent;
use crate::client::service::check_status;
use crate::config::AssistantConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

const API_VERSION: &str = "2023-06-01";

const ASSISTANT_PROMPT: &str = "You are a crypto assistant specializing in Sui blockchain transactions.
You can help users build transactions, query cryptocurrency prices, and understand blockchain concepts.
{context}
When users want to perform actions on the blockchain:
1. For transfers: Extract recipient address and amount
2. For NFT minting: Extract name, description, and any properties
3. For Move calls: Extract package ID, module, function, and arguments

Keep your responses concise and focused on the user's request.
If you need more information to complete a transaction, ask for it.";

const INTENT_PROMPT: &str = "You are a transaction parser. Analyze the user's message and determine what type of blockchain action they want to perform.
Output a JSON object with:
1. \"type\": \"transfer\", \"moveCall\", \"nftMint\", \"query\", or \"unknown\"
2. \"params\": an object with the extracted parameters

For \"transfer\": { recipient, amount }
For \"moveCall\": { packageId, module, function, args }
For \"nftMint\": { name, description, url }
For \"query\": { asset, attribute } (e.g., price of BTC)
For \"unknown\": {}

Only output valid JSON.";

const NO_TEXT_REPLY: &str = "Sorry, I couldn't generate a text response.";

/// LLM API key, wiped from memory on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct AssistantCredentials {
    api_key: String,
}

impl AssistantCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Read `CHATWALLET_ASSISTANT_API_KEY`, falling back to `ANTHROPIC_API_KEY`.
    pub fn from_env() -> Option<Self> {
        ["CHATWALLET_ASSISTANT_API_KEY", "ANTHROPIC_API_KEY"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|key| !key.trim().is_empty())
            .map(Self::new)
    }
}

impl std::fmt::Debug for AssistantCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantCredentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Answer plus the classified intent for one chat message
#[derive(Debug, Clone, Serialize)]
pub struct AssistantReply {
    pub answer: String,
    pub intent: TransactionIntent,
}

/// Conversational backend used by the chat flow and the ask route.
#[async_trait]
pub trait Assistant: Send + Sync {
    fn is_available(&self) -> bool;

    async fn respond(&self, message: &str) -> AppResult<AssistantReply>;
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// Client for the LLM messages API
pub struct AssistantClient {
    http: Client,
    config: AssistantConfig,
    credentials: Option<AssistantCredentials>,
}

impl std::fmt::Debug for AssistantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantClient")
            .field("api_url", &self.config.api_url)
            .field("model", &self.config.model)
            .field("available", &self.credentials.is_some())
            .finish_non_exhaustive()
    }
}

impl AssistantClient {
    pub fn new(config: &AssistantConfig, credentials: Option<AssistantCredentials>) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        if credentials.is_none() {
            info!("No assistant API key configured; chat answers are disabled");
        }

        Ok(Self {
            http,
            config: config.clone(),
            credentials,
        })
    }

    /// Free-form answer to `prompt`. Errors are turned into an apology text.
    pub async fn ask(&self, prompt: &str, context: &str) -> String {
        let context = if context.is_empty() {
            String::new()
        } else {
            format!("\nAdditional context: {}\n", context)
        };
        let system = ASSISTANT_PROMPT.replace("{context}", &context);

        match self
            .complete(system, prompt, self.config.max_tokens, self.config.temperature)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                error!("Error calling assistant API: {}", e);
                format!("Sorry, I encountered an error: {}", e)
            }
        }
    }

    /// Classify `message` into a transaction intent; `unknown` on any failure.
    pub async fn analyze_intent(&self, message: &str) -> TransactionIntent {
        match self
            .complete(
                INTENT_PROMPT.to_string(),
                message,
                self.config.intent_max_tokens,
                self.config.intent_temperature,
            )
            .await
        {
            Ok(text) => TransactionIntent::from_reply(&text),
            Err(e) => {
                error!("Error analyzing transaction intent: {}", e);
                TransactionIntent::unknown()
            }
        }
    }

    async fn complete(
        &self,
        system: String,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> AppResult<String> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| AppError::Assistant("API key is not configured".to_string()))?;

        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens,
            temperature,
            system,
            messages: vec![ApiMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(model = %self.config.model, max_tokens, "Sending assistant request");
        let response = self
            .http
            .post(&self.config.api_url)
            .header("x-api-key", &credentials.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        let body: MessagesResponse = check_status(response)
            .await
            .map_err(|e| AppError::Assistant(e.user_message()))?
            .json()
            .await?;

        match body.content.into_iter().next() {
            Some(ContentBlock::Text { text }) => Ok(text),
            _ => Ok(NO_TEXT_REPLY.to_string()),
        }
    }
}

#[async_trait]
impl Assistant for AssistantClient {
    fn is_available(&self) -> bool {
        self.credentials.is_some()
    }

    async fn respond(&self, message: &str) -> AppResult<AssistantReply> {
        if !self.is_available() {
            return Err(AppError::Assistant(
                "LLM service is not configured".to_string(),
            ));
        }

        let (answer, intent) = futures::join!(self.ask(message, ""), self.analyze_intent(message));
        Ok(AssistantReply { answer, intent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::intent::IntentType;
    use axum::http::{HeaderMap, StatusCode};
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    async fn messages_stub(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "invalid x-api-key"})),
            );
        }

        let system = body["system"].as_str().unwrap_or_default();
        let text = if system.starts_with("You are a transaction parser") {
            "{\"type\": \"transfer\", \"params\": {\"recipient\": \"0xBBB\", \"amount\": \"5\"}}"
                .to_string()
        } else {
            format!("echo: {}", body["messages"][0]["content"].as_str().unwrap_or_default())
        };

        (
            StatusCode::OK,
            Json(json!({"content": [{"type": "text", "text": text}]})),
        )
    }

    async fn spawn_stub() -> String {
        let app = Router::new().route("/v1/messages", post(messages_stub));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1/messages", addr)
    }

    fn client(url: String, key: Option<&str>) -> AssistantClient {
        let config = AssistantConfig {
            api_url: url,
            ..AssistantConfig::default()
        };
        AssistantClient::new(&config, key.map(AssistantCredentials::new)).unwrap()
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = AssistantCredentials::new("sk-secret");
        assert!(!format!("{:?}", creds).contains("sk-secret"));
    }

    #[tokio::test]
    async fn test_respond_answers_and_classifies() {
        let assistant = client(spawn_stub().await, Some("test-key"));
        assert!(assistant.is_available());

        let reply = assistant.respond("send 5 SUI to 0xBBB").await.unwrap();
        assert_eq!(reply.answer, "echo: send 5 SUI to 0xBBB");
        assert_eq!(reply.intent.intent_type, IntentType::Transfer);
        assert_eq!(reply.intent.params["recipient"], "0xBBB");
    }

    #[tokio::test]
    async fn test_rejected_key_yields_apology() {
        let assistant = client(spawn_stub().await, Some("wrong-key"));

        let answer = assistant.ask("hello", "").await;
        assert!(answer.starts_with("Sorry, I encountered an error:"));
        assert!(answer.contains("invalid x-api-key"));
        assert_eq!(
            assistant.analyze_intent("hello").await,
            TransactionIntent::unknown()
        );
    }

    #[tokio::test]
    async fn test_unavailable_without_key() {
        let assistant = client("http://127.0.0.1:9/v1/messages".to_string(), None);
        assert!(!assistant.is_available());
        assert!(matches!(
            assistant.respond("hi").await,
            Err(AppError::Assistant(_))
        ));
    }
}
