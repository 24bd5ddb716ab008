use chatwallet_types::Network;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Wallet session settings. Immutable once the session is constructed.
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default)]
    pub network: Network,
    /// Overrides the public fullnode for `network`
    #[serde(default)]
    pub node_url: Option<String>,
    #[serde(default)]
    pub default_gas_price: Option<String>,
    /// User the pending transaction records are filed under
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// Delay before a pending record is marked completed
    #[serde(default = "default_confirmation_delay_ms")]
    pub confirmation_delay_ms: u64,
}

fn default_user_id() -> i64 {
    1
}

fn default_confirmation_delay_ms() -> u64 {
    2000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            node_url: None,
            default_gas_price: None,
            user_id: default_user_id(),
            confirmation_delay_ms: default_confirmation_delay_ms(),
        }
    }
}

impl SessionConfig {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    /// Node URL in effect: the explicit override, else the network's fullnode.
    pub fn resolved_node_url(&self) -> String {
        self.node_url
            .clone()
            .unwrap_or_else(|| self.network.fullnode_url())
    }
}

/// Transaction builder / record service configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    #[serde(default = "default_services_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_services_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            url: default_services_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Web server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8080
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

/// Market data lookups (price and balance)
#[derive(Debug, Deserialize, Clone)]
pub struct MarketConfig {
    #[serde(default = "default_price_url")]
    pub price_url: String,
    #[serde(default = "default_symbol")]
    pub default_symbol: String,
    #[serde(default = "default_coin_type")]
    pub default_coin_type: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_price_url() -> String {
    "https://api.coingecko.com/api/v3/simple/price".to_string()
}

fn default_symbol() -> String {
    "sui".to_string()
}

fn default_coin_type() -> String {
    "0x2::sui::SUI".to_string()
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            price_url: default_price_url(),
            default_symbol: default_symbol(),
            default_coin_type: default_coin_type(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// LLM assistant settings. The API key is read separately, see
/// [`crate::chat::AssistantCredentials`].
#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_url")]
    pub api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_intent_max_tokens")]
    pub intent_max_tokens: u32,
    #[serde(default = "default_intent_temperature")]
    pub intent_temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_assistant_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_model() -> String {
    "claude-3-7-sonnet-20250219".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

fn default_intent_max_tokens() -> u32 {
    500
}

fn default_intent_temperature() -> f32 {
    0.1
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_url: default_assistant_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            intent_max_tokens: default_intent_max_tokens(),
            intent_temperature: default_intent_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Root application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., CHATWALLET_SESSION__NETWORK, CHATWALLET_WEB__PORT
            .add_source(
                Environment::with_prefix("CHATWALLET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Initialize the global config singleton
    pub fn init() -> Result<&'static Self, ConfigError> {
        let config = Self::load()?;
        Ok(CONFIG.get_or_init(|| config))
    }
}

impl ServicesConfig {
    /// Join the base URL and `path` with exactly one slash.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}
