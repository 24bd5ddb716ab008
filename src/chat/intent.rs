//! Transaction intents extracted from chat messages, and what to do with them.

use chatwallet_types::{
    Amount, BuildParams, Details, MoveCallParams, NftMintParams, TransactionKind, TransferParams,
};
use serde::Serialize;
use serde_json::Value;

pub const CONNECT_WALLET_PROMPT: &str =
    "It looks like you want to perform a transaction. Please connect your wallet first.";

pub const BUILD_FAILED_PROMPT: &str =
    "Sorry, there was an error building your transaction. Please try again.";

const DEFAULT_NFT_NAME: &str = "Untitled NFT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IntentType {
    Transfer,
    MoveCall,
    NftMint,
    Query,
    Unknown,
}

impl IntentType {
    pub fn parse(s: &str) -> Self {
        match s {
            "transfer" => Self::Transfer,
            "moveCall" => Self::MoveCall,
            "nftMint" => Self::NftMint,
            "query" => Self::Query,
            _ => Self::Unknown,
        }
    }
}

/// What the user asked for, as classified by the assistant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionIntent {
    #[serde(rename = "type")]
    pub intent_type: IntentType,
    pub params: Details,
}

impl TransactionIntent {
    pub fn unknown() -> Self {
        Self {
            intent_type: IntentType::Unknown,
            params: Details::new(),
        }
    }

    /// Parse the first `{...}` span of a model reply. Anything unparseable is `unknown`.
    pub fn from_reply(text: &str) -> Self {
        let Some(json) = extract_json_object(text) else {
            return Self::unknown();
        };
        let Ok(Value::Object(object)) = serde_json::from_str::<Value>(json) else {
            return Self::unknown();
        };

        let intent_type = object
            .get("type")
            .and_then(Value::as_str)
            .map(IntentType::parse)
            .unwrap_or(IntentType::Unknown);
        let params = match object.get("params") {
            Some(Value::Object(params)) => params.clone(),
            _ => Details::new(),
        };

        Self {
            intent_type,
            params,
        }
    }

    fn text(&self, key: &str) -> Option<String> {
        match self.params.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    fn amount(&self) -> Option<Amount> {
        match self.params.get("amount") {
            Some(Value::String(s)) if !s.is_empty() => Some(Amount::Text(s.clone())),
            Some(Value::Number(n)) => n.as_f64().filter(|v| *v != 0.0).map(Amount::Number),
            _ => None,
        }
    }

    fn list(&self, key: &str) -> Vec<Value> {
        match self.params.get(key) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }
}

/// Span from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Next step for a classified intent
#[derive(Debug, Clone, PartialEq)]
pub enum IntentPlan {
    /// Nothing to build (queries and unknown requests)
    Ignore,
    NeedsWallet,
    MissingParams(String),
    Build(BuildParams),
}

/// Decide what to do with `intent` given whether a wallet is connected.
pub fn plan(intent: &TransactionIntent, wallet_connected: bool) -> IntentPlan {
    if matches!(intent.intent_type, IntentType::Query | IntentType::Unknown) {
        return IntentPlan::Ignore;
    }
    if !wallet_connected {
        return IntentPlan::NeedsWallet;
    }

    match intent.intent_type {
        IntentType::Transfer => {
            let recipient = intent.text("recipient");
            let amount = intent.amount();
            match (recipient, amount) {
                (Some(recipient), Some(amount)) => IntentPlan::Build(BuildParams::Transfer(
                    TransferParams {
                        recipient,
                        amount,
                        object_id: intent.text("objectId"),
                    },
                )),
                (recipient, amount) => {
                    let mut message = String::from(
                        "To make a transfer, I need both a recipient address and an amount.",
                    );
                    if recipient.is_none() {
                        message.push_str(" Please provide a recipient address.");
                    }
                    if amount.is_none() {
                        message.push_str(" Please specify an amount to transfer.");
                    }
                    IntentPlan::MissingParams(message)
                }
            }
        }
        IntentType::MoveCall => IntentPlan::Build(BuildParams::MoveCall(MoveCallParams {
            package_object_id: intent.text("packageId").unwrap_or_default(),
            module: intent.text("module").unwrap_or_default(),
            function: intent.text("function").unwrap_or_default(),
            type_arguments: intent
                .list("typeArguments")
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            arguments: intent.list("args"),
            gas_budget: None,
        })),
        IntentType::NftMint => IntentPlan::Build(BuildParams::NftMint(NftMintParams {
            name: intent
                .text("name")
                .unwrap_or_else(|| DEFAULT_NFT_NAME.to_string()),
            description: intent.text("description"),
            url: intent.text("url"),
            properties: None,
        })),
        IntentType::Query | IntentType::Unknown => IntentPlan::Ignore,
    }
}

pub fn confirmation_prompt(kind: TransactionKind) -> String {
    format!(
        "I've prepared a {} transaction. Would you like me to execute it now? Please respond with \"yes\" or \"no\".",
        kind
    )
}
