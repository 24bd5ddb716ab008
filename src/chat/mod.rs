//! Chat assistant: transcript, LLM client and intent handling.

pub mod assistant;
pub mod intent;
pub mod session;
pub mod transcript;

pub use assistant::{Assistant, AssistantClient, AssistantCredentials, AssistantReply};
pub use intent::{IntentPlan, IntentType, TransactionIntent};
pub use session::ChatSession;
pub use transcript::{ChatMessage, ChatRole, ChatTranscript};
