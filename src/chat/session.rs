use super::assistant::Assistant;
use super::intent::{self, IntentPlan, BUILD_FAILED_PROMPT, CONNECT_WALLET_PROMPT};
use super::transcript::ChatTranscript;
use crate::controllers::{TransactionController, WalletController};
use chatwallet_types::TransactionDraft;
use std::sync::Arc;
use tracing::{debug, warn};

const PROCESSING_FAILED: &str =
    "Sorry, there was an error processing your request. Please try again.";

const DISCARDED: &str = "Okay, I've discarded the prepared transaction.";

/// One chat conversation wired to the assistant and the wallet controllers.
///
/// A built transaction is held as `prepared` until the user answers the
/// confirmation prompt with yes or no.
pub struct ChatSession {
    transcript: ChatTranscript,
    assistant: Arc<dyn Assistant>,
    wallet: Arc<WalletController>,
    transactions: Arc<TransactionController>,
    prepared: Option<TransactionDraft>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("messages", &self.transcript.len())
            .field("prepared", &self.prepared.as_ref().map(|d| d.tx_type))
            .finish_non_exhaustive()
    }
}

enum Confirmation {
    Accept,
    Decline,
}

fn confirmation(input: &str) -> Option<Confirmation> {
    match input.trim().to_lowercase().as_str() {
        "yes" | "y" => Some(Confirmation::Accept),
        "no" | "n" => Some(Confirmation::Decline),
        _ => None,
    }
}

impl ChatSession {
    pub fn new(
        assistant: Arc<dyn Assistant>,
        wallet: Arc<WalletController>,
        transactions: Arc<TransactionController>,
    ) -> Self {
        Self {
            transcript: ChatTranscript::new(),
            assistant,
            wallet,
            transactions,
            prepared: None,
        }
    }

    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    pub fn prepared(&self) -> Option<&TransactionDraft> {
        self.prepared.as_ref()
    }

    /// Handle one line of user input. Blank input is ignored.
    pub async fn submit(&mut self, input: &str) {
        if self.transcript.push_user(input).is_none() {
            return;
        }

        if self.prepared.is_some() {
            match confirmation(input) {
                Some(Confirmation::Accept) => return self.execute_prepared().await,
                Some(Confirmation::Decline) => {
                    self.prepared = None;
                    self.transcript.push_assistant(DISCARDED);
                    return;
                }
                None => {}
            }
        }

        let reply = match self.assistant.respond(input).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Assistant request failed");
                self.transcript.push_system(PROCESSING_FAILED);
                return;
            }
        };
        self.transcript.push_assistant(reply.answer);

        match intent::plan(&reply.intent, self.wallet.is_connected()) {
            IntentPlan::Ignore => {}
            IntentPlan::NeedsWallet => {
                self.transcript.push_system(CONNECT_WALLET_PROMPT);
            }
            IntentPlan::MissingParams(message) => {
                self.transcript.push_system(message);
            }
            IntentPlan::Build(params) => {
                let kind = params.kind();
                debug!(%kind, "Building transaction from chat intent");
                match self.transactions.build_transaction(params).await {
                    Some(draft) => {
                        self.prepared = Some(draft);
                        self.transcript
                            .push_system(intent::confirmation_prompt(kind));
                    }
                    None => {
                        self.transcript.push_system(BUILD_FAILED_PROMPT);
                    }
                }
            }
        }
    }

    async fn execute_prepared(&mut self) {
        let Some(draft) = self.prepared.take() else {
            return;
        };

        match self.transactions.execute_transaction(&draft).await {
            Some(result) if result.is_success() => {
                self.transcript.push_assistant(format!(
                    "Transaction submitted. Transaction ID: {}",
                    result.digest
                ));
            }
            Some(result) => {
                self.transcript.push_system(format!(
                    "Transaction failed: {}",
                    result.error.unwrap_or_else(|| "Unknown error occurred".to_string())
                ));
            }
            None => {
                self.transcript.push_system(CONNECT_WALLET_PROMPT);
            }
        }
    }

    /// Drop the conversation and any prepared transaction.
    pub fn clear(&mut self) {
        self.prepared = None;
        self.transcript.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::assistant::AssistantReply;
    use crate::chat::intent::TransactionIntent;
    use crate::chat::transcript::{ChatRole, CLEARED_MESSAGE};
    use crate::client::testing::FakeService;
    use crate::client::WalletSession;
    use crate::config::SessionConfig;
    use crate::controllers::Notifier;
    use crate::error::{AppError, AppResult};
    use crate::wallet::{WalletAdapters, WalletKind};
    use async_trait::async_trait;
    use chatwallet_types::TransactionKind;
    use serde_json::json;

    struct ScriptedAssistant {
        reply: Option<AssistantReply>,
    }

    #[async_trait]
    impl Assistant for ScriptedAssistant {
        fn is_available(&self) -> bool {
            self.reply.is_some()
        }

        async fn respond(&self, _message: &str) -> AppResult<AssistantReply> {
            self.reply
                .clone()
                .ok_or_else(|| AppError::Assistant("offline".to_string()))
        }
    }

    fn transfer_reply() -> AssistantReply {
        AssistantReply {
            answer: "Sending 5 SUI.".to_string(),
            intent: TransactionIntent::from_reply(
                &json!({"type": "transfer", "params": {"recipient": "0xBBB", "amount": "5"}})
                    .to_string(),
            ),
        }
    }

    struct Fixture {
        service: Arc<FakeService>,
        wallet: Arc<WalletController>,
        chat: ChatSession,
    }

    fn fixture(reply: Option<AssistantReply>) -> Fixture {
        let service = Arc::new(FakeService::new());
        let config = SessionConfig {
            confirmation_delay_ms: 10,
            ..SessionConfig::default()
        };
        let session = Arc::new(WalletSession::new(config, service.clone()));
        let notifier = Arc::new(Notifier::new());
        let wallet = Arc::new(WalletController::new(
            session.clone(),
            WalletAdapters::default(),
            notifier.clone(),
        ));
        let transactions = Arc::new(TransactionController::new(session, notifier, Some(1)));
        let chat = ChatSession::new(
            Arc::new(ScriptedAssistant { reply }),
            wallet.clone(),
            transactions,
        );
        Fixture {
            service,
            wallet,
            chat,
        }
    }

    fn last_content(chat: &ChatSession) -> &str {
        &chat.transcript().last().unwrap().content
    }

    #[tokio::test]
    async fn test_transfer_without_wallet_asks_to_connect() {
        let mut f = fixture(Some(transfer_reply()));

        f.chat.submit("send 5 SUI to 0xBBB").await;
        let messages = f.chat.transcript().messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].role, ChatRole::User);
        assert_eq!(messages[2].role, ChatRole::Assistant);
        assert_eq!(messages[2].content, "Sending 5 SUI.");
        assert_eq!(messages[3].role, ChatRole::System);
        assert_eq!(messages[3].content, CONNECT_WALLET_PROMPT);
        assert!(f.chat.prepared().is_none());
    }

    #[tokio::test]
    async fn test_confirmed_transfer_is_executed() {
        let mut f = fixture(Some(transfer_reply()));
        f.wallet.connect(WalletKind::Sui).await.unwrap();

        f.chat.submit("send 5 SUI to 0xBBB").await;
        assert_eq!(
            f.chat.prepared().map(|d| d.tx_type),
            Some(TransactionKind::Transfer)
        );
        let prompt = f.chat.transcript().last().unwrap();
        assert_eq!(prompt.role, ChatRole::System);
        assert!(prompt.content.starts_with("I've prepared a transfer transaction."));

        f.chat.submit("Yes").await;
        assert!(f.chat.prepared().is_none());
        assert!(last_content(&f.chat).starts_with("Transaction submitted. Transaction ID: "));
        assert_eq!(f.service.created_records().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_params_is_a_system_message() {
        let reply = AssistantReply {
            answer: "Who should receive it?".to_string(),
            intent: TransactionIntent::from_reply(
                &json!({"type": "transfer", "params": {"amount": "5"}}).to_string(),
            ),
        };
        let mut f = fixture(Some(reply));
        f.wallet.connect(WalletKind::Sui).await.unwrap();

        f.chat.submit("send 5 SUI").await;
        let last = f.chat.transcript().last().unwrap();
        assert_eq!(last.role, ChatRole::System);
        assert!(last.content.ends_with("Please provide a recipient address."));
        assert!(f.chat.prepared().is_none());
        assert!(f.service.created_records().is_empty());
    }

    #[tokio::test]
    async fn test_declined_transfer_is_discarded() {
        let mut f = fixture(Some(transfer_reply()));
        f.wallet.connect(WalletKind::Sui).await.unwrap();

        f.chat.submit("send 5 SUI to 0xBBB").await;
        f.chat.submit("no").await;
        assert!(f.chat.prepared().is_none());
        assert_eq!(last_content(&f.chat), DISCARDED);
        assert!(f.service.created_records().is_empty());
    }

    #[tokio::test]
    async fn test_build_failure_and_assistant_failure() {
        let mut f = fixture(Some(transfer_reply()));
        f.wallet.connect(WalletKind::Sui).await.unwrap();
        f.service.fail_builds("recipient is invalid");

        f.chat.submit("send 5 SUI to 0xBBB").await;
        let last = f.chat.transcript().last().unwrap();
        assert_eq!(last.role, ChatRole::System);
        assert_eq!(last.content, BUILD_FAILED_PROMPT);

        let mut offline = fixture(None);
        offline.chat.submit("hello").await;
        assert_eq!(last_content(&offline.chat), PROCESSING_FAILED);
    }

    #[tokio::test]
    async fn test_blank_input_and_clear() {
        let mut f = fixture(Some(transfer_reply()));
        f.chat.submit("   ").await;
        assert_eq!(f.chat.transcript().len(), 1);

        f.wallet.connect(WalletKind::Sui).await.unwrap();
        f.chat.submit("send 5 SUI to 0xBBB").await;
        f.chat.clear();
        assert!(f.chat.prepared().is_none());
        assert_eq!(f.chat.transcript().len(), 1);
        assert_eq!(last_content(&f.chat), CLEARED_MESSAGE);
    }
}
