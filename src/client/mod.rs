//! Session facade and the transport to the remote transaction services.
//!
//! ```text
//!  controller ──► WalletSession ──► WalletAdapter      (sign)
//!                      │
//!                      └──────────► TransactionService (build, record, confirm)
//! ```

pub mod service;
pub mod session;

pub use service::{HttpTransactionService, TransactionService};
pub use session::WalletSession;

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory doubles shared by the session and controller tests.

    use super::TransactionService;
    use crate::error::{AppError, AppResult};
    use crate::wallet::{
        AdapterEventKind, Listener, ListenerRegistry, SignedTransaction, SubscriptionId,
        WalletAdapter,
    };
    use async_trait::async_trait;
    use chatwallet_types::{
        BuildParams, Details, NewTransactionRecord, RecordStatus, StatusUpdate, TransactionDraft,
        TransactionKind, TransactionRecord,
    };
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    pub struct FakeService {
        next_id: AtomicI64,
        build_error: Mutex<Option<String>>,
        record_error: Mutex<Option<String>>,
        record_delay: Mutex<Option<Duration>>,
        created: Mutex<Vec<NewTransactionRecord>>,
        stored: Mutex<Vec<TransactionRecord>>,
        updates: Mutex<Vec<(i64, StatusUpdate)>>,
    }

    impl FakeService {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_builds(&self, message: &str) {
            *self.build_error.lock().unwrap() = Some(message.to_string());
        }

        pub fn fail_records(&self, message: &str) {
            *self.record_error.lock().unwrap() = Some(message.to_string());
        }

        /// Hold every `create_record` call for `delay` before answering.
        pub fn delay_records(&self, delay: Duration) {
            *self.record_delay.lock().unwrap() = Some(delay);
        }

        pub fn draft_for(&self, params: &BuildParams) -> TransactionDraft {
            let value = match params {
                BuildParams::Transfer(p) => serde_json::to_value(p),
                BuildParams::MoveCall(p) => serde_json::to_value(p),
                BuildParams::NftMint(p) => serde_json::to_value(p),
            }
            .unwrap();
            let details = match value {
                serde_json::Value::Object(map) => map,
                _ => Details::new(),
            };
            TransactionDraft {
                tx_bytes: "dGVzdA==".to_string(),
                tx_type: params.kind(),
                details,
            }
        }

        pub fn created_records(&self) -> Vec<NewTransactionRecord> {
            self.created.lock().unwrap().clone()
        }

        pub fn status_updates(&self) -> Vec<(i64, StatusUpdate)> {
            self.updates.lock().unwrap().clone()
        }

        /// Poll until at least `count` status updates arrived, or two seconds pass.
        pub async fn wait_for_updates(&self, count: usize) -> Vec<(i64, StatusUpdate)> {
            for _ in 0..200 {
                let updates = self.status_updates();
                if updates.len() >= count {
                    return updates;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            self.status_updates()
        }
    }

    #[async_trait]
    impl TransactionService for FakeService {
        async fn build(&self, params: &BuildParams) -> AppResult<TransactionDraft> {
            if let Some(message) = self.build_error.lock().unwrap().clone() {
                return Err(AppError::Upstream {
                    status: 400,
                    message,
                });
            }
            Ok(self.draft_for(params))
        }

        async fn aggregate(&self, drafts: &[TransactionDraft]) -> AppResult<TransactionDraft> {
            if let Some(message) = self.build_error.lock().unwrap().clone() {
                return Err(AppError::Upstream {
                    status: 400,
                    message,
                });
            }
            let mut details = Details::new();
            details.insert("count".to_string(), drafts.len().into());
            Ok(TransactionDraft {
                tx_bytes: "YWdncmVnYXRl".to_string(),
                tx_type: TransactionKind::Aggregate,
                details,
            })
        }

        async fn create_record(
            &self,
            record: &NewTransactionRecord,
        ) -> AppResult<TransactionRecord> {
            let delay = *self.record_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(message) = self.record_error.lock().unwrap().clone() {
                return Err(AppError::Upstream {
                    status: 500,
                    message,
                });
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            self.created.lock().unwrap().push(record.clone());
            let stored = TransactionRecord {
                id,
                user_id: Some(record.user_id),
                tx_type: record.tx_type,
                status: RecordStatus::Pending,
                tx_digest: None,
                timestamp: None,
                details: serde_json::Value::Object(record.details.clone()),
            };
            self.stored.lock().unwrap().push(stored.clone());
            Ok(stored)
        }

        async fn update_status(&self, id: i64, update: &StatusUpdate) -> AppResult<()> {
            if let Some(record) = self.stored.lock().unwrap().iter_mut().find(|r| r.id == id) {
                record.status = update.status;
                record.tx_digest = Some(update.tx_digest.clone());
            }
            self.updates.lock().unwrap().push((id, update.clone()));
            Ok(())
        }

        async fn list_user_transactions(&self, user_id: i64) -> AppResult<Vec<TransactionRecord>> {
            Ok(self
                .stored
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.user_id == Some(user_id))
                .cloned()
                .collect())
        }
    }

    /// Adapter that connects but never reports an account.
    #[derive(Debug, Default)]
    pub struct EmptyAdapter {
        listeners: ListenerRegistry,
    }

    #[async_trait]
    impl WalletAdapter for EmptyAdapter {
        fn name(&self) -> &'static str {
            "empty"
        }

        async fn connect(&self) -> AppResult<()> {
            Ok(())
        }

        async fn disconnect(&self) -> AppResult<()> {
            Ok(())
        }

        async fn accounts(&self) -> AppResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn sign_transaction(&self, _draft: &TransactionDraft) -> AppResult<SignedTransaction> {
            Err(AppError::NotConnected)
        }

        fn on(&self, kind: AdapterEventKind, listener: Listener) -> SubscriptionId {
            self.listeners.subscribe(kind, listener)
        }

        fn off(&self, kind: AdapterEventKind, id: SubscriptionId) -> bool {
            self.listeners.unsubscribe(kind, id)
        }
    }

    /// Adapter whose wallet always rejects the connection.
    #[derive(Debug, Default)]
    pub struct RejectingAdapter {
        listeners: ListenerRegistry,
    }

    #[async_trait]
    impl WalletAdapter for RejectingAdapter {
        fn name(&self) -> &'static str {
            "rejecting"
        }

        async fn connect(&self) -> AppResult<()> {
            Err(AppError::Connection("User rejected the request".to_string()))
        }

        async fn disconnect(&self) -> AppResult<()> {
            Ok(())
        }

        async fn accounts(&self) -> AppResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn sign_transaction(&self, _draft: &TransactionDraft) -> AppResult<SignedTransaction> {
            Err(AppError::NotConnected)
        }

        fn on(&self, kind: AdapterEventKind, listener: Listener) -> SubscriptionId {
            self.listeners.subscribe(kind, listener)
        }

        fn off(&self, kind: AdapterEventKind, id: SubscriptionId) -> bool {
            self.listeners.unsubscribe(kind, id)
        }
    }

    /// Adapter that connects with one account but refuses to disconnect.
    #[derive(Debug, Default)]
    pub struct BusyAdapter {
        listeners: ListenerRegistry,
    }

    impl BusyAdapter {
        pub const ADDRESS: &'static str = "0x00000000000000000000000000000000000000b5";
    }

    #[async_trait]
    impl WalletAdapter for BusyAdapter {
        fn name(&self) -> &'static str {
            "busy"
        }

        async fn connect(&self) -> AppResult<()> {
            Ok(())
        }

        async fn disconnect(&self) -> AppResult<()> {
            Err(AppError::Connection("wallet busy".to_string()))
        }

        async fn accounts(&self) -> AppResult<Vec<String>> {
            Ok(vec![Self::ADDRESS.to_string()])
        }

        async fn sign_transaction(&self, draft: &TransactionDraft) -> AppResult<SignedTransaction> {
            Ok(SignedTransaction {
                draft: draft.clone(),
                signed: true,
                signer: Self::ADDRESS.to_string(),
            })
        }

        fn on(&self, kind: AdapterEventKind, listener: Listener) -> SubscriptionId {
            self.listeners.subscribe(kind, listener)
        }

        fn off(&self, kind: AdapterEventKind, id: SubscriptionId) -> bool {
            self.listeners.unsubscribe(kind, id)
        }
    }
}
