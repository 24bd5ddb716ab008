use super::notifier::Notifier;
use crate::client::WalletSession;
use chatwallet_types::{BuildParams, TransactionDraft, TransactionRecord, TransactionResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

/// Busy flag that stays raised while any guarded call is in flight.
#[derive(Debug, Default)]
struct BusyFlag(AtomicUsize);

impl BusyFlag {
    fn enter(&self) -> BusyGuard<'_> {
        self.0.fetch_add(1, Ordering::SeqCst);
        BusyGuard(self)
    }

    fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }
}

struct BusyGuard<'a>(&'a BusyFlag);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0 .0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Wraps session build/execute/aggregate calls with busy flags and
/// notifications. Failures are notified and surface as `None`.
pub struct TransactionController {
    session: Arc<WalletSession>,
    notifier: Arc<Notifier>,
    user_id: Option<i64>,
    building: BusyFlag,
    executing: BusyFlag,
    transactions: RwLock<Vec<TransactionRecord>>,
}

impl std::fmt::Debug for TransactionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionController")
            .field("user_id", &self.user_id)
            .field("building_tx", &self.building_tx())
            .field("executing_tx", &self.executing_tx())
            .finish_non_exhaustive()
    }
}

impl TransactionController {
    /// `user_id` enables the transaction history; without it the history stays empty.
    pub fn new(session: Arc<WalletSession>, notifier: Arc<Notifier>, user_id: Option<i64>) -> Self {
        Self {
            session,
            notifier,
            user_id,
            building: BusyFlag::default(),
            executing: BusyFlag::default(),
            transactions: RwLock::new(Vec::new()),
        }
    }

    pub fn building_tx(&self) -> bool {
        self.building.is_set()
    }

    pub fn executing_tx(&self) -> bool {
        self.executing.is_set()
    }

    pub async fn build_transaction(&self, params: BuildParams) -> Option<TransactionDraft> {
        let _busy = self.building.enter();

        match self.session.build_transaction(&params).await {
            Ok(draft) => Some(draft),
            Err(e) => {
                self.notifier
                    .error("Transaction Build Failed", e.user_message());
                None
            }
        }
    }

    /// Sign and submit `draft`. `None` means nothing was submitted because no
    /// wallet is connected; a failed submission still returns its result.
    pub async fn execute_transaction(&self, draft: &TransactionDraft) -> Option<TransactionResult> {
        if self.session.wallet_address().is_none() {
            self.notifier.error(
                "No Wallet Connected",
                "Please connect a wallet to execute transactions",
            );
            return None;
        }

        let _busy = self.executing.enter();
        let result = self.session.sign_and_execute_transaction(draft).await;

        if result.is_success() {
            let short_id: String = result.digest.chars().take(8).collect();
            self.notifier.success(
                "Transaction Submitted",
                format!("Transaction ID: {}...", short_id),
            );
            self.refresh_transactions().await;
        } else {
            self.notifier.error(
                "Transaction Failed",
                result
                    .error
                    .clone()
                    .unwrap_or_else(|| "Unknown error occurred".to_string()),
            );
        }

        Some(result)
    }

    pub async fn aggregate_transactions(
        &self,
        drafts: &[TransactionDraft],
    ) -> Option<TransactionDraft> {
        if drafts.is_empty() {
            self.notifier.error(
                "No Transactions",
                "Need at least one transaction to aggregate",
            );
            return None;
        }

        let _busy = self.building.enter();

        match self.session.aggregate_transactions(drafts).await {
            Ok(draft) => Some(draft),
            Err(e) => {
                self.notifier
                    .error("Transaction Aggregation Failed", e.user_message());
                None
            }
        }
    }

    /// Last fetched history for the configured user.
    pub async fn transactions(&self) -> Vec<TransactionRecord> {
        self.transactions.read().await.clone()
    }

    /// Re-fetch the history. A failed fetch keeps the previous list.
    pub async fn refresh_transactions(&self) -> Vec<TransactionRecord> {
        let Some(user_id) = self.user_id else {
            return Vec::new();
        };

        match self.session.list_transactions(user_id).await {
            Ok(records) => {
                *self.transactions.write().await = records.clone();
                records
            }
            Err(e) => {
                warn!(user_id, error = %e, "Failed to load transaction history");
                self.transactions().await
            }
        }
    }
}
