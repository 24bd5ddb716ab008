use crate::client::service::TransactionService;
use crate::config::SessionConfig;
use crate::error::{AppError, AppResult};
use crate::wallet::{random_hex_id, WalletAdapter};
use chatwallet_types::{
    BuildParams, MoveCallParams, Network, NewTransactionRecord, NftMintParams, RecordStatus,
    StatusUpdate, TransactionDraft, TransactionRecord, TransactionResult, TransferParams,
};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const DETACHED_BEFORE_CONFIRMATION: &str =
    "Wallet disconnected before the transaction was confirmed";

/// The adapter currently attached and its active account.
struct Attached {
    adapter: Arc<dyn WalletAdapter>,
    address: String,
    /// Changes whenever a different adapter is attached
    epoch: u64,
}

/// Wallet session facade.
///
/// Holds at most one attached adapter, delegates building and recording to a
/// [`TransactionService`] and signing to the adapter. Constructed once by the
/// application root and shared by reference.
pub struct WalletSession {
    config: SessionConfig,
    service: Arc<dyn TransactionService>,
    attached: RwLock<Option<Attached>>,
    next_epoch: AtomicU64,
    /// Serializes connect and disconnect so they settle in call order
    lifecycle: Mutex<()>,
    /// Pending confirmation tasks keyed by record id
    confirmations: Arc<DashMap<i64, JoinHandle<()>>>,
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("network", &self.config.network)
            .field("address", &self.wallet_address())
            .field("pending_confirmations", &self.pending_confirmations())
            .finish_non_exhaustive()
    }
}

impl WalletSession {
    pub fn new(config: SessionConfig, service: Arc<dyn TransactionService>) -> Self {
        Self {
            config,
            service,
            attached: RwLock::new(None),
            next_epoch: AtomicU64::new(1),
            lifecycle: Mutex::new(()),
            confirmations: Arc::new(DashMap::new()),
        }
    }

    pub fn network(&self) -> Network {
        self.config.network
    }

    pub fn node_url(&self) -> String {
        self.config.resolved_node_url()
    }

    pub fn default_gas_price(&self) -> Option<&str> {
        self.config.default_gas_price.as_deref()
    }

    pub fn user_id(&self) -> i64 {
        self.config.user_id
    }

    /// Active account of the attached adapter, if any.
    pub fn wallet_address(&self) -> Option<String> {
        self.attached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|a| a.address.clone())
    }

    pub fn is_connected(&self) -> bool {
        self.wallet_address().is_some()
    }

    fn current_adapter(&self) -> Option<Arc<dyn WalletAdapter>> {
        self.current_attachment().map(|(adapter, _)| adapter)
    }

    fn current_attachment(&self) -> Option<(Arc<dyn WalletAdapter>, u64)> {
        self.attached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|a| (Arc::clone(&a.adapter), a.epoch))
    }

    fn current_epoch(&self) -> Option<u64> {
        self.current_attachment().map(|(_, epoch)| epoch)
    }

    fn replace_attached(&self, next: Option<Attached>) -> Option<Attached> {
        let mut guard = self.attached.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }

    /// Connect `adapter` and attach it, returning its active account.
    ///
    /// A different adapter that is already attached gets disconnected first,
    /// and its pending confirmations are cancelled.
    pub async fn connect_wallet(&self, adapter: Arc<dyn WalletAdapter>) -> AppResult<String> {
        let _lifecycle = self.lifecycle.lock().await;

        let mut epoch = None;
        if let Some((previous, previous_epoch)) = self.current_attachment() {
            if Arc::ptr_eq(&previous, &adapter) {
                epoch = Some(previous_epoch);
            } else {
                info!(
                    previous = previous.name(),
                    next = adapter.name(),
                    "Replacing attached wallet"
                );
                self.cancel_confirmations();
                self.replace_attached(None);
                if let Err(e) = previous.disconnect().await {
                    warn!(adapter = previous.name(), error = %e, "Previous wallet failed to disconnect");
                }
            }
        }

        adapter.connect().await.map_err(|e| match e {
            AppError::Connection(_) => e,
            other => AppError::Connection(other.to_string()),
        })?;

        let accounts = adapter.accounts().await?;
        let Some(address) = accounts.into_iter().next() else {
            warn!(adapter = adapter.name(), "Wallet connected without accounts");
            self.replace_attached(None);
            return Err(AppError::NoAccounts);
        };

        info!(
            adapter = adapter.name(),
            network = %self.config.network,
            %address,
            "Wallet attached"
        );
        let epoch = epoch.unwrap_or_else(|| self.next_epoch.fetch_add(1, Ordering::SeqCst));
        self.replace_attached(Some(Attached {
            adapter,
            address: address.clone(),
            epoch,
        }));

        Ok(address)
    }

    /// Disconnect and detach the attached adapter.
    ///
    /// The adapter stays attached, with its confirmations running, if its
    /// disconnect fails.
    pub async fn disconnect_wallet(&self) -> AppResult<()> {
        let _lifecycle = self.lifecycle.lock().await;

        let adapter = self.current_adapter().ok_or(AppError::NotConnected)?;
        adapter.disconnect().await?;

        self.replace_attached(None);
        self.cancel_confirmations();
        info!(adapter = adapter.name(), "Wallet detached");
        Ok(())
    }

    pub async fn build_transaction(&self, params: &BuildParams) -> AppResult<TransactionDraft> {
        self.service.build(params).await.map_err(|e| {
            warn!(kind = %params.kind(), error = %e, "Transaction build failed");
            AppError::build(e.user_message())
        })
    }

    pub async fn build_transfer_transaction(
        &self,
        params: TransferParams,
    ) -> AppResult<TransactionDraft> {
        self.build_transaction(&BuildParams::Transfer(params)).await
    }

    pub async fn build_move_call_transaction(
        &self,
        params: MoveCallParams,
    ) -> AppResult<TransactionDraft> {
        self.build_transaction(&BuildParams::MoveCall(params)).await
    }

    pub async fn build_nft_mint_transaction(
        &self,
        params: NftMintParams,
    ) -> AppResult<TransactionDraft> {
        self.build_transaction(&BuildParams::NftMint(params)).await
    }

    /// Combine drafts into one. Callers reject an empty slice beforehand.
    pub async fn aggregate_transactions(
        &self,
        drafts: &[TransactionDraft],
    ) -> AppResult<TransactionDraft> {
        self.service.aggregate(drafts).await.map_err(|e| {
            warn!(count = drafts.len(), error = %e, "Transaction aggregation failed");
            AppError::build(e.user_message())
        })
    }

    /// Sign `draft` with the attached adapter and record it as pending.
    ///
    /// Never fails: errors come back as a `failure` result. A `success`
    /// result carries the pending record id as a provisional digest; the
    /// record is marked completed later by a background task that is
    /// cancelled if the wallet disconnects first.
    pub async fn sign_and_execute_transaction(&self, draft: &TransactionDraft) -> TransactionResult {
        let Some((adapter, epoch)) = self.current_attachment() else {
            return TransactionResult::failure(AppError::NotConnected.to_string());
        };

        match self.execute(adapter.as_ref(), epoch, draft).await {
            Ok(result) => result,
            Err(e) => {
                error!("Error executing transaction: {}", e);
                TransactionResult::failure(e.user_message())
            }
        }
    }

    async fn execute(
        &self,
        adapter: &dyn WalletAdapter,
        epoch: u64,
        draft: &TransactionDraft,
    ) -> AppResult<TransactionResult> {
        let signed = adapter
            .sign_transaction(draft)
            .await
            .map_err(|e| AppError::execution(e.user_message()))?;
        debug!(signer = %signed.signer, kind = %draft.tx_type, "Transaction signed");

        let record = NewTransactionRecord {
            user_id: self.config.user_id,
            tx_type: draft.tx_type,
            status: RecordStatus::Pending,
            details: draft.details.clone(),
        };
        let stored = self
            .service
            .create_record(&record)
            .await
            .map_err(|e| AppError::execution(e.user_message()))?;

        // Disconnect detaches under this lock
        let _lifecycle = self.lifecycle.lock().await;
        if self.current_epoch() != Some(epoch) {
            warn!(record_id = stored.id, "Wallet detached while recording, confirmation skipped");
            return Err(AppError::execution(DETACHED_BEFORE_CONFIRMATION));
        }
        self.schedule_confirmation(stored.id);

        Ok(TransactionResult::success(
            stored.id.to_string(),
            chrono::Utc::now().timestamp_millis(),
        ))
    }

    fn schedule_confirmation(&self, record_id: i64) {
        let service = Arc::clone(&self.service);
        let confirmations = Arc::clone(&self.confirmations);
        let delay = Duration::from_millis(self.config.confirmation_delay_ms);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let update = StatusUpdate {
                status: RecordStatus::Completed,
                tx_digest: random_hex_id(),
            };
            match service.update_status(record_id, &update).await {
                Ok(()) => info!(record_id, digest = %update.tx_digest, "Transaction confirmed"),
                Err(e) => error!(record_id, error = %e, "Failed to confirm transaction"),
            }
            confirmations.remove(&record_id);
        });

        // Drop handles of tasks that finished before they were stored
        self.confirmations.retain(|_, h| !h.is_finished());
        self.confirmations.insert(record_id, handle);
    }

    /// Number of confirmation tasks still waiting to run.
    pub fn pending_confirmations(&self) -> usize {
        self.confirmations
            .iter()
            .filter(|entry| !entry.value().is_finished())
            .count()
    }

    /// Abort every pending confirmation. Returns how many were still running.
    pub fn cancel_confirmations(&self) -> usize {
        let ids: Vec<i64> = self.confirmations.iter().map(|entry| *entry.key()).collect();
        let mut cancelled = 0;
        for id in ids {
            if let Some((_, handle)) = self.confirmations.remove(&id) {
                if !handle.is_finished() {
                    cancelled += 1;
                }
                handle.abort();
            }
        }
        if cancelled > 0 {
            info!(cancelled, "Cancelled pending confirmations");
        }
        cancelled
    }

    /// Stored records for `user_id`.
    pub async fn list_transactions(&self, user_id: i64) -> AppResult<Vec<TransactionRecord>> {
        self.service.list_user_transactions(user_id).await
    }
}

impl Drop for WalletSession {
    fn drop(&mut self) {
        for entry in self.confirmations.iter() {
            entry.value().abort();
        }
    }
}
