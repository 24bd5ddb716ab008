//! Browser-extension wallet adapter (simulated).

use super::{
    AdapterEventKind, Listener, MockAccounts, SignedTransaction, SubscriptionId, WalletAdapter,
};
use crate::error::AppResult;
use async_trait::async_trait;
use chatwallet_types::TransactionDraft;

#[derive(Debug, Default)]
pub struct SuiExtensionAdapter {
    inner: MockAccounts,
}

impl SuiExtensionAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletAdapter for SuiExtensionAdapter {
    fn name(&self) -> &'static str {
        "sui-extension"
    }

    async fn connect(&self) -> AppResult<()> {
        self.inner.connect(self.name()).await
    }

    async fn disconnect(&self) -> AppResult<()> {
        self.inner.disconnect(self.name()).await
    }

    async fn accounts(&self) -> AppResult<Vec<String>> {
        Ok(self.inner.accounts().await)
    }

    async fn sign_transaction(&self, draft: &TransactionDraft) -> AppResult<SignedTransaction> {
        self.inner.sign(draft).await
    }

    fn on(&self, kind: AdapterEventKind, listener: Listener) -> SubscriptionId {
        self.inner.listeners().subscribe(kind, listener)
    }

    fn off(&self, kind: AdapterEventKind, id: SubscriptionId) -> bool {
        self.inner.listeners().unsubscribe(kind, id)
    }
}
