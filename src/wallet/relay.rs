//! WalletConnect relay adapter (simulated).

use super::{
    AdapterEventKind, Listener, MockAccounts, SignedTransaction, SubscriptionId, WalletAdapter,
};
use crate::error::AppResult;
use async_trait::async_trait;
use chatwallet_types::TransactionDraft;
use tracing::debug;

const DEFAULT_RELAY_URL: &str = "wss://relay.walletconnect.com";

#[derive(Debug)]
pub struct WalletConnectAdapter {
    relay_url: String,
    inner: MockAccounts,
}

impl WalletConnectAdapter {
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            relay_url: relay_url.into(),
            inner: MockAccounts::default(),
        }
    }

    pub fn relay_url(&self) -> &str {
        &self.relay_url
    }
}

impl Default for WalletConnectAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_RELAY_URL)
    }
}

#[async_trait]
impl WalletAdapter for WalletConnectAdapter {
    fn name(&self) -> &'static str {
        "walletconnect"
    }

    async fn connect(&self) -> AppResult<()> {
        debug!(relay = %self.relay_url, "Opening relay session");
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
