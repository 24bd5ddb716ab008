//! Wallet adapters.
//!
//! An adapter represents one connectable signing identity. Every variant
//! exposes the same capability set through [`WalletAdapter`]: connect,
//! disconnect, account listing, signing and typed event subscription.
//!
//! Signing is simulated: the signed form is the draft plus the signer
//! address and a `signed` flag.

pub mod events;
pub mod extension;
pub mod relay;

pub use events::{AdapterEvent, AdapterEventKind, Listener, ListenerRegistry, SubscriptionId};
pub use extension::SuiExtensionAdapter;
pub use relay::WalletConnectAdapter;

use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chatwallet_types::TransactionDraft;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Which adapter variant to connect through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    /// Browser-extension wallet
    #[default]
    Sui,
    /// Relay session through WalletConnect
    WalletConnect,
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sui => f.write_str("sui"),
            Self::WalletConnect => f.write_str("walletconnect"),
        }
    }
}

/// Draft as returned by an adapter after signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(flatten)]
    pub draft: TransactionDraft,
    pub signed: bool,
    pub signer: String,
}

/// Capability contract shared by every adapter variant.
#[async_trait]
pub trait WalletAdapter: Send + Sync + fmt::Debug {
    /// Short variant name used in logs.
    fn name(&self) -> &'static str;

    /// Connect; a no-op when already connected.
    async fn connect(&self) -> AppResult<()>;

    /// Disconnect; a no-op (and no event) when already disconnected.
    async fn disconnect(&self) -> AppResult<()>;

    /// Current accounts, index 0 being the active one.
    async fn accounts(&self) -> AppResult<Vec<String>>;

    async fn sign_transaction(&self, draft: &TransactionDraft) -> AppResult<SignedTransaction>;

    /// Register a listener, delivered after all earlier registrations.
    fn on(&self, kind: AdapterEventKind, listener: Listener) -> SubscriptionId;

    /// Remove a listener. Unknown handles are ignored; returns whether one was removed.
    fn off(&self, kind: AdapterEventKind, id: SubscriptionId) -> bool;
}

/// Random `0x`-prefixed identifier with 40 hex digits, the shape of a
/// mock account address or transaction digest.
pub fn random_hex_id() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("0x{}", hex)
}

#[derive(Debug, Default)]
struct AccountState {
    connected: bool,
    accounts: Vec<String>,
}

/// Connection flag, account list and listeners backing the mock adapters.
#[derive(Debug, Default)]
pub(crate) struct MockAccounts {
    state: RwLock<AccountState>,
    listeners: ListenerRegistry,
}

impl MockAccounts {
    pub(crate) async fn connect(&self, name: &str) -> AppResult<()> {
        let address = {
            let mut state = self.state.write().await;
            if state.connected {
                debug!(adapter = name, "Already connected");
                return Ok(());
            }
            let address = random_hex_id();
            state.connected = true;
            state.accounts = vec![address.clone()];
            address
        };

        info!(adapter = name, %address, "Wallet adapter connected");
        self.listeners.emit(&AdapterEvent::Connected { address });
        Ok(())
    }

    pub(crate) async fn disconnect(&self, name: &str) -> AppResult<()> {
        {
            let mut state = self.state.write().await;
            if !state.connected {
                debug!(adapter = name, "Already disconnected");
                return Ok(());
            }
            state.connected = false;
            state.accounts.clear();
        }

        info!(adapter = name, "Wallet adapter disconnected");
        self.listeners.emit(&AdapterEvent::Disconnected);
        Ok(())
    }

    pub(crate) async fn accounts(&self) -> Vec<String> {
        self.state.read().await.accounts.clone()
    }

    pub(crate) async fn sign(&self, draft: &TransactionDraft) -> AppResult<SignedTransaction> {
        let signer = self
            .state
            .read()
            .await
            .accounts
            .first()
            .cloned()
            .ok_or(AppError::NotConnected)?;

        Ok(SignedTransaction {
            draft: draft.clone(),
            signed: true,
            signer,
        })
    }

    pub(crate) fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }
}

/// The adapters available to a wallet controller, one per [`WalletKind`].
#[derive(Debug, Clone)]
pub struct WalletAdapters {
    pub sui: Arc<dyn WalletAdapter>,
    pub wallet_connect: Arc<dyn WalletAdapter>,
}

impl WalletAdapters {
    pub fn new(sui: Arc<dyn WalletAdapter>, wallet_connect: Arc<dyn WalletAdapter>) -> Self {
        Self {
            sui,
            wallet_connect,
        }
    }

    pub fn get(&self, kind: WalletKind) -> Arc<dyn WalletAdapter> {
        match kind {
            WalletKind::Sui => Arc::clone(&self.sui),
            WalletKind::WalletConnect => Arc::clone(&self.wallet_connect),
        }
    }
}

impl Default for WalletAdapters {
    fn default() -> Self {
        Self::new(
            Arc::new(SuiExtensionAdapter::new()),
            Arc::new(WalletConnectAdapter::default()),
        )
    }
}
