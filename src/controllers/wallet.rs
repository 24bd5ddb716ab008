use super::notifier::Notifier;
use crate::client::WalletSession;
use crate::wallet::{WalletAdapters, WalletKind};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Observable wallet connection state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalletState {
    pub connected: bool,
    pub connecting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WalletState {
    fn connected(address: String) -> Self {
        Self {
            connected: true,
            connecting: false,
            address: Some(address),
            error: None,
        }
    }
}

/// `0x1234...abcd` form of an address for display.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Drives the session's connect/disconnect and mirrors the outcome into
/// observable [`WalletState`].
pub struct WalletController {
    session: Arc<WalletSession>,
    adapters: WalletAdapters,
    notifier: Arc<Notifier>,
    state: watch::Sender<WalletState>,
}

impl std::fmt::Debug for WalletController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletController")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl WalletController {
    /// Create a controller, picking up an address the session already holds.
    pub fn new(
        session: Arc<WalletSession>,
        adapters: WalletAdapters,
        notifier: Arc<Notifier>,
    ) -> Self {
        let initial = match session.wallet_address() {
            Some(address) => {
                debug!(%address, "Session already connected");
                WalletState::connected(address)
            }
            None => WalletState::default(),
        };
        let (state, _) = watch::channel(initial);

        Self {
            session,
            adapters,
            notifier,
            state,
        }
    }

    pub fn session(&self) -> &Arc<WalletSession> {
        &self.session
    }

    pub fn state(&self) -> WalletState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletState> {
        self.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    /// Connect through the `kind` adapter. Returns the address, or `None`
    /// after notifying the failure.
    pub async fn connect(&self, kind: WalletKind) -> Option<String> {
        self.state.send_modify(|s| {
            s.connecting = true;
            s.error = None;
        });

        match self.session.connect_wallet(self.adapters.get(kind)).await {
            Ok(address) => {
                self.state.send_replace(WalletState::connected(address.clone()));
                self.notifier.success(
                    "Wallet Connected",
                    format!("Connected to address: {}", short_address(&address)),
                );
                Some(address)
            }
            Err(e) => {
                let message = e.user_message();
                self.state.send_replace(WalletState {
                    error: Some(message.clone()),
                    ..WalletState::default()
                });
                self.notifier.error("Connection Failed", message);
                None
            }
        }
    }

    /// Disconnect the attached wallet. Returns whether it succeeded.
    pub async fn disconnect(&self) -> bool {
        match self.session.disconnect_wallet().await {
            Ok(()) => {
                self.state.send_replace(WalletState::default());
                self.notifier
                    .success("Wallet Disconnected", "Successfully disconnected from wallet");
                true
            }
            Err(e) => {
                self.notifier.error("Disconnection Failed", e.user_message());
                false
            }
        }
    }
}
