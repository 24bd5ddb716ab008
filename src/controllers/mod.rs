//! UI-facing controllers over the wallet session.
//!
//! Controllers own observable state and never let a session fault escape:
//! failures become [`Notification`]s plus an absent return value.

pub mod notifier;
pub mod transactions;
pub mod wallet;

pub use notifier::{Notification, NotificationVariant, Notifier};
pub use transactions::TransactionController;
pub use wallet::{short_address, WalletController, WalletState};
