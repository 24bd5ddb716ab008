//! Market data proxied by the web routes.

pub mod balance;
pub mod price;

pub use balance::BalanceClient;
pub use price::PriceClient;
