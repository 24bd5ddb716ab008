pub mod chat;
pub mod client;
pub mod config;
pub mod controllers;
pub mod error;
pub mod market;
pub mod wallet;
pub mod web;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
