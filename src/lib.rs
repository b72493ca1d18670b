//! Book Club server
//!
//! A REST JSON API for a peer-to-peer book lending club: members list the
//! books they own, and other members queue up to rent them.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod ledger;
pub mod models;
pub mod repository;
pub mod runtime;
pub mod server;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
