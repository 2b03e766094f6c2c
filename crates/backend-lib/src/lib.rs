// ============================
// forum-backend-lib/src/lib.rs
// ============================
//! Account authentication and lifecycle core for the forum server.

pub mod account;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod storage;
pub mod validation;

use std::sync::Arc;
use crate::account::AccountService;
use crate::config::Settings;
use crate::storage::{AccountStore, FlatFileAccountStore, MemoryAccountStore};

/// Application state shared across all handlers
pub struct AppState<S> {
    /// Account lifecycle service, owning the store
    pub accounts: Arc<AccountService<S>>,
    /// Settings manager
    pub settings: Arc<Settings>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            accounts: self.accounts.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<S: AccountStore> AppState<S> {
    /// Create a new application state
    pub fn new(storage: S, config: &Settings) -> anyhow::Result<Self> {
        config.validate()?;
        let accounts = Arc::new(AccountService::new(storage, config.account.clone()));
        let settings = Arc::new(config.clone());

        Ok(Self { accounts, settings })
    }
}

impl AppState<Arc<dyn AccountStore>> {
    /// Create a state whose store is picked by the settings:
    /// flat files under `data_dir` when set, memory otherwise
    pub fn from_settings(config: &Settings) -> anyhow::Result<Self> {
        let storage: Arc<dyn AccountStore> = match &config.data_dir {
            Some(dir) => Arc::new(FlatFileAccountStore::new(dir)?),
            None => Arc::new(MemoryAccountStore::new()),
        };
        Self::new(storage, config)
    }
}
