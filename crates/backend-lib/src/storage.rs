// ============================
// forum-backend-lib/src/storage.rs
// ============================
//! Account store abstraction with in-memory and flat-file implementations.
use std::{fs, io::ErrorKind, path::{Path, PathBuf}, sync::Arc};
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::fs as tokio_fs;
use crate::account::Account;
use crate::error::AppError;
use crate::validation::validate_login;

/// Key-value store of accounts keyed by login.
///
/// Each call is atomic on its own; read-modify-write sequences are
/// serialized by the account service, not here.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Whether an account with this login exists
    async fn exists(&self, login: &str) -> Result<bool, AppError>;

    /// Fetch an account by login
    async fn get(&self, login: &str) -> Result<Option<Account>, AppError>;

    /// Insert or replace an account
    async fn put(&self, account: &Account) -> Result<(), AppError>;

    /// Remove an account; removing a missing account is a no-op
    async fn delete(&self, account: &Account) -> Result<(), AppError>;
}

#[async_trait]
impl<T: AccountStore + ?Sized> AccountStore for Arc<T> {
    async fn exists(&self, login: &str) -> Result<bool, AppError> {
        (**self).exists(login).await
    }

    async fn get(&self, login: &str) -> Result<Option<Account>, AppError> {
        (**self).get(login).await
    }

    async fn put(&self, account: &Account) -> Result<(), AppError> {
        (**self).put(account).await
    }

    async fn delete(&self, account: &Account) -> Result<(), AppError> {
        (**self).delete(account).await
    }
}

/// In-memory store backed by a concurrent map
#[derive(Clone, Default)]
pub struct MemoryAccountStore {
    accounts: Arc<DashMap<String, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn exists(&self, login: &str) -> Result<bool, AppError> {
        Ok(self.accounts.contains_key(login))
    }

    async fn get(&self, login: &str) -> Result<Option<Account>, AppError> {
        Ok(self.accounts.get(login).map(|entry| entry.value().clone()))
    }

    async fn put(&self, account: &Account) -> Result<(), AppError> {
        self.accounts
            .insert(account.login().to_string(), account.clone());
        Ok(())
    }

    async fn delete(&self, account: &Account) -> Result<(), AppError> {
        self.accounts.remove(account.login());
        Ok(())
    }
}

/// Flat-file store: one JSON document per login under `<root>/accounts/`
#[derive(Clone)]
pub struct FlatFileAccountStore {
    root: PathBuf,
}

impl FlatFileAccountStore {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().join("accounts");
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Path of the account document, or `None` for logins that cannot be file names
    fn account_path(&self, login: &str) -> Option<PathBuf> {
        validate_login(login)
            .ok()
            .map(|login| self.root.join(format!("{login}.json")))
    }
}

#[async_trait]
impl AccountStore for FlatFileAccountStore {
    async fn exists(&self, login: &str) -> Result<bool, AppError> {
        match self.account_path(login) {
            Some(path) => Ok(tokio_fs::try_exists(path).await?),
            None => Ok(false),
        }
    }

    async fn get(&self, login: &str) -> Result<Option<Account>, AppError> {
        let Some(path) = self.account_path(login) else {
            return Ok(None);
        };

        let content = match tokio_fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let account: Account = serde_json::from_str(&content)?;

        Ok(Some(account))
    }

    async fn put(&self, account: &Account) -> Result<(), AppError> {
        let path = self.account_path(account.login()).ok_or_else(|| {
            AppError::InvalidInput(format!("Login cannot be stored: {}", account.login()))
        })?;

        // write-then-rename so readers never observe a partial document
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(account)?;
        tokio_fs::write(&tmp, json).await?;
        tokio_fs::rename(&tmp, &path).await?;

        Ok(())
    }

    async fn delete(&self, account: &Account) -> Result<(), AppError> {
        let Some(path) = self.account_path(account.login()) else {
            return Ok(());
        };

        match tokio_fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
