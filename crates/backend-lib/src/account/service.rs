//! Account lifecycle operations.
//!
//! Every operation decodes the caller's token first. Mutations of one
//! login run under that login's lock, so concurrent role changes and
//! duplicate registrations cannot interleave their read and write.
use chrono::{DateTime, Duration, Utc};
use forum_common::{ProfileUpdate, RoleSet, UserProfile};
use metrics::counter;
use tracing::{debug, info, instrument, warn};

use super::locks::LockTable;
use super::model::Account;
use crate::auth::{codec, hash_password_blocking};
use crate::config::AccountSettings;
use crate::error::AppError;
use crate::storage::AccountStore;
use crate::validation::{validate_login, validate_name, validate_password, validate_role};

/// Registration, profile, role and credential management over an [`AccountStore`]
pub struct AccountService<S> {
    store: S,
    settings: AccountSettings,
    locks: LockTable,
}

impl<S: AccountStore> AccountService<S> {
    pub fn new(store: S, settings: AccountSettings) -> Self {
        Self {
            store,
            settings,
            locks: LockTable::new(),
        }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &AccountSettings {
        &self.settings
    }

    fn expiration_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, AppError> {
        let grace = Duration::try_days(i64::from(self.settings.expiration_days));
        grace
            .and_then(|grace| now.checked_add_signed(grace))
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "expiration of {} days is out of range",
                    self.settings.expiration_days
                ))
            })
    }

    async fn load(&self, login: &str) -> Result<Account, AppError> {
        self.store
            .get(login)
            .await?
            .ok_or_else(|| AppError::NotFound(login.to_string()))
    }

    /// Create an account from the credential carried by the token
    #[instrument(skip_all)]
    pub async fn register(
        &self,
        update: ProfileUpdate,
        token: &str,
    ) -> Result<UserProfile, AppError> {
        let (login, password) = codec::decode(token)?.into_parts();
        validate_login(&login)?;
        validate_name(update.first_name.as_deref())?;
        validate_name(update.last_name.as_deref())?;

        let _lock = self.locks.lock(&login).await;
        if self.store.exists(&login).await? {
            warn!(login = %login, "Registration rejected, login already taken");
            counter!("account.conflict").increment(1);
            return Err(AppError::Conflict(login));
        }

        let expires_at = self.expiration_from(Utc::now())?;
        let password_hash = hash_password_blocking(password).await?;
        let mut account = Account::new(
            login,
            password_hash,
            self.settings.default_role.as_str(),
            expires_at,
        );
        account.first_name = update.first_name;
        account.last_name = update.last_name;
        self.store.put(&account).await?;

        info!(login = %account.login(), expires_at = %account.expires_at(), "Account registered");
        counter!("account.registered").increment(1);
        Ok(account.profile())
    }

    /// Apply the provided profile fields to the caller's own account
    #[instrument(skip_all)]
    pub async fn edit_profile(
        &self,
        update: ProfileUpdate,
        token: &str,
    ) -> Result<UserProfile, AppError> {
        let credential = codec::decode(token)?;
        validate_name(update.first_name.as_deref())?;
        validate_name(update.last_name.as_deref())?;

        let _lock = self.locks.lock(credential.login()).await;
        let mut account = self.load(credential.login()).await?;
        if let Some(first_name) = update.first_name {
            account.first_name = Some(first_name);
        }
        if let Some(last_name) = update.last_name {
            account.last_name = Some(last_name);
        }
        self.store.put(&account).await?;

        info!(login = %account.login(), "Profile updated");
        Ok(account.profile())
    }

    /// Delete an account and return what it looked like
    #[instrument(skip(self, token))]
    pub async fn remove_user(&self, login: &str, token: &str) -> Result<UserProfile, AppError> {
        let actor = codec::decode(token)?;

        let _lock = self.locks.lock(login).await;
        let account = self.load(login).await?;
        self.store.delete(&account).await?;

        info!(actor = %actor.login(), "Account removed");
        counter!("account.removed").increment(1);
        Ok(account.profile())
    }

    /// Grant a role. Granting a role the account already has changes nothing.
    #[instrument(skip(self, token))]
    pub async fn add_role(&self, login: &str, role: &str, token: &str) -> Result<RoleSet, AppError> {
        let actor = codec::decode(token)?;
        validate_role(role)?;

        let _lock = self.locks.lock(login).await;
        let mut account = self.load(login).await?;
        if account.add_role(role) {
            self.store.put(&account).await?;
            info!(actor = %actor.login(), "Role granted");
        } else {
            debug!(actor = %actor.login(), "Role already granted");
        }

        Ok(account.roles().clone())
    }

    /// Revoke a role. Revoking a role the account lacks changes nothing;
    /// revoking the only remaining role fails with [`AppError::LastRole`].
    #[instrument(skip(self, token))]
    pub async fn remove_role(
        &self,
        login: &str,
        role: &str,
        token: &str,
    ) -> Result<RoleSet, AppError> {
        let actor = codec::decode(token)?;
        validate_role(role)?;

        let _lock = self.locks.lock(login).await;
        let mut account = self.load(login).await?;
        if account.roles().contains(role) && account.roles().len() == 1 {
            warn!(actor = %actor.login(), "Refusing to revoke the last role");
            return Err(AppError::LastRole(login.to_string()));
        }

        if account.remove_role(role) {
            self.store.put(&account).await?;
            info!(actor = %actor.login(), "Role revoked");
        } else {
            debug!(actor = %actor.login(), "Role was not granted");
        }

        Ok(account.roles().clone())
    }

    /// Replace the caller's password and restart the expiration grace period
    #[instrument(skip_all)]
    pub async fn change_password(&self, new_password: String, token: &str) -> Result<(), AppError> {
        let credential = codec::decode(token)?;
        validate_password(&new_password)?;

        let _lock = self.locks.lock(credential.login()).await;
        let mut account = self.load(credential.login()).await?;
        let expires_at = self.expiration_from(Utc::now())?;
        let password_hash = hash_password_blocking(new_password).await?;
        account.rotate_password(password_hash, expires_at);
        self.store.put(&account).await?;

        info!(login = %account.login(), expires_at = %account.expires_at(), "Password changed");
        counter!("account.password_changed").increment(1);
        Ok(())
    }

    /// Echo the caller's profile. The password was already checked by the gate.
    #[instrument(skip_all)]
    pub async fn login(&self, token: &str) -> Result<UserProfile, AppError> {
        let credential = codec::decode(token)?;
        let account = self.load(credential.login()).await?;
        debug!(login = %account.login(), "Login confirmed");
        Ok(account.profile())
    }
}
