//! Persisted account record.
use chrono::{DateTime, Utc};
use forum_common::{RoleSet, UserProfile};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The authoritative identity record, keyed by `login`
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    login: String,
    password_hash: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    roles: RoleSet,
    expires_at: DateTime<Utc>,
}

impl Account {
    /// Build a fresh account holding a single role
    pub fn new(
        login: impl Into<String>,
        password_hash: impl Into<String>,
        default_role: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            login: login.into(),
            password_hash: password_hash.into(),
            first_name: None,
            last_name: None,
            roles: RoleSet::from([default_role.into()]),
            expires_at,
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Replace the stored hash and move expiration to `expires_at`
    pub fn rotate_password(&mut self, password_hash: String, expires_at: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.expires_at = expires_at;
    }

    /// Returns false when the role was already present
    pub fn add_role(&mut self, role: &str) -> bool {
        self.roles.insert(role.to_string())
    }

    /// Returns false when the role was not present
    pub fn remove_role(&mut self, role: &str) -> bool {
        self.roles.remove(role)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Public projection; never includes the hash
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            login: self.login.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            roles: self.roles.clone(),
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("login", &self.login)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("roles", &self.roles)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
