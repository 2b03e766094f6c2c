// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! exchanged between forum clients and the account service.
//! Field names follow the JSON wire format (camelCase).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of role names granted to an account
pub type RoleSet = BTreeSet<String>;

/// Public projection of an account. Never carries the password hash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Unique login of the account
    pub login: String,
    /// Display first name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Display last name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Granted roles
    pub roles: RoleSet,
}

/// Payload for registration and profile edits.
///
/// On edit, a field left as `None` keeps its stored value.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Payload for a password change
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    /// The new plaintext password; hashed before it is stored
    pub new_password: String,
}
