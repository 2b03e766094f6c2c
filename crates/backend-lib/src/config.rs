// ============================
// forum-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::validation::validate_role;

/// Default config file looked up next to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Environment variable prefix; nested keys use `__`, e.g. `FORUM_ACCOUNT__EXPIRATION_DAYS`
pub const ENV_PREFIX: &str = "FORUM_";

/// Upper bound for `account.expiration_days` (roughly a century)
pub const MAX_EXPIRATION_DAYS: u32 = 36_500;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Directory for the flat-file account store; in-memory when unset
    pub data_dir: Option<PathBuf>,
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Emit JSON log lines instead of the human format
    pub log_json: bool,
    /// Account lifecycle settings
    pub account: AccountSettings,
}

/// Account lifecycle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSettings {
    /// Grace period in days added to "now" on registration and password change
    pub expiration_days: u32,
    /// Role granted to every new account
    pub default_role: String,
    /// Reject authentication for accounts past their expiration date
    pub enforce_expiration: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 3000)),
            data_dir: None,
            log_level: "info".to_string(),
            log_json: false,
            account: AccountSettings::default(),
        }
    }
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            expiration_days: 60,
            default_role: "User".to_string(),
            enforce_expiration: false,
        }
    }
}

impl Settings {
    /// Load settings from `config.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from the given TOML file and the environment.
    ///
    /// A missing file is not an error; defaults and env vars still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Settings = Self::figment(path.as_ref()).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Reject settings the account service cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.account.expiration_days == 0 {
            bail!("account.expiration_days must be greater than zero");
        }
        if self.account.expiration_days > MAX_EXPIRATION_DAYS {
            bail!("account.expiration_days must not exceed {MAX_EXPIRATION_DAYS}");
        }
        if self.account.default_role.trim().is_empty() {
            bail!("account.default_role must not be empty");
        }
        // Same rules as role grants and revocations
        validate_role(&self.account.default_role)
            .with_context(|| format!("account.default_role {:?}", self.account.default_role))?;
        Ok(())
    }
}

#[cfg(test)]
mod config_tests;
