// ============================
// forum-backend-lib/src/auth/codec.rs
// ============================
//! Credential token codec.
//!
//! A token is `Basic <base64(login:password)>`. It is reversible, not
//! signed: whoever holds it holds the password, so the gate always
//! re-verifies the decoded password against the stored hash.
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use zeroize::Zeroize;

use crate::error::AppError;

/// Authorization scheme prefix
pub const SCHEME: &str = "Basic";

const SEPARATOR: char = ':';

/// A decoded `(login, password)` pair. Never persisted.
pub struct Credential {
    login: String,
    password: String,
}

impl Credential {
    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Split into owned parts, leaving the password for the caller to zeroize
    pub fn into_parts(mut self) -> (String, String) {
        (
            std::mem::take(&mut self.login),
            std::mem::take(&mut self.password),
        )
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

/// Decode a token into a credential.
///
/// Accepts the value with or without the `Basic` scheme. Fails with
/// `MalformedToken` on bad base64, non-UTF-8 payloads, a missing
/// separator, or an empty login or password. The payload splits at the
/// first `:` so passwords may contain colons.
pub fn decode(token: &str) -> Result<Credential, AppError> {
    let token = token.trim();
    let payload = match token.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case(SCHEME) => rest.trim(),
        Some(_) => return Err(AppError::MalformedToken),
        None => token,
    };

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| AppError::MalformedToken)?;
    let mut text = String::from_utf8(bytes).map_err(|_| AppError::MalformedToken)?;

    let credential = match text.split_once(SEPARATOR) {
        Some((login, password)) if !login.is_empty() && !password.is_empty() => Ok(Credential {
            login: login.to_string(),
            password: password.to_string(),
        }),
        _ => Err(AppError::MalformedToken),
    };
    text.zeroize();
    credential
}

/// Encode a login/password pair into a `Basic` token
pub fn encode(login: &str, password: &str) -> String {
    let mut raw = format!("{login}{SEPARATOR}{password}");
    let token = format!("{SCHEME} {}", STANDARD.encode(raw.as_bytes()));
    raw.zeroize();
    token
}
