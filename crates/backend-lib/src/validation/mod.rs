// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Input validation for logins, role names and display names.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::error::AppError;

const MAX_LOGIN_LENGTH: usize = 64;
const MAX_ROLE_LENGTH: usize = 32;
const MAX_NAME_LENGTH: usize = 100;

// Logins double as flat-file names, so no path separators or dots-only names
static LOGIN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_@-][A-Za-z0-9._@-]*$").unwrap());
static ROLE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid login: {0}")]
    InvalidLogin(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a login
pub fn validate_login(login: &str) -> ValidationResult<&str> {
    if login.is_empty() || login.len() > MAX_LOGIN_LENGTH {
        return Err(ValidationError::InvalidLogin(format!(
            "Login must be between 1 and {MAX_LOGIN_LENGTH} characters"
        )));
    }

    if !LOGIN_REGEX.is_match(login) {
        return Err(ValidationError::InvalidLogin(
            "Login may contain only letters, digits, '.', '_', '@' and '-' and must not start with '.'"
                .to_string(),
        ));
    }

    Ok(login)
}

/// Validate a role name
pub fn validate_role(role: &str) -> ValidationResult<&str> {
    if role.is_empty() || role.len() > MAX_ROLE_LENGTH {
        return Err(ValidationError::InvalidRole(format!(
            "Role must be between 1 and {MAX_ROLE_LENGTH} characters"
        )));
    }

    if !ROLE_REGEX.is_match(role) {
        return Err(ValidationError::InvalidRole(
            "Role may contain only letters, digits, '_' and '-'".to_string(),
        ));
    }

    Ok(role)
}

/// Validate an optional display name
pub fn validate_name(name: Option<&str>) -> ValidationResult<()> {
    match name {
        Some(name) if name.chars().count() > MAX_NAME_LENGTH => Err(ValidationError::InvalidName(
            format!("Name cannot exceed {MAX_NAME_LENGTH} characters"),
        )),
        Some(name) if name.chars().any(char::is_control) => Err(ValidationError::InvalidName(
            "Name contains control characters".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Validate a new password. Only emptiness is checked.
pub fn validate_password(password: &str) -> ValidationResult<&str> {
    if password.is_empty() {
        return Err(ValidationError::InvalidPassword(
            "Password must not be empty".to_string(),
        ));
    }
    Ok(password)
}
