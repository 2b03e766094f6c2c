use std::fmt;
use std::sync::Arc;
use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, Method, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use metrics::counter;
use tracing::{debug, warn};
use crate::auth::{codec, verify_password_blocking};
use crate::storage::AccountStore;
use crate::{AppState, error::AppError};

const ACCOUNT_PREFIX: &str = "/account";
const FORUM_PREFIX: &str = "/forum";
const PUBLIC_FORUM_PREFIX: &str = "/forum/posts";
const PASSWORD_PATH: &str = "/account/password";

/// Login verified by the gate, attached to the request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedLogin(pub String);

impl AuthenticatedLogin {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthenticatedLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedLogin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Absent only when a handler is mounted outside the gate
        parts
            .extensions
            .get::<AuthenticatedLogin>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))
    }
}

/// Whether a request must pass the gate.
///
/// `/account` routes are protected except registration (`POST`);
/// `/forum` routes are protected except the public `/forum/posts` tree.
pub fn requires_authentication(method: &Method, path: &str) -> bool {
    let account = path.starts_with(ACCOUNT_PREFIX) && method != Method::POST;
    let forum = path.starts_with(FORUM_PREFIX) && !path.starts_with(PUBLIC_FORUM_PREFIX);
    account || forum
}

fn is_password_change(method: &Method, path: &str) -> bool {
    method == Method::PUT && path == PASSWORD_PATH
}

fn reject(reason: &'static str, err: AppError) -> AppError {
    counter!("gate.rejected", "reason" => reason).increment(1);
    err
}

/// Authentication gate.
///
/// Single pass, fail closed: any rejection ends the request here.
/// One store lookup and one hash verification per protected request.
pub async fn authenticate<S: AccountStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if !requires_authentication(&method, &path) {
        return Ok(next.run(request).await);
    }

    let Some(header) = request.headers().get(AUTHORIZATION) else {
        warn!(%method, %path, "Rejected: missing credential token");
        return Err(reject("missing_token", AppError::Unauthorized("Unauthorized".to_string())));
    };

    let credential = match header.to_str().map_err(|_| AppError::MalformedToken).and_then(codec::decode) {
        Ok(credential) => credential,
        Err(_) => {
            warn!(%method, %path, "Rejected: malformed credential token");
            return Err(reject("malformed_token", AppError::Unauthorized("Unauthorized".to_string())));
        },
    };

    let Some(account) = state.accounts.store().get(credential.login()).await? else {
        warn!(%method, %path, login = %credential.login(), "Rejected: unknown account");
        return Err(reject("unknown_account", AppError::Unauthorized("User not found".to_string())));
    };

    let verified = verify_password_blocking(
        account.password_hash().to_string(),
        credential.password().to_string(),
    )
    .await;
    if !verified {
        warn!(%method, %path, login = %account.login(), "Rejected: wrong password");
        return Err(reject("wrong_password", AppError::Forbidden("Wrong password".to_string())));
    }

    if state.settings.account.enforce_expiration
        && account.is_expired(Utc::now())
        && !is_password_change(&method, &path)
    {
        warn!(%method, %path, login = %account.login(), "Rejected: credentials expired");
        return Err(reject("expired", AppError::CredentialsExpired));
    }

    debug!(%method, %path, login = %account.login(), "Authenticated");
    counter!("gate.allowed").increment(1);
    request
        .extensions_mut()
        .insert(AuthenticatedLogin(account.login().to_string()));

    Ok(next.run(request).await)
}
