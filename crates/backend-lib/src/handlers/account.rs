// ============================
// forum-backend-lib/src/handlers/account.rs
// ============================
//! HTTP handlers for the account service.
//!
//! | method | path                               | operation       |
//! |--------|------------------------------------|-----------------|
//! | POST   | `/account`                         | register        |
//! | PUT    | `/account`                         | edit profile    |
//! | GET    | `/account/login`                   | login           |
//! | PUT    | `/account/password`                | change password |
//! | DELETE | `/account/user/{login}`            | remove user     |
//! | PUT    | `/account/user/{login}/role/{role}`| add role        |
//! | DELETE | `/account/user/{login}/role/{role}`| remove role     |
use std::sync::Arc;
use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    routing::{delete, get, post, put},
    Json, Router,
};
use forum_common::{PasswordChange, ProfileUpdate, RoleSet, UserProfile};
use tracing::info;
use crate::auth::codec;
use crate::middleware::AuthenticatedLogin;
use crate::storage::AccountStore;
use crate::{AppState, error::AppError};

/// Raw credential token from the `Authorization` header
pub struct CredentialToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for CredentialToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing credential token".to_string()))?;
        let token = header.to_str().map_err(|_| AppError::MalformedToken)?;
        Ok(CredentialToken(token.to_string()))
    }
}

/// Token of a request that passed the gate, together with the login the
/// gate verified. The token must name that same login.
pub struct CallerToken {
    pub caller: AuthenticatedLogin,
    pub token: String,
}

impl<S: Send + Sync> FromRequestParts<S> for CallerToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let caller = AuthenticatedLogin::from_request_parts(parts, state).await?;
        let CredentialToken(token) = CredentialToken::from_request_parts(parts, state).await?;
        if codec::decode(&token)?.login() != caller.as_str() {
            return Err(AppError::Unauthorized(
                "Credential token does not match the authenticated login".to_string(),
            ));
        }
        Ok(CallerToken { caller, token })
    }
}

/// Account routes, to be layered with the authentication gate
pub fn routes<S: AccountStore + 'static>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/account", post(register::<S>).put(edit_profile::<S>))
        .route("/account/login", get(login::<S>))
        .route("/account/password", put(change_password::<S>))
        .route("/account/user/{login}", delete(remove_user::<S>))
        .route(
            "/account/user/{login}/role/{role}",
            put(add_role::<S>).delete(remove_role::<S>),
        )
}

async fn register<S: AccountStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CredentialToken(token): CredentialToken,
    Json(update): Json<ProfileUpdate>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let profile = state.accounts.register(update, &token).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn edit_profile<S: AccountStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CallerToken { caller, token }: CallerToken,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, AppError> {
    info!(%caller, "Edit profile");
    Ok(Json(state.accounts.edit_profile(update, &token).await?))
}

async fn login<S: AccountStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CallerToken { caller, token }: CallerToken,
) -> Result<Json<UserProfile>, AppError> {
    info!(%caller, "Login");
    Ok(Json(state.accounts.login(&token).await?))
}

async fn change_password<S: AccountStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CallerToken { caller, token }: CallerToken,
    Json(change): Json<PasswordChange>,
) -> Result<StatusCode, AppError> {
    info!(%caller, "Change password");
    state
        .accounts
        .change_password(change.new_password, &token)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_user<S: AccountStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CallerToken { caller, token }: CallerToken,
    Path(login): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    info!(%caller, %login, "Remove user");
    Ok(Json(state.accounts.remove_user(&login, &token).await?))
}

async fn add_role<S: AccountStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CallerToken { caller, token }: CallerToken,
    Path((login, role)): Path<(String, String)>,
) -> Result<Json<RoleSet>, AppError> {
    info!(%caller, %login, %role, "Add role");
    Ok(Json(state.accounts.add_role(&login, &role, &token).await?))
}

async fn remove_role<S: AccountStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CallerToken { caller, token }: CallerToken,
    Path((login, role)): Path<(String, String)>,
) -> Result<Json<RoleSet>, AppError> {
    info!(%caller, %login, %role, "Remove role");
    Ok(Json(state.accounts.remove_role(&login, &role, &token).await?))
}
