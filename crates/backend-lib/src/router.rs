// ============================
// forum-backend-lib/src/router.rs
// ============================
//! HTTP router: account routes behind the authentication gate.
use crate::handlers;
use crate::middleware::authenticate;
use crate::storage::AccountStore;
use crate::AppState;
use axum::{middleware::from_fn_with_state, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the router with the account routes only
pub fn create_router<S: AccountStore + 'static>(state: Arc<AppState<S>>) -> Router {
    create_router_with(state, Router::new())
}

/// Create the router, merging `extra` routes (e.g. the forum) behind the same gate
pub fn create_router_with<S: AccountStore + 'static>(
    state: Arc<AppState<S>>,
    extra: Router<Arc<AppState<S>>>,
) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(handlers::account::routes::<S>())
        .merge(extra)
        .layer(from_fn_with_state(state.clone(), authenticate::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
