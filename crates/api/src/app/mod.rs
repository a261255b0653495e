//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};

use tablebook_auth::TokenService;
use tablebook_infra::{IdentityService, UserStore};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Identity service over whichever store backend was selected at startup.
pub type SharedIdentity = Arc<IdentityService<Arc<dyn UserStore>>>;

#[derive(Clone)]
pub struct AppState {
    pub identity: SharedIdentity,
    pub tokens: Arc<TokenService>,
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(state: AppState) -> Router {
    let auth_state = middleware::AuthState {
        tokens: state.tokens,
    };

    let authenticated = routes::authenticated_router().route_layer(axum::middleware::from_fn_with_state(
        auth_state.clone(),
        middleware::authenticate,
    ));

    let admin = routes::admin::router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::authenticate_admin,
    ));

    Router::new()
        .merge(routes::public_router())
        .merge(authenticated)
        .nest("/admin", admin)
        .layer(Extension(state.identity))
}
