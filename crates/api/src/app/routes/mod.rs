use axum::{
    Router,
    routing::{get, post},
};

pub mod admin;
pub mod auth;
pub mod system;

/// Unauthenticated endpoints.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

/// Endpoints for any authenticated principal.
pub fn authenticated_router() -> Router {
    Router::new().route("/whoami", get(system::whoami))
}
