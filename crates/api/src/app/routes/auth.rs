//! Registration and login.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::SharedIdentity;
use crate::app::dto::{LoginRequest, RegisterRequest, RegisterResponse, TokenResponse};
use crate::app::errors;

/// POST /auth/register
pub async fn register(
    Extension(identity): Extension<SharedIdentity>,
    Json(body): Json<RegisterRequest>,
) -> axum::response::Response {
    match identity.register(body.into()).await {
        Ok(id) => (StatusCode::CREATED, Json(RegisterResponse { id })).into_response(),
        Err(e) => errors::identity_error_to_response(e),
    }
}

/// POST /auth/login
pub async fn login(
    Extension(identity): Extension<SharedIdentity>,
    Json(body): Json<LoginRequest>,
) -> axum::response::Response {
    match identity.login(&body.login, &body.password).await {
        Ok(token) => (
            StatusCode::OK,
            Json(TokenResponse {
                token,
                token_type: "Bearer",
                expires_in: identity.tokens().ttl().num_seconds(),
            }),
        )
            .into_response(),
        Err(e) => errors::login_error_to_response(e),
    }
}
