use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use tablebook_auth::{TokenVerifier, authorize};
use tablebook_core::IdentityError;

use crate::app::errors::identity_error_to_response;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<dyn TokenVerifier>,
}

/// Require a valid bearer token and expose the caller as [`PrincipalContext`].
pub async fn authenticate(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let principal = principal_from_headers(&state, req.headers())?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Like [`authenticate`], additionally requiring the admin role.
pub async fn authenticate_admin(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let principal = principal_from_headers(&state, req.headers())?;

    if let Err(e) = authorize::require_admin(principal.role()) {
        tracing::info!(user_id = %principal.user_id(), role = %principal.role(), error = %e, "admin access denied");
        return Err(identity_error_to_response(e.into()));
    }

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

fn principal_from_headers(
    state: &AuthState,
    headers: &HeaderMap,
) -> Result<PrincipalContext, Response> {
    let token = extract_bearer(headers)
        .ok_or_else(|| identity_error_to_response(IdentityError::Unauthenticated))?;

    let claims = state.tokens.verify_at(token, Utc::now()).map_err(|e| {
        tracing::debug!(error = %e, "bearer token rejected");
        identity_error_to_response(IdentityError::Unauthenticated)
    })?;

    Ok(PrincipalContext::from(claims))
}

/// The token of an `Authorization: Bearer <token>` header.
///
/// The scheme is matched exactly; anything else is treated as absent.
fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
