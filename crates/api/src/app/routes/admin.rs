//! Admin-only account management.
//!
//! Mounted under `/admin` behind the admin middleware.

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use tablebook_core::UserId;

use crate::app::SharedIdentity;
use crate::app::dto::{CreateUserRequest, RegisterResponse, UpdateUserRequest, UserLookupQuery};
use crate::app::errors;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", get(get_user).patch(update_user).delete(delete_user))
}

fn parse_id(raw: &str) -> Result<UserId, axum::response::Response> {
    raw.parse::<UserId>()
        .map_err(errors::identity_error_to_response)
}

/// GET /admin/users - List all users, or `?login=` to look one up
pub async fn list_users(
    Extension(identity): Extension<SharedIdentity>,
    Query(query): Query<UserLookupQuery>,
) -> axum::response::Response {
    if let Some(login) = query.login {
        return match identity.get_user_by_login(&login).await {
            Ok(user) => (StatusCode::OK, Json(user)).into_response(),
            Err(e) => errors::identity_error_to_response(e),
        };
    }

    match identity.list_users().await {
        Ok(users) => (StatusCode::OK, Json(serde_json::json!({ "items": users }))).into_response(),
        Err(e) => errors::identity_error_to_response(e),
    }
}

/// POST /admin/users - Create a user with an explicit role
pub async fn create_user(
    Extension(identity): Extension<SharedIdentity>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<CreateUserRequest>,
) -> axum::response::Response {
    let (req, role) = body.into_parts();
    tracing::info!(actor = %principal.user_id(), login = %req.login, role = %role, "admin create");
    match identity.register_with_role(req, role).await {
        Ok(id) => (StatusCode::CREATED, Json(RegisterResponse { id })).into_response(),
        Err(e) => errors::identity_error_to_response(e),
    }
}

/// GET /admin/users/:id - Get a specific user
pub async fn get_user(
    Extension(identity): Extension<SharedIdentity>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match identity.get_user(id).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::identity_error_to_response(e),
    }
}

/// PATCH /admin/users/:id - Partially update a user
pub async fn update_user(
    Extension(identity): Extension<SharedIdentity>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    tracing::info!(actor = %principal.user_id(), target = %id, "admin update");
    match identity.update_user(id, body.into()).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::identity_error_to_response(e),
    }
}

/// DELETE /admin/users/:id - Remove a user
pub async fn delete_user(
    Extension(identity): Extension<SharedIdentity>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    tracing::info!(actor = %principal.user_id(), target = %id, "admin delete");
    match identity.delete_user(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::identity_error_to_response(e),
    }
}
