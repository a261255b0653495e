use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tablebook_core::IdentityError;

/// Map an identity failure to a JSON error response.
///
/// Internal details are logged and replaced with a generic message.
pub fn identity_error_to_response(err: IdentityError) -> axum::response::Response {
    match err {
        IdentityError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        IdentityError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        IdentityError::AlreadyExists => {
            json_error(StatusCode::CONFLICT, "already_exists", "login already taken")
        }
        IdentityError::WrongPassword => invalid_credentials(),
        IdentityError::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "missing or invalid bearer token")
        }
        // The admin gate is the only role check behind this mapping.
        IdentityError::Forbidden => json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "forbidden: admin access required",
        ),
        IdentityError::Internal(detail) => {
            tracing::error!(error = %detail, "request failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal server error",
            )
        }
    }
}

/// Login failures: an unknown login and a wrong password are indistinguishable.
pub fn login_error_to_response(err: IdentityError) -> axum::response::Response {
    match err {
        IdentityError::NotFound | IdentityError::WrongPassword => invalid_credentials(),
        other => identity_error_to_response(other),
    }
}

fn invalid_credentials() -> axum::response::Response {
    json_error(
        StatusCode::UNAUTHORIZED,
        "invalid_credentials",
        "invalid login or password",
    )
}

fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn status_mapping() {
        let cases = [
            (IdentityError::validation("bad"), StatusCode::BAD_REQUEST),
            (IdentityError::NotFound, StatusCode::NOT_FOUND),
            (IdentityError::AlreadyExists, StatusCode::CONFLICT),
            (IdentityError::WrongPassword, StatusCode::UNAUTHORIZED),
            (IdentityError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (IdentityError::Forbidden, StatusCode::FORBIDDEN),
            (IdentityError::internal("db down"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(identity_error_to_response(err).status(), status);
        }
    }

    #[tokio::test]
    async fn internal_detail_is_not_exposed() {
        let res = identity_error_to_response(IdentityError::internal("password=hunter2 host=db"));
        let body = body_json(res).await;
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "internal server error");
    }

    #[tokio::test]
    async fn login_failures_share_one_body() {
        let not_found = login_error_to_response(IdentityError::NotFound);
        let wrong = login_error_to_response(IdentityError::WrongPassword);
        assert_eq!(not_found.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(not_found).await, body_json(wrong).await);
    }
}
