use serde::{Deserialize, Serialize};

use tablebook_auth::Role;
use tablebook_core::UserId;
use tablebook_infra::{RegisterUser, UpdateUser};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub login: String,
    pub password: String,
}

impl From<RegisterRequest> for RegisterUser {
    fn from(req: RegisterRequest) -> Self {
        RegisterUser {
            name: req.name,
            login: req.login,
            password: req.password,
        }
    }
}

/// Admin-side account creation; `role` defaults to `user` when absent or blank.
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub login: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl CreateUserRequest {
    pub fn into_parts(self) -> (RegisterUser, Role) {
        let role = Role::from_tag(self.role.as_deref().unwrap_or_default());
        let req = RegisterUser {
            name: self.name,
            login: self.login,
            password: self.password,
        };
        (req, role)
    }
}

#[derive(Deserialize)]
pub struct UserLookupQuery {
    pub login: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl From<UpdateUserRequest> for UpdateUser {
    fn from(req: UpdateUserRequest) -> Self {
        UpdateUser {
            name: req.name,
            login: req.login,
            password: req.password,
            role: req.role,
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: UserId,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}
