//! Authentication request/response models

use serde::{Deserialize, Serialize};

use super::user::UserResponse;

/// Register request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful register/login response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Opaque bearer token; clients present it verbatim on every
    /// protected request
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: u64,
    pub user: UserResponse,
}
