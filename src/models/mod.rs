//! Domain models

pub mod auth;
pub mod user;

pub use auth::{AuthResponse, LoginRequest, RegisterRequest};
pub use user::{NewUser, User, UserResponse};
