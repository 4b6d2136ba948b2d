//! Authentication facade: register, login, current user, logout

use crate::{
    auth::{jwt::JwtService, password::PasswordHasher, session::SessionRegistry},
    config::AppConfig,
    error::AppError,
    models::{AuthResponse, LoginRequest, NewUser, RegisterRequest, UserResponse},
    store::UserStore,
};
use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use uuid::Uuid;

/// Lowercase alphanumeric start, then `a-z 0-9 _ . -`, 3 to 32 total
static HANDLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_.-]{2,31}$").expect("Invalid handle regex"));

pub struct AuthService {
    store: Arc<dyn UserStore>,
    jwt_service: Arc<JwtService>,
    sessions: Arc<SessionRegistry>,
    hasher: PasswordHasher,
    config: Arc<AppConfig>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        jwt_service: Arc<JwtService>,
        sessions: Arc<SessionRegistry>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            jwt_service,
            sessions,
            hasher: PasswordHasher::new(),
            config,
        }
    }

    /// Register a new identity and log it in
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, AppError> {
        let username = normalize_handle(&req.username);
        validate_handle(&username)?;

        PasswordHasher::validate_policy(&req.password, &self.config.security)?;

        let password_hash = self.hasher.hash(&req.password)?;

        // The store serializes on handle uniqueness; a concurrent
        // duplicate loses with HandleTaken
        let user = self.store.insert(NewUser::new(username, password_hash)).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        self.issue_session(user.id, &user.username, UserResponse::from(user.clone()))
    }

    /// Verify credentials and issue a fresh token
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AppError> {
        let username = normalize_handle(&req.username);

        let user = match self.store.find_by_username(&username).await? {
            Some(user) => user,
            None => {
                // Burn the same hashing work as a real verification so
                // an unknown handle is indistinguishable from a wrong
                // password, in error and in timing
                self.hasher.verify_dummy(&req.password);
                tracing::debug!(username = %username, "Login for unknown handle");
                return Err(AppError::InvalidCredentials);
            }
        };

        self.hasher.verify(&req.password, &user.password_hash)?;

        tracing::info!(user_id = %user.id, username = %user.username, "User logged in");

        self.issue_session(user.id, &user.username, UserResponse::from(user.clone()))
    }

    /// Identity summary for a validated request context
    pub async fn current_user(&self, user_id: Uuid) -> Result<UserResponse, AppError> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user"))?;

        Ok(UserResponse::from(user))
    }

    /// Revoke the session behind a validated token. Always succeeds for
    /// a request that passed the middleware; re-logout of an already
    /// dead session is a no-op.
    pub fn logout(&self, jti: Uuid) {
        self.sessions.revoke(jti);
    }

    /// Mint a token and record its session
    fn issue_session(
        &self,
        user_id: Uuid,
        username: &str,
        user: UserResponse,
    ) -> Result<AuthResponse, AppError> {
        let issued = self.jwt_service.issue(user_id, username)?;

        let expires_at = DateTime::from_timestamp(issued.claims.exp, 0)
            .ok_or_else(|| AppError::internal("Token expiry out of range"))?;
        self.sessions.register(issued.claims.jti, user_id, expires_at);

        Ok(AuthResponse {
            access_token: issued.token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.ttl_secs(),
            user,
        })
    }
}

/// Handles are case-insensitive; the lowercase form is canonical
pub fn normalize_handle(handle: &str) -> String {
    handle.trim().to_lowercase()
}

fn validate_handle(handle: &str) -> Result<(), AppError> {
    if !HANDLE_RE.is_match(handle) {
        return Err(AppError::WeakCredential(
            "Username must be 3-32 characters: lowercase letters, digits, '_', '.' or '-', \
             starting with a letter or digit"
                .to_string(),
        ));
    }
    Ok(())
}
