//! Authentication HTTP handlers

use crate::{auth::middleware::AuthContext, error::AppError, middleware::AppState};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// Register a new user; responds with a token and the identity summary
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<crate::models::RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.register(req).await?;
    Ok(Json(response))
}

/// Verify credentials and respond with a fresh token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<crate::models::LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(req).await?;
    Ok(Json(response))
}

/// Identity summary for the presented token. The middleware already
/// validated the token; NotFound only happens if the identity vanished
/// after issuance.
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.current_user(auth_context.user_id).await?;
    Ok(Json(user))
}

/// Revoke the presented token's session
pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.logout(auth_context.jti);

    tracing::info!(user_id = %auth_context.user_id, "User logged out");

    Ok(Json(json!({"message": "Logged out"})))
}
