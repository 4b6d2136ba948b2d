//! Token validation middleware
//! Runs before every protected handler; on failure the handler never executes

use crate::{error::AppError, middleware::AppState};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// Per-request authenticated context, attached to request extensions by
/// the middleware and discarded when the request ends
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub username: String,
    /// jti of the presented token, needed for logout
    pub jti: Uuid,
}

// FromRequestParts lets handlers take AuthContext as an argument, which
// keeps the acting identity explicit instead of re-reading extensions
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Extract the bearer token from the Authorization header. A missing or
/// malformed header is an ordinary `Unauthorized`, never a panic.
pub fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .ok_or(AppError::Unauthorized)
}

/// Token validation middleware for protected routes.
///
/// Each step is a distinct failure cause collapsed into one externally
/// visible `Unauthorized`:
/// 1. bearer token present
/// 2. signature and expiry verified
/// 3. jti known to the session registry and not revoked
/// 4. subject parses as a user id
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers())?;

    let claims = state.jwt_service.decode(&token)?;

    if !state.sessions.is_valid(claims.jti) {
        tracing::debug!(jti = %claims.jti, "Token session revoked or unknown");
        return Err(AppError::Unauthorized);
    }

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        tracing::debug!(sub = %claims.sub, "Token subject is not a valid user id");
        AppError::Unauthorized
    })?;

    req.extensions_mut().insert(AuthContext {
        user_id,
        username: claims.username,
        jti: claims.jti,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_valid() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer test_token_123".parse().unwrap());

        let token = extract_token(&headers).unwrap();
        assert_eq!(token, "test_token_123");
    }

    #[test]
    fn test_extract_token_missing() {
        let headers = HeaderMap::new();
        assert!(extract_token(&headers).is_err());
    }

    #[test]
    fn test_extract_token_invalid_format() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "InvalidFormat".parse().unwrap());

        assert!(extract_token(&headers).is_err());
    }

    #[test]
    fn test_extract_token_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Basic dXNlcjpwYXNz".parse().unwrap());

        assert!(extract_token(&headers).is_err());
    }
}
