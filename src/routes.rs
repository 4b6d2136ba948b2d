//! Route registration
//! Binds the API surface to handlers and applies the auth middleware to
//! protected routes

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{
    auth::middleware::auth_middleware,
    handlers,
    middleware::{request_tracking_middleware, AppState},
};

/// Auth payloads are tiny; anything bigger is not a legitimate request
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/api/register", post(handlers::auth::register))
        .route("/api/login", post(handlers::auth::login));

    // The validator runs before every handler in this group; on an
    // invalid token the handler body never executes
    let protected_routes = Router::new()
        .route("/api/get-user", get(handlers::auth::get_current_user))
        .route("/api/logout", post(handlers::auth::logout))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(from_fn(request_tracking_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
