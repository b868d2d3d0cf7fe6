//! Contains all the routes that this application can handle.

mod subscribe;

pub use subscribe::subscribe;

use crate::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{any, get},
    Router,
};
use tower_cookies::CookieManagerLayer;

/// Hard cap on what axum buffers before the guard's own size check runs.
pub const OUTER_BODY_LIMIT: usize = 16 * 1024;

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// All the routes of the server
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes(app_state))
        .route("/health-check", get(health_check))
}

/// API - Routes nested under "/api" path
/// Every method reaches the guard, it answers pre-flight and 405 itself.
fn api_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/subscribe", any(subscribe))
        .layer(DefaultBodyLimit::max(OUTER_BODY_LIMIT))
        .layer(CookieManagerLayer::new())
        .with_state(app_state)
}
