//! Defines the HTTP routes specifically for authentication.
//!
//! Login is public; logout and `me` require a resolved caller. Caller
//! resolution itself is layered globally in `main`.

use crate::auth::handlers::*;
use crate::auth::middleware::require_caller;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route(
            "/logout",
            post(logout).layer(middleware::from_fn(require_caller)),
        )
        .route("/me", get(me).layer(middleware::from_fn(require_caller)))
}
