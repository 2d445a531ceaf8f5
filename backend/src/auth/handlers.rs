//! Handler functions for authentication-related API endpoints.
//!
//! Thin HTTP shims over `auth::service`: parse the request, hand off to the
//! session service, map errors through the shared response format.

use axum::{
    extract::{Extension, Json},
    http::{HeaderMap, StatusCode},
    response::Json as ResponseJson,
};
use sqlx::SqlitePool;

use crate::api::common::{ApiResponse, service_error_to_http};
use crate::auth::middleware::client_fingerprint;
use crate::auth::models::{Caller, LoginRequest, LoginResponse, UserInfo};
use crate::auth::service::SessionService;
use crate::config::Config;

/// Handle user login request
#[axum::debug_handler]
pub async fn login(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<LoginResponse>, (StatusCode, String)> {
    let fingerprint = client_fingerprint(&headers);
    let service = SessionService::new(&pool, &config);

    match service.login(payload, fingerprint).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle logout: destroys the caller's session record, which invalidates
/// every token bound to it.
#[axum::debug_handler]
pub async fn logout(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Extension(caller): Extension<Caller>,
) -> Result<ResponseJson<ApiResponse<serde_json::Value>>, (StatusCode, String)> {
    let service = SessionService::new(&pool, &config);

    match service.logout(&caller.session_id).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::success(
            serde_json::json!({ "logged_out": true }),
            "Logged out successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Get current user information from the resolved caller
#[axum::debug_handler]
pub async fn me(
    Extension(pool): Extension<SqlitePool>,
    Extension(caller): Extension<Caller>,
) -> Result<ResponseJson<ApiResponse<UserInfo>>, (StatusCode, String)> {
    let role = crate::repositories::role_repository::RoleRepository::new(&pool)
        .get_role_by_id(&caller.user.role_id)
        .await
        .map_err(|e| service_error_to_http(e.into()))?;

    let info = UserInfo {
        id: caller.user.id,
        email: caller.user.email,
        role: role.map(|r| r.name).unwrap_or_default(),
    };

    Ok(ResponseJson(ApiResponse::ok(info)))
}
