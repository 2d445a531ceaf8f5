//! Middleware for caller resolution and route protection.
//!
//! Every request passes through caller resolution, which attaches an
//! `Option<Caller>` to the request. Routes that need an authenticated user
//! layer `require_caller` on top; admin routes additionally layer a
//! role/permission gate built on the authorization engine.

use axum::{
    extract::{Extension, Request},
    http::{
        HeaderMap, StatusCode,
        header::{AUTHORIZATION, COOKIE, USER_AGENT},
    },
    middleware::Next,
    response::Response,
};
use sqlx::SqlitePool;

use crate::auth::access::{AccessService, PermissionMode};
use crate::auth::models::{Caller, ClientFingerprint};
use crate::auth::service::SessionService;
use crate::config::Config;

/// Cookie carrying the session token when no auth header is present.
const TOKEN_COOKIE: &str = "token";

/// Pulls the raw token out of a request. A dedicated auth header takes
/// priority over the cookie when both are present.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }

    let cookies = headers.get(COOKIE).and_then(|h| h.to_str().ok())?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == TOKEN_COOKIE).then(|| value.to_string())
    })
}

/// Reads the client fingerprint off the request headers.
pub fn client_fingerprint(headers: &HeaderMap) -> ClientFingerprint {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let ip = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .unwrap_or("unknown")
        .trim()
        .to_string();

    ClientFingerprint { user_agent, ip }
}

/// Resolves the caller for every request and stores `Option<Caller>` in the
/// request extensions. Resolution failures of any kind leave the request
/// anonymous; they never reject it here.
pub async fn resolve_caller(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    mut request: Request,
    next: Next,
) -> Response {
    let caller: Option<Caller> = match extract_token(request.headers()) {
        Some(token) => {
            SessionService::new(&pool, &config)
                .resolve_caller(&token)
                .await
        }
        None => None,
    };

    request.extensions_mut().insert(caller);
    next.run(request).await
}

/// Rejects anonymous requests with 401 and re-inserts the caller as a bare
/// `Caller` extension for handlers behind this layer.
pub async fn require_caller(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let caller = request
        .extensions()
        .get::<Option<Caller>>()
        .cloned()
        .flatten()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

/// Gate for the transaction listing: admin role holding the
/// `transactions.view` permission.
pub async fn require_transactions_view(
    Extension(pool): Extension<SqlitePool>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let caller = request
        .extensions()
        .get::<Caller>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let allowed = AccessService::new(&pool)
        .authorize(caller, "admin", &["transactions.view"], PermissionMode::Any)
        .await;
    if !allowed {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn auth_header_takes_priority_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));
        headers.insert(COOKIE, HeaderValue::from_static("token=cookie-token"));

        assert_eq!(extract_token(&headers).as_deref(), Some("header-token"));
    }

    #[test]
    fn cookie_is_used_when_no_header_is_present() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; token=cookie-token; lang=en"),
        );

        assert_eq!(extract_token(&headers).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn missing_token_and_malformed_header_yield_none() {
        assert!(extract_token(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_token(&headers).is_none());
    }

    #[test]
    fn fingerprint_takes_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("test-agent"));
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );

        let fp = client_fingerprint(&headers);
        assert_eq!(fp.user_agent, "test-agent");
        assert_eq!(fp.ip, "203.0.113.7");
    }
}
