//! Data structures for authentication-related entities.
//!
//! Models for the login flow, the resolved caller identity, and the client
//! fingerprint a session is keyed by.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::database::models::User;

/// The (user-agent, ip) tuple a session is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFingerprint {
    pub user_agent: String,
    pub ip: String,
}

/// The resolved identity attached to an authenticated request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: User,
    pub session_id: String,
    pub fingerprint: ClientFingerprint,
}

/// Login request payload
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response containing the session token and user info
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserInfo,
    /// Session lifetime in seconds
    pub expires_in: u64,
}

/// User information returned to clients
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub role: String,
}
