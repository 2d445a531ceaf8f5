//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and
//! retrieved from the database. API-facing request and response shapes live
//! next to their handlers and may differ from these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub mobile: Option<String>,
    pub password_hash: String,
    pub role_id: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(min = 1, message = "User ID is required"))]
    pub id: String,

    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,

    pub mobile: Option<String>,

    #[validate(length(min = 1, message = "Password hash is required"))]
    pub password_hash: String,

    #[validate(length(min = 1, message = "Role ID is required"))]
    pub role_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: String,
    pub name: String,
    /// JSON array of permission strings. Order irrelevant, matching exact.
    pub permissions: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Decodes the stored permission set. A malformed column yields an
    /// empty set, which authorizes nothing.
    pub fn permission_list(&self) -> Vec<String> {
        serde_json::from_str(&self.permissions).unwrap_or_default()
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permission_list().iter().any(|p| p == permission)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRole {
    #[validate(length(min = 1, message = "Role ID is required"))]
    pub id: String,

    #[validate(length(min = 1, max = 255, message = "Name must be between 1-255 characters"))]
    pub name: String,

    pub permissions: Vec<String>,
}

/// Server-side session record. The signed token is stateless; this row is
/// the revocable source of truth for it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub user_agent: String,
    pub ip: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSession {
    #[validate(length(min = 1, message = "Session ID is required"))]
    pub id: String,

    #[validate(length(min = 1, message = "User ID is required"))]
    pub user_id: String,

    pub user_agent: String,
    pub ip: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: String,
    pub provider: String,
    pub api_key: String,
    /// Opaque identifier assigned by the provider. Absent until the
    /// payment request is accepted.
    pub identifier: Option<String>,
    /// Currency-agnostic integer minor units.
    pub amount: i64,
    pub status: TransactionStatus,
    pub product_group: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    AwaitingCallback,
    Verified,
    Failed,
}

impl TransactionStatus {
    /// Terminal transactions never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Verified | TransactionStatus::Failed)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::AwaitingCallback => write!(f, "awaiting_callback"),
            TransactionStatus::Verified => write!(f, "verified"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "awaiting_callback" => Ok(TransactionStatus::AwaitingCallback),
            "verified" => Ok(TransactionStatus::Verified),
            "failed" => Ok(TransactionStatus::Failed),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTransaction {
    #[validate(length(min = 1, message = "Transaction ID is required"))]
    pub id: String,

    #[validate(length(min = 1, message = "Provider is required"))]
    pub provider: String,

    pub api_key: String,

    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount: i64,

    #[validate(length(min = 1, message = "Product group is required"))]
    pub product_group: String,
}
