//! User business logic service.
//!
//! Registration and credential checking. Accounts are never hard-deleted;
//! deactivation flips the status flag and existing sessions stop resolving.

use bcrypt::{DEFAULT_COST, hash, verify};
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::database::models::{CreateUser, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::role_repository::RoleRepository;
use crate::repositories::user_repository::UserRepository;

/// Registration payload before hashing.
#[derive(Debug, Clone, Validate)]
pub struct RegisterUser {
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,
    pub mobile: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Role ID is required"))]
    pub role_id: String,
}

pub struct UserService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserService<'a> {
    /// Creates a new UserService instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Registers a user: validates, checks uniqueness, hashes the password
    /// and persists.
    pub async fn create_user(&self, register: RegisterUser) -> ServiceResult<User> {
        if let Err(validation_errors) = register.validate() {
            return Err(ServiceError::validation(validation_errors.to_string()));
        }

        let repo = UserRepository::new(self.pool);
        if repo.email_exists(&register.email).await? {
            return Err(ServiceError::already_exists("User", &register.email));
        }

        if RoleRepository::new(self.pool)
            .get_role_by_id(&register.role_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found("Role", &register.role_id));
        }

        let password_hash = Self::hash_password(&register.password)?;

        let user = repo
            .create_user(CreateUser {
                id: Uuid::now_v7().to_string(),
                email: register.email,
                mobile: register.mobile,
                password_hash,
                role_id: register.role_id,
            })
            .await?;

        Ok(user)
    }

    /// Deactivates a user (the soft-delete of this system) and destroys
    /// their sessions so outstanding tokens stop resolving immediately.
    pub async fn deactivate_user(&self, user_id: &str) -> ServiceResult<()> {
        let repo = UserRepository::new(self.pool);
        if !repo.set_active(user_id, false).await? {
            return Err(ServiceError::not_found("User", user_id));
        }

        crate::repositories::session_repository::SessionRepository::new(self.pool)
            .delete_sessions_for_user(user_id)
            .await?;

        Ok(())
    }

    /// Checks a plain-text password against a stored hash.
    pub fn verify_password(password: &str, password_hash: &str) -> ServiceResult<bool> {
        verify(password, password_hash)
            .map_err(|e| ServiceError::internal_error(format!("Password check failed: {}", e)))
    }

    fn hash_password(password: &str) -> ServiceResult<String> {
        hash(password, DEFAULT_COST)
            .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {}", e)))
    }
}
