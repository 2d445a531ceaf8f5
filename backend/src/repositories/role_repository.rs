//! Database repository for role management operations.
//!
//! Roles carry a flat permission catalog stored as a JSON array. Users hold
//! a weak reference to a role; the role itself is never embedded.

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::models::{CreateRole, Role};

/// Repository for role database operations.
pub struct RoleRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> RoleRepository<'a> {
    /// Creates a new RoleRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new role with its permission set.
    pub async fn create_role(&self, role: CreateRole) -> Result<Role> {
        let now = Utc::now();
        let permissions = serde_json::to_string(&role.permissions)?;
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (id, name, permissions, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, name, permissions, created_at, updated_at
            "#,
        )
        .bind(&role.id)
        .bind(&role.name)
        .bind(&permissions)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(role)
    }

    /// Retrieves a role by its unique identifier.
    ///
    /// # Arguments
    /// * `id` - Role ID (UUID format)
    ///
    /// # Returns
    /// `Some(Role)` if found, `None` otherwise
    pub async fn get_role_by_id(&self, id: &str) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, permissions, created_at, updated_at FROM roles WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(role)
    }

    /// Retrieves a role by its exact name.
    ///
    /// # Arguments
    /// * `name` - Exact role name to search for
    ///
    /// # Returns
    /// `Some(Role)` if found, `None` otherwise
    pub async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, permissions, created_at, updated_at FROM roles WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(role)
    }
}
