//! Module for database connection setup and common utilities.
//!
//! Responsible for initializing the SQLite connection pool and applying the
//! embedded migrations before the server starts accepting requests.

use crate::config::Config;
use anyhow::Result;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::time::Duration;

pub mod models;

pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    /// Initializes the database connection pool and runs migrations.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!().run(&pool).await?;

        Ok(Database { pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Database {
            pool: self.pool.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::models::{CreateRole, CreateUser, Role, User};
    use crate::repositories::role_repository::RoleRepository;
    use crate::repositories::user_repository::UserRepository;
    use uuid::Uuid;

    /// Single-connection in-memory pool with migrations applied. One
    /// connection only: each new SQLite `:memory:` connection is a fresh,
    /// empty database.
    pub(crate) async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::migrate!().run(&pool).await.expect("migrations");
        pool
    }

    /// Inserts a role with the given permissions and a user holding it.
    pub(crate) async fn seed_user(
        pool: &SqlitePool,
        email: &str,
        role_name: &str,
        permissions: &[&str],
    ) -> (User, Role) {
        let role_repo = RoleRepository::new(pool);
        let role = match role_repo.get_role_by_name(role_name).await.unwrap() {
            Some(role) => role,
            None => role_repo
                .create_role(CreateRole {
                    id: Uuid::now_v7().to_string(),
                    name: role_name.to_string(),
                    permissions: permissions.iter().map(|p| p.to_string()).collect(),
                })
                .await
                .unwrap(),
        };

        // Low bcrypt cost keeps the test suite fast.
        let password_hash = bcrypt::hash("secret", 4).unwrap();
        let user = UserRepository::new(pool)
            .create_user(CreateUser {
                id: Uuid::now_v7().to_string(),
                email: email.to_string(),
                mobile: None,
                password_hash,
                role_id: role.id.clone(),
            })
            .await
            .unwrap();

        (user, role)
    }
}
