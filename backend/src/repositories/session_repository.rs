//! Database repository for session records.
//!
//! A session is keyed by its (user, user-agent, ip) fingerprint: creating a
//! session for a tuple that already has one refreshes its expiry instead of
//! inserting a duplicate row. The upsert is a single statement, so
//! concurrent logins from the same client cannot race into two rows.

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::models::{CreateSession, Session};

/// Repository for session database operations.
pub struct SessionRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> SessionRepository<'a> {
    /// Creates a new SessionRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a session, or refreshes the expiry of the existing one for
    /// the same (user, user-agent, ip) tuple.
    ///
    /// # Returns
    /// The live Session row. For a refresh, the original id and issued_at
    /// are kept.
    pub async fn upsert_session(&self, session: CreateSession) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, user_agent, ip, issued_at, expires_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, user_agent, ip)
            DO UPDATE SET expires_at = excluded.expires_at
            RETURNING id, user_id, user_agent, ip, issued_at, expires_at
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(&session.user_agent)
        .bind(&session.ip)
        .bind(Utc::now())
        .bind(session.expires_at)
        .fetch_one(self.pool)
        .await?;

        Ok(session)
    }

    /// Retrieves a session by its unique identifier.
    ///
    /// # Returns
    /// `Some(Session)` if the row exists, `None` otherwise. Expiry is not
    /// checked here; callers compare `expires_at` themselves.
    pub async fn get_session_by_id(&self, id: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, user_id, user_agent, ip, issued_at, expires_at FROM sessions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(session)
    }

    /// Deletes a session, invalidating every token bound to it.
    pub async fn delete_session(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Deletes all sessions belonging to a user.
    pub async fn delete_sessions_for_user(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
