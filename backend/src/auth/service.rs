//! Core business logic for sessions and authentication.
//!
//! The token and the session record are deliberately redundant: the token
//! is stateless and fast to check, the session row is the revocable source
//! of truth. Either one being invalid invalidates the caller.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::auth::models::{Caller, ClientFingerprint, LoginRequest, LoginResponse, UserInfo};
use crate::config::Config;
use crate::database::models::{CreateSession, Session};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::role_repository::RoleRepository;
use crate::repositories::session_repository::SessionRepository;
use crate::repositories::user_repository::UserRepository;
use crate::services::user_service::UserService;
use crate::utils::jwt::JwtUtils;

/// Session manager: creates and refreshes sessions, issues tokens, and
/// resolves inbound tokens back into callers.
pub struct SessionService<'a> {
    pool: &'a SqlitePool,
    jwt_utils: JwtUtils,
    session_ttl_seconds: u64,
}

impl<'a> SessionService<'a> {
    /// Create a new SessionService instance.
    pub fn new(pool: &'a SqlitePool, config: &Config) -> Self {
        SessionService {
            pool,
            jwt_utils: JwtUtils::new(&config.jwt_secret),
            session_ttl_seconds: config.session_ttl_seconds,
        }
    }

    /// Upserts the session for (user, user-agent, ip) and sets
    /// `expires_at = now + session_ttl`. A persistence failure here is a
    /// retryable infrastructure error, not an authentication failure.
    pub async fn create_or_refresh_session(
        &self,
        user_id: &str,
        fingerprint: &ClientFingerprint,
    ) -> ServiceResult<Session> {
        let session = SessionRepository::new(self.pool)
            .upsert_session(CreateSession {
                id: Uuid::now_v7().to_string(),
                user_id: user_id.to_string(),
                user_agent: fingerprint.user_agent.clone(),
                ip: fingerprint.ip.clone(),
                expires_at: Utc::now() + Duration::seconds(self.session_ttl_seconds as i64),
            })
            .await?;

        Ok(session)
    }

    /// Signs a token over the session, user and fingerprint. The token
    /// carries `iat` only; expiry is enforced at resolution time.
    pub fn issue_token(
        &self,
        user_id: &str,
        session_id: &str,
        fingerprint: &ClientFingerprint,
    ) -> ServiceResult<String> {
        self.jwt_utils.generate_token(
            user_id,
            session_id,
            &fingerprint.ip,
            &fingerprint.user_agent,
        )
    }

    /// Resolves a raw token into a caller, or `None`. Never errors: a bad
    /// signature, an orphaned session, an expired session, an over-age
    /// token, a fingerprint mismatch and a deactivated user all resolve to
    /// anonymous.
    pub async fn resolve_caller(&self, raw_token: &str) -> Option<Caller> {
        let claims = self.jwt_utils.validate_token(raw_token)?;

        // First expiry check: token age against the TTL.
        if claims.age_seconds() >= self.session_ttl_seconds as i64 {
            return None;
        }

        let session = SessionRepository::new(self.pool)
            .get_session_by_id(&claims.sid)
            .await
            .ok()??;

        // Second expiry check: the session record is the canonical source.
        if Utc::now() >= session.expires_at {
            return None;
        }

        // The token's fingerprint must match the session it names.
        if session.user_id != claims.sub
            || session.ip != claims.ip
            || session.user_agent != claims.ua
        {
            tracing::warn!(session_id = %session.id, "token fingerprint mismatch");
            return None;
        }

        let user = UserRepository::new(self.pool)
            .get_user_by_id(&claims.sub)
            .await
            .ok()??;
        if !user.is_active {
            return None;
        }

        Some(Caller {
            user,
            session_id: session.id,
            fingerprint: ClientFingerprint {
                user_agent: session.user_agent,
                ip: session.ip,
            },
        })
    }

    /// Authenticates credentials, upserts the session for this client and
    /// returns a freshly signed token.
    pub async fn login(
        &self,
        request: LoginRequest,
        fingerprint: ClientFingerprint,
    ) -> ServiceResult<LoginResponse> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::validation(validation_errors.to_string()));
        }

        let user = UserRepository::new(self.pool)
            .get_user_by_email(&request.email)
            .await?
            .ok_or_else(|| ServiceError::validation("Invalid email or password"))?;

        if !UserService::verify_password(&request.password, &user.password_hash)? {
            return Err(ServiceError::validation("Invalid email or password"));
        }

        if !user.is_active {
            return Err(ServiceError::validation("Account is deactivated"));
        }

        let role = RoleRepository::new(self.pool)
            .get_role_by_id(&user.role_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Role", &user.role_id))?;

        let session = self.create_or_refresh_session(&user.id, &fingerprint).await?;
        let access_token = self.issue_token(&user.id, &session.id, &fingerprint)?;

        Ok(LoginResponse {
            access_token,
            user: UserInfo {
                id: user.id,
                email: user.email,
                role: role.name,
            },
            expires_in: self.session_ttl_seconds,
        })
    }

    /// Destroys the session, invalidating every outstanding token bound to
    /// it.
    pub async fn logout(&self, session_id: &str) -> ServiceResult<()> {
        SessionRepository::new(self.pool)
            .delete_session(session_id)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::{memory_pool, seed_user};

    fn fingerprint() -> ClientFingerprint {
        ClientFingerprint {
            user_agent: "test-agent".to_string(),
            ip: "127.0.0.1".to_string(),
        }
    }

    #[tokio::test]
    async fn issued_token_resolves_to_the_same_user() {
        let pool = memory_pool().await;
        let config = Config::for_tests();
        let (user, _) = seed_user(&pool, "round@example.com", "student", &[]).await;
        let service = SessionService::new(&pool, &config);

        let fp = fingerprint();
        let session = service.create_or_refresh_session(&user.id, &fp).await.unwrap();
        let token = service.issue_token(&user.id, &session.id, &fp).unwrap();

        let caller = service.resolve_caller(&token).await.unwrap();
        assert_eq!(caller.user.id, user.id);
        assert_eq!(caller.session_id, session.id);
        assert_eq!(caller.fingerprint, fp);
    }

    #[tokio::test]
    async fn deleted_session_orphans_the_token() {
        let pool = memory_pool().await;
        let config = Config::for_tests();
        let (user, _) = seed_user(&pool, "orphan@example.com", "student", &[]).await;
        let service = SessionService::new(&pool, &config);

        let fp = fingerprint();
        let session = service.create_or_refresh_session(&user.id, &fp).await.unwrap();
        let token = service.issue_token(&user.id, &session.id, &fp).unwrap();

        service.logout(&session.id).await.unwrap();
        assert!(service.resolve_caller(&token).await.is_none());
    }

    #[tokio::test]
    async fn expired_session_resolves_to_none() {
        let pool = memory_pool().await;
        let config = Config::for_tests();
        let (user, _) = seed_user(&pool, "expired@example.com", "student", &[]).await;
        let service = SessionService::new(&pool, &config);

        let fp = fingerprint();
        let session = service.create_or_refresh_session(&user.id, &fp).await.unwrap();
        let token = service.issue_token(&user.id, &session.id, &fp).unwrap();

        // TTL 900s, checked at t=901: push the session's expiry into the
        // past, as a 901-second-old login would be.
        sqlx::query("UPDATE sessions SET expires_at = ? WHERE id = ?")
            .bind(Utc::now() - Duration::seconds(1))
            .bind(&session.id)
            .execute(&pool)
            .await
            .unwrap();

        assert!(service.resolve_caller(&token).await.is_none());
    }

    #[tokio::test]
    async fn over_age_token_is_rejected_even_with_a_live_session() {
        let pool = memory_pool().await;
        let config = Config::for_tests();
        let (user, _) = seed_user(&pool, "stale@example.com", "student", &[]).await;
        let service = SessionService::new(&pool, &config);

        let fp = fingerprint();
        let session = service.create_or_refresh_session(&user.id, &fp).await.unwrap();

        // Forge a token whose iat is past the TTL; the session itself is
        // untouched. The age check must reject it independently.
        let stale = crate::utils::jwt::Claims {
            sub: user.id.clone(),
            sid: session.id.clone(),
            ip: fp.ip.clone(),
            ua: fp.user_agent.clone(),
            iat: Utc::now().timestamp() - 901,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &stale,
            &jsonwebtoken::EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(service.resolve_caller(&token).await.is_none());
    }

    #[tokio::test]
    async fn deactivated_user_resolves_to_none() {
        let pool = memory_pool().await;
        let config = Config::for_tests();
        let (user, _) = seed_user(&pool, "inactive@example.com", "student", &[]).await;
        let service = SessionService::new(&pool, &config);

        let fp = fingerprint();
        let session = service.create_or_refresh_session(&user.id, &fp).await.unwrap();
        let token = service.issue_token(&user.id, &session.id, &fp).unwrap();

        crate::repositories::user_repository::UserRepository::new(&pool)
            .set_active(&user.id, false)
            .await
            .unwrap();

        assert!(service.resolve_caller(&token).await.is_none());
    }

    #[tokio::test]
    async fn login_verifies_credentials_and_reuses_the_session() {
        let pool = memory_pool().await;
        let config = Config::for_tests();
        seed_user(&pool, "login@example.com", "student", &[]).await;
        let service = SessionService::new(&pool, &config);

        let request = |password: &str| LoginRequest {
            email: "login@example.com".to_string(),
            password: password.to_string(),
        };

        assert!(matches!(
            service.login(request("wrong"), fingerprint()).await,
            Err(ServiceError::Validation { .. })
        ));

        let first = service.login(request("secret"), fingerprint()).await.unwrap();
        assert_eq!(first.user.role, "student");
        assert_eq!(first.expires_in, 900);

        // A second login from the same client refreshes rather than
        // duplicating the session.
        service.login(request("secret"), fingerprint()).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
