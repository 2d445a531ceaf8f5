//! Role and permission authorization engine.
//!
//! Evaluates a caller's role and flat permission set against an endpoint's
//! requirements. Authorization never errors: any lookup failure along the
//! way denies access, and callers translate `false` into a rejection.

use sqlx::SqlitePool;

use crate::auth::models::Caller;
use crate::repositories::role_repository::RoleRepository;

/// How a list of required permissions combines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionMode {
    /// Every listed permission must be granted.
    All,
    /// At least one listed permission must be granted.
    Any,
}

/// Authorization engine over the role catalog.
pub struct AccessService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AccessService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Checks the caller against a required role and permission list.
    ///
    /// The role name must match exactly (case-sensitive); a mismatch denies
    /// without looking at permissions. An empty permission list makes the
    /// mode vacuous: the role match alone authorizes. Permission strings
    /// match exactly; there is no wildcard or hierarchy.
    pub async fn authorize(
        &self,
        caller: &Caller,
        required_role: &str,
        required_permissions: &[&str],
        mode: PermissionMode,
    ) -> bool {
        let role = match RoleRepository::new(self.pool)
            .get_role_by_id(&caller.user.role_id)
            .await
        {
            Ok(Some(role)) => role,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(role_id = %caller.user.role_id, error = %e, "role lookup failed");
                return false;
            }
        };

        if role.name != required_role {
            return false;
        }

        if required_permissions.is_empty() {
            return true;
        }

        match mode {
            PermissionMode::All => required_permissions
                .iter()
                .all(|p| role.has_permission(p)),
            PermissionMode::Any => required_permissions
                .iter()
                .any(|p| role.has_permission(p)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{Caller, ClientFingerprint};
    use crate::database::models::User;
    use crate::database::tests::{memory_pool, seed_user};

    fn caller_for(user: User) -> Caller {
        Caller {
            user,
            session_id: "session".to_string(),
            fingerprint: ClientFingerprint {
                user_agent: "test-agent".to_string(),
                ip: "127.0.0.1".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn role_match_alone_authorizes_when_no_permissions_are_listed() {
        let pool = memory_pool().await;
        let (user, _) = seed_user(&pool, "admin@example.com", "admin", &[]).await;
        let access = AccessService::new(&pool);
        let caller = caller_for(user);

        assert!(access.authorize(&caller, "admin", &[], PermissionMode::All).await);
        assert!(access.authorize(&caller, "admin", &[], PermissionMode::Any).await);
        assert!(!access.authorize(&caller, "teacher", &[], PermissionMode::All).await);
        // Case-sensitive match.
        assert!(!access.authorize(&caller, "Admin", &[], PermissionMode::All).await);
    }

    #[tokio::test]
    async fn all_mode_requires_every_listed_permission() {
        let pool = memory_pool().await;
        let (user, _) = seed_user(
            &pool,
            "marketer@example.com",
            "marketer",
            &["discounts.create", "discounts.view"],
        )
        .await;
        let access = AccessService::new(&pool);
        let caller = caller_for(user);

        assert!(
            access
                .authorize(
                    &caller,
                    "marketer",
                    &["discounts.create", "discounts.view"],
                    PermissionMode::All
                )
                .await
        );
        assert!(
            !access
                .authorize(
                    &caller,
                    "marketer",
                    &["discounts.create", "discounts.delete"],
                    PermissionMode::All
                )
                .await
        );
    }

    #[tokio::test]
    async fn any_mode_requires_at_least_one_listed_permission() {
        let pool = memory_pool().await;
        let (user, _) = seed_user(&pool, "t@example.com", "teacher", &["courses.edit"]).await;
        let access = AccessService::new(&pool);
        let caller = caller_for(user);

        assert!(
            access
                .authorize(
                    &caller,
                    "teacher",
                    &["courses.delete", "courses.edit"],
                    PermissionMode::Any
                )
                .await
        );
        assert!(
            !access
                .authorize(
                    &caller,
                    "teacher",
                    &["courses.delete", "courses.publish"],
                    PermissionMode::Any
                )
                .await
        );
    }

    #[tokio::test]
    async fn missing_role_never_grants_access() {
        let pool = memory_pool().await;
        let (mut user, _) = seed_user(&pool, "ghost@example.com", "student", &[]).await;
        user.role_id = "no-such-role".to_string();
        let access = AccessService::new(&pool);
        let caller = caller_for(user);

        assert!(!access.authorize(&caller, "student", &[], PermissionMode::All).await);
    }
}
