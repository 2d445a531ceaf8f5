//! Defines the HTTP routes for the payment API.

use crate::api::payment::handlers::*;
use crate::auth::middleware::{require_caller, require_transactions_view};
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Creates the payment router with all payment-related routes
pub fn payment_router() -> Router {
    Router::new()
        .route(
            "/initiate",
            post(initiate_payment).layer(middleware::from_fn(require_caller)),
        )
        .route("/callback/{provider}", get(payment_callback))
        .route(
            "/transactions",
            get(list_transactions)
                // Layers run outermost-last: caller first, then the gate.
                .layer(middleware::from_fn(require_transactions_view))
                .layer(middleware::from_fn(require_caller)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::middleware::resolve_caller;
    use crate::auth::models::ClientFingerprint;
    use crate::auth::service::SessionService;
    use crate::config::Config;
    use crate::database::tests::{memory_pool, seed_user};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header::AUTHORIZATION};
    use axum::{Extension, middleware};
    use sqlx::SqlitePool;
    use tower::ServiceExt;

    fn app(pool: SqlitePool, config: Config) -> Router {
        Router::new()
            .nest("/api/payment", payment_router())
            .layer(middleware::from_fn(resolve_caller))
            .layer(Extension(pool))
            .layer(Extension(config))
    }

    async fn bearer_for(
        pool: &SqlitePool,
        config: &Config,
        email: &str,
        role: &str,
        permissions: &[&str],
    ) -> String {
        let (user, _) = seed_user(pool, email, role, permissions).await;
        let service = SessionService::new(pool, config);
        let fp = ClientFingerprint {
            user_agent: "tester".to_string(),
            ip: "127.0.0.1".to_string(),
        };
        let session = service.create_or_refresh_session(&user.id, &fp).await.unwrap();
        let token = service.issue_token(&user.id, &session.id, &fp).unwrap();
        format!("Bearer {token}")
    }

    fn list_request(query: &str, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(format!("/api/payment/transactions{query}"));
        if let Some(bearer) = bearer {
            builder = builder.header(AUTHORIZATION, bearer);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn anonymous_transaction_listing_is_unauthorized() {
        let pool = memory_pool().await;
        let app = app(pool, Config::for_tests());

        let response = app.oneshot(list_request("", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_admin_transaction_listing_is_forbidden() {
        let pool = memory_pool().await;
        let config = Config::for_tests();
        let bearer = bearer_for(&pool, &config, "s@example.com", "student", &[]).await;
        let app = app(pool, config);

        let response = app
            .oneshot(list_request("", Some(&bearer)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_without_view_permission_is_forbidden() {
        let pool = memory_pool().await;
        let config = Config::for_tests();
        let bearer = bearer_for(&pool, &config, "a@example.com", "admin", &[]).await;
        let app = app(pool, config);

        let response = app
            .oneshot(list_request("", Some(&bearer)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_listing_succeeds_and_rejects_bad_pagination() {
        let pool = memory_pool().await;
        let config = Config::for_tests();
        let bearer = bearer_for(
            &pool,
            &config,
            "a@example.com",
            "admin",
            &["transactions.view"],
        )
        .await;
        let app = app(pool, config);

        let ok = app
            .clone()
            .oneshot(list_request("", Some(&bearer)))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let bad_page = app
            .clone()
            .oneshot(list_request("?page=0", Some(&bearer)))
            .await
            .unwrap();
        assert_eq!(bad_page.status(), StatusCode::BAD_REQUEST);

        let bad_per_page = app
            .oneshot(list_request("?per_page=0", Some(&bearer)))
            .await
            .unwrap();
        assert_eq!(bad_per_page.status(), StatusCode::BAD_REQUEST);
    }
}
