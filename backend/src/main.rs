//! Main entry point for the CourseGate backend.
//!
//! Initializes tracing, configuration and the database, then wires the
//! Axum router. Storage handles are created once here and injected through
//! request extensions; no module holds ambient global state.

mod api;
mod auth;
mod config;
mod database;
mod errors;
mod gateways;
mod repositories;
mod services;
mod utils;

use crate::api::common::ApiResponse;
use axum::{Extension, Router, middleware, response::Json, routing::get};
use config::Config;
use database::Database;
use tracing::info;
use tracing_subscriber::fmt::init;

#[tokio::main]
async fn main() {
    init();

    let config = Config::from_env().expect("configuration");
    let db = Database::new(&config).await.expect("database");
    let pool = db.pool().clone();

    let app = Router::new()
        .route("/", get(root_handler))
        .nest("/auth", auth::routes::auth_router())
        .nest("/api/payment", api::payment::routes::payment_router())
        .layer(middleware::from_fn(auth::middleware::resolve_caller))
        .layer(Extension(pool))
        .layer(Extension(config.clone()));

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .expect("bind");

    info!("Starting CourseGate server on port {}", config.server_port);
    axum::serve(listener, app).await.expect("serve");
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "CourseGate Backend",
            "version": "0.1.0"
        }),
        "Welcome to the CourseGate API",
    ))
}
