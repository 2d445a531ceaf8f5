//! Handler functions for payment API endpoints.

use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::Json as ResponseJson,
};
use sqlx::SqlitePool;
use std::collections::HashMap;
use validator::Validate;

use crate::api::common::{ApiResponse, PaginationFilter, PaginationMeta, service_error_to_http};
use crate::api::payment::models::{
    CallbackResponse, InitiatePaymentRequest, InitiatePaymentResponse,
};
use crate::auth::models::Caller;
use crate::config::Config;
use crate::database::models::Transaction;
use crate::errors::ServiceError;
use crate::services::payment_service::PaymentService;

/// Starts a payment and returns the provider redirect target.
#[axum::debug_handler]
pub async fn initiate_payment(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<InitiatePaymentRequest>,
) -> Result<ResponseJson<ApiResponse<InitiatePaymentResponse>>, (StatusCode, String)> {
    tracing::info!(
        user_id = %caller.user.id,
        provider = %payload.provider,
        product_group = %payload.product_group,
        "payment initiation requested"
    );

    let service = PaymentService::new(&pool, &config);
    match service.initiate_payment(payload).await {
        Ok(response) => Ok(ResponseJson(ApiResponse::ok(response))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Receives the provider's callback. Public: callers are the provider and
/// the returning payer; trust comes from transaction lookup and
/// server-to-server verification, not from authentication.
#[axum::debug_handler]
pub async fn payment_callback(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Path(provider): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ResponseJson<ApiResponse<CallbackResponse>>, (StatusCode, String)> {
    let service = PaymentService::new(&pool, &config);
    match service.handle_callback(&provider, &params).await {
        Ok(response) => Ok(ResponseJson(ApiResponse::ok(response))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Admin listing of transactions, newest first.
#[axum::debug_handler]
pub async fn list_transactions(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Query(pagination): Query<PaginationFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Transaction>>>, (StatusCode, String)> {
    if let Err(validation_errors) = pagination.validate() {
        return Err(service_error_to_http(ServiceError::validation(
            validation_errors.to_string(),
        )));
    }

    let service = PaymentService::new(&pool, &config);
    match service.list_transactions(&pagination).await {
        Ok((items, total)) => {
            let meta = PaginationMeta::from_filter(&pagination, total);
            Ok(ResponseJson(ApiResponse::paginated(items, meta)))
        }
        Err(error) => Err(service_error_to_http(error)),
    }
}
