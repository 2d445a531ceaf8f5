//! Request and response shapes for the payment endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::database::models::TransactionStatus;

/// Payment initiation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InitiatePaymentRequest {
    #[validate(length(min = 1, message = "Provider is required"))]
    pub provider: String,

    /// Integer minor units.
    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount: i64,

    #[validate(length(min = 1, message = "Callback URL is required"))]
    pub callback_url: String,

    #[validate(length(min = 1, max = 255, message = "Description must be 1-255 characters"))]
    pub description: String,

    /// Tag grouping what this payment is for, e.g. "wallet-charge" or
    /// "course".
    #[validate(length(min = 1, message = "Product group is required"))]
    pub product_group: String,

    pub mobile: Option<String>,
}

/// Payment initiation response: where to send the payer.
#[derive(Debug, Serialize)]
pub struct InitiatePaymentResponse {
    pub redirect_url: String,
    pub transaction_id: String,
}

/// Final word on a callback delivery.
#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub transaction_id: String,
    pub status: TransactionStatus,
}
