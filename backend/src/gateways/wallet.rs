//! Internal wallet "gateway".
//!
//! No external provider is involved: identifiers are minted locally and
//! verification always settles. The orchestrator drives it through the same
//! lifecycle as a real provider, so wallet charges share the transaction
//! state machine and its guarantees.

use async_trait::async_trait;
use std::collections::HashMap;

use super::{
    CallbackStatus, GatewayCallback, GatewayError, IdentifierRequest, PaymentGateway, Verification,
};
use crate::utils::generate_random_string::generate_random_string;

const IDENTIFIER_LENGTH: usize = 16;

pub struct WalletGateway;

impl WalletGateway {
    pub fn new() -> Self {
        WalletGateway
    }
}

impl Default for WalletGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for WalletGateway {
    fn name(&self) -> &'static str {
        "wallet"
    }

    fn api_key(&self) -> &str {
        "internal"
    }

    /// Mints a locally-unique identifier. No network call.
    async fn request_identifier(
        &self,
        _request: IdentifierRequest<'_>,
    ) -> Result<String, GatewayError> {
        Ok(generate_random_string(IDENTIFIER_LENGTH))
    }

    /// The payer goes straight back to the callback with an OK status; the
    /// callback handler then drives verification like any other provider.
    fn redirect_url(&self, identifier: &str, callback_url: &str) -> String {
        format!("{}?identifier={}&status=OK", callback_url, identifier)
    }

    fn parse_callback(&self, params: &HashMap<String, String>) -> Option<GatewayCallback> {
        let identifier = params.get("identifier")?.clone();
        let status = match params.get("status")?.as_str() {
            "OK" => CallbackStatus::Ok,
            _ => CallbackStatus::Nok,
        };
        Some(GatewayCallback { status, identifier })
    }

    async fn verify(&self, _identifier: &str, _amount: i64) -> Result<Verification, GatewayError> {
        Ok(Verification {
            reference: generate_random_string(12),
            status_code: 100,
            settled: true,
        })
    }
}
