//! Payment gateway abstraction.
//!
//! One trait implemented by every provider variant. Each provider has its
//! own wire format and callback field names; the implementations normalize
//! all of that into the uniform shapes below, so the orchestrator never
//! sees provider-specific details. Adding a provider means adding a variant
//! here and a match arm in `resolve_gateway`, nothing else.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::config::Config;
use crate::errors::{ServiceError, ServiceResult};

pub mod wallet;
pub mod zarinpal;

pub use wallet::WalletGateway;
pub use zarinpal::ZarinpalGateway;

/// Failure of a single gateway call, made explicit instead of being
/// swallowed. Transport problems (timeouts, connection failures, malformed
/// responses) never escape a gateway as raw errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The provider answered and said no.
    #[error("provider declined the request")]
    Declined,
    /// The provider could not be reached or answered garbage.
    #[error("provider transport failure: {0}")]
    Transport(String),
}

/// Callback status, normalized across providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStatus {
    Ok,
    Nok,
}

/// A provider callback reduced to the uniform shape.
#[derive(Debug, Clone)]
pub struct GatewayCallback {
    pub status: CallbackStatus,
    pub identifier: String,
}

/// Result of a server-to-server verification call.
#[derive(Debug, Clone)]
pub struct Verification {
    /// Provider transaction/reference code.
    pub reference: String,
    /// Raw numeric status from the provider.
    pub status_code: i64,
    /// Whether the provider considers the payment settled.
    pub settled: bool,
}

/// Parameters for a payment-identifier request.
#[derive(Debug, Clone)]
pub struct IdentifierRequest<'a> {
    /// Integer minor units.
    pub amount: i64,
    /// Where the provider should send the payer back.
    pub callback_url: &'a str,
    pub description: &'a str,
    pub mobile: Option<&'a str>,
}

/// Uniform contract implemented by each payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Provider name, also the transaction row's provider tag.
    fn name(&self) -> &'static str;

    /// API key recorded on transactions created through this gateway.
    fn api_key(&self) -> &str;

    /// Requests a payment identifier from the provider.
    async fn request_identifier(
        &self,
        request: IdentifierRequest<'_>,
    ) -> Result<String, GatewayError>;

    /// Builds the URL the payer is redirected to. Pure string
    /// construction; the sandbox/production host comes from configuration.
    fn redirect_url(&self, identifier: &str, callback_url: &str) -> String;

    /// Normalizes the provider's callback parameters. `None` means the
    /// parameters do not look like this provider's callback at all.
    fn parse_callback(&self, params: &HashMap<String, String>) -> Option<GatewayCallback>;

    /// Verifies a payment server-to-server. The amount is the integrity
    /// check and must come from the persisted transaction.
    async fn verify(&self, identifier: &str, amount: i64) -> Result<Verification, GatewayError>;
}

/// Resolves a provider name to its gateway. Unknown names fail closed: no
/// gateway is assigned and the caller gets an error instead of a silent
/// no-op.
pub fn resolve_gateway(provider: &str, config: &Config) -> ServiceResult<Box<dyn PaymentGateway>> {
    match provider {
        "zarinpal" => Ok(Box::new(ZarinpalGateway::new(config))),
        "wallet" => Ok(Box::new(WalletGateway::new())),
        _ => Err(ServiceError::not_found("Payment provider", provider)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_providers_resolve() {
        let config = Config::for_tests();
        assert_eq!(resolve_gateway("wallet", &config).unwrap().name(), "wallet");
        assert_eq!(
            resolve_gateway("zarinpal", &config).unwrap().name(),
            "zarinpal"
        );
    }

    #[test]
    fn unknown_provider_fails_closed() {
        let config = Config::for_tests();
        assert!(matches!(
            resolve_gateway("paypal", &config),
            Err(ServiceError::NotFound { .. })
        ));
    }
}
