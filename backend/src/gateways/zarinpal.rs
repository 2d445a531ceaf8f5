//! Zarinpal gateway: card/bank redirect provider.
//!
//! Talks to Zarinpal's REST WebGate. The sandbox host is selected by the
//! `payment_sandbox` config flag. All outbound calls carry a bounded
//! timeout; transport failures and undecodable responses are folded into
//! `GatewayError::Transport` at this boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::{
    CallbackStatus, GatewayCallback, GatewayError, IdentifierRequest, PaymentGateway, Verification,
};
use crate::config::Config;

/// Status code Zarinpal uses for a successful payment request and a fresh
/// verification; 101 is "already verified".
const STATUS_SUCCESS: i64 = 100;
const STATUS_ALREADY_VERIFIED: i64 = 101;

pub struct ZarinpalGateway {
    client: reqwest::Client,
    merchant_id: String,
    sandbox: bool,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct PaymentRequestBody<'a> {
    #[serde(rename = "MerchantID")]
    merchant_id: &'a str,
    #[serde(rename = "Amount")]
    amount: i64,
    #[serde(rename = "CallbackURL")]
    callback_url: &'a str,
    #[serde(rename = "Description")]
    description: &'a str,
    #[serde(rename = "Mobile", skip_serializing_if = "Option::is_none")]
    mobile: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PaymentRequestReply {
    #[serde(rename = "Status")]
    status: i64,
    #[serde(rename = "Authority", default)]
    authority: String,
}

#[derive(Debug, Serialize)]
struct VerificationBody<'a> {
    #[serde(rename = "MerchantID")]
    merchant_id: &'a str,
    #[serde(rename = "Amount")]
    amount: i64,
    #[serde(rename = "Authority")]
    authority: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerificationReply {
    #[serde(rename = "Status")]
    status: i64,
    #[serde(rename = "RefID", default)]
    ref_id: i64,
}

impl ZarinpalGateway {
    pub fn new(config: &Config) -> Self {
        ZarinpalGateway {
            client: reqwest::Client::new(),
            merchant_id: config.zarinpal_merchant_id.clone(),
            sandbox: config.payment_sandbox,
            timeout: Duration::from_secs(config.gateway_timeout_seconds),
        }
    }

    fn host(&self) -> &'static str {
        if self.sandbox {
            "sandbox.zarinpal.com"
        } else {
            "www.zarinpal.com"
        }
    }

    fn rest_url(&self, endpoint: &str) -> String {
        format!("https://{}/pg/rest/WebGate/{}.json", self.host(), endpoint)
    }
}

#[async_trait]
impl PaymentGateway for ZarinpalGateway {
    fn name(&self) -> &'static str {
        "zarinpal"
    }

    fn api_key(&self) -> &str {
        &self.merchant_id
    }

    async fn request_identifier(
        &self,
        request: IdentifierRequest<'_>,
    ) -> Result<String, GatewayError> {
        let body = PaymentRequestBody {
            merchant_id: &self.merchant_id,
            amount: request.amount,
            callback_url: request.callback_url,
            description: request.description,
            mobile: request.mobile,
        };

        let reply: PaymentRequestReply = self
            .client
            .post(self.rest_url("PaymentRequest"))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if reply.status == STATUS_SUCCESS && !reply.authority.is_empty() {
            Ok(reply.authority)
        } else {
            tracing::warn!(status = reply.status, "zarinpal declined payment request");
            Err(GatewayError::Declined)
        }
    }

    /// The callback URL was registered with the payment request; the
    /// redirect only carries the authority.
    fn redirect_url(&self, identifier: &str, _callback_url: &str) -> String {
        format!("https://{}/pg/StartPay/{}", self.host(), identifier)
    }

    fn parse_callback(&self, params: &HashMap<String, String>) -> Option<GatewayCallback> {
        let identifier = params.get("Authority")?.clone();
        let status = match params.get("Status")?.as_str() {
            "OK" => CallbackStatus::Ok,
            _ => CallbackStatus::Nok,
        };
        Some(GatewayCallback { status, identifier })
    }

    async fn verify(&self, identifier: &str, amount: i64) -> Result<Verification, GatewayError> {
        let body = VerificationBody {
            merchant_id: &self.merchant_id,
            amount,
            authority: identifier,
        };

        let reply: VerificationReply = self
            .client
            .post(self.rest_url("PaymentVerification"))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Verification {
            reference: reply.ref_id.to_string(),
            status_code: reply.status,
            settled: reply.status == STATUS_SUCCESS || reply.status == STATUS_ALREADY_VERIFIED,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandbox_flag_selects_the_host() {
        let mut config = Config::for_tests();
        let sandbox = ZarinpalGateway::new(&config);
        assert_eq!(
            sandbox.redirect_url("A000123", "/cb"),
            "https://sandbox.zarinpal.com/pg/StartPay/A000123"
        );

        config.payment_sandbox = false;
        let production = ZarinpalGateway::new(&config);
        assert_eq!(
            production.redirect_url("A000123", "/cb"),
            "https://www.zarinpal.com/pg/StartPay/A000123"
        );
    }

    #[test]
    fn callback_parsing_uses_provider_field_names() {
        let gateway = ZarinpalGateway::new(&Config::for_tests());

        let ok: HashMap<_, _> = [
            ("Authority".to_string(), "A000123".to_string()),
            ("Status".to_string(), "OK".to_string()),
        ]
        .into();
        let parsed = gateway.parse_callback(&ok).unwrap();
        assert_eq!(parsed.status, CallbackStatus::Ok);
        assert_eq!(parsed.identifier, "A000123");

        let nok: HashMap<_, _> = [
            ("Authority".to_string(), "A000123".to_string()),
            ("Status".to_string(), "NOK".to_string()),
        ]
        .into();
        assert_eq!(gateway.parse_callback(&nok).unwrap().status, CallbackStatus::Nok);

        // Wallet-shaped params are not a Zarinpal callback.
        let foreign: HashMap<_, _> = [
            ("identifier".to_string(), "ID".to_string()),
            ("status".to_string(), "OK".to_string()),
        ]
        .into();
        assert!(gateway.parse_callback(&foreign).is_none());
    }
}
