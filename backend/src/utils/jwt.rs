//! JWT token utilities for session tokens.
//!
//! Tokens are deliberately stateless and carry no `exp` claim: expiry is
//! enforced at resolution time against the live session record, with the
//! token's `iat` serving as a second, independent age check. A token whose
//! session has been deleted is invalid no matter what it says.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Session ID
    pub sid: String,
    /// Client IP at issue time
    pub ip: String,
    /// Client user-agent at issue time
    pub ua: String,
    /// Issued-at epoch seconds
    pub iat: i64,
}

impl Claims {
    /// Token age in whole seconds, measured from `iat`.
    pub fn age_seconds(&self) -> i64 {
        Utc::now().timestamp() - self.iat
    }
}

/// Signs and verifies session tokens with a shared HS256 secret.
pub struct JwtUtils {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtUtils {
    /// Create a new JwtUtils instance from the configured secret.
    pub fn new(secret: &str) -> Self {
        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        // No exp claim in the payload; expiry lives in the session record.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims = Default::default();

        JwtUtils {
            encoding_key,
            decoding_key,
            validation,
        }
    }

    /// Signs a token binding a user, a session and the client fingerprint.
    pub fn generate_token(
        &self,
        user_id: &str,
        session_id: &str,
        ip: &str,
        user_agent: &str,
    ) -> Result<String, ServiceError> {
        let claims = Claims {
            sub: user_id.to_string(),
            sid: session_id.to_string(),
            ip: ip.to_string(),
            ua: user_agent.to_string(),
            iat: Utc::now().timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::internal_error(format!("Token generation failed: {}", e)))
    }

    /// Verifies the signature and decodes the claims. Signature mismatch,
    /// garbage input and missing claims all come back as `None`.
    pub fn validate_token(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .ok()
    }
}
