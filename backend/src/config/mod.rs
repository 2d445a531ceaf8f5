//! Central module for application-wide configuration settings.
//!
//! Configuration is loaded from the environment once at startup and passed
//! by reference into the services that need it. Nothing in the codebase
//! reads the environment after boot.

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub server_port: u16,
    /// Secret used to sign session tokens (HS256).
    pub jwt_secret: String,
    /// Lifetime of a session in seconds. Also bounds token age at
    /// resolution time.
    pub session_ttl_seconds: u64,
    /// Merchant id for the Zarinpal gateway.
    pub zarinpal_merchant_id: String,
    /// When set, online gateways talk to their sandbox hosts.
    pub payment_sandbox: bool,
    /// Upper bound on any single outbound call to a payment provider.
    pub gateway_timeout_seconds: u64,
    /// Prefix applied to relative callback paths handed to providers.
    pub callback_base_url: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET not set")?;

        let session_ttl_seconds = env::var("SESSION_TTL_SECONDS")
            .unwrap_or_else(|_| "900".to_string())
            .parse::<u64>()
            .context("SESSION_TTL_SECONDS must be a valid number")?;

        let zarinpal_merchant_id =
            env::var("ZARINPAL_MERCHANT_ID").unwrap_or_else(|_| String::new());

        let payment_sandbox = env::var("PAYMENT_SANDBOX")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .context("PAYMENT_SANDBOX must be true or false")?;

        let gateway_timeout_seconds = env::var("GATEWAY_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u64>()
            .context("GATEWAY_TIMEOUT_SECONDS must be a valid number")?;

        let callback_base_url =
            env::var("CALLBACK_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            server_port,
            jwt_secret,
            session_ttl_seconds,
            zarinpal_merchant_id,
            payment_sandbox,
            gateway_timeout_seconds,
            callback_base_url,
        })
    }
}

#[cfg(test)]
impl Config {
    /// A fixed configuration for unit tests. No environment access.
    pub(crate) fn for_tests() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout_seconds: 3,
            server_port: 0,
            jwt_secret: "test-secret".to_string(),
            session_ttl_seconds: 900,
            zarinpal_merchant_id: "00000000-0000-0000-0000-000000000000".to_string(),
            payment_sandbox: true,
            gateway_timeout_seconds: 2,
            callback_base_url: String::new(),
        }
    }
}
