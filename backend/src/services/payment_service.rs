//! Transaction orchestrator.
//!
//! Drives a payment through the gateway lifecycle and owns the transaction
//! state machine: `pending -> awaiting_callback -> {verified | failed}`.
//! Every transition is a conditional update keyed on the expected
//! pre-state, so duplicate and concurrent callback deliveries settle a
//! transaction exactly once. The amount passed to verification always
//! comes from the persisted row, never from the callback request.

use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::api::common::PaginationFilter;
use crate::api::payment::models::{
    CallbackResponse, InitiatePaymentRequest, InitiatePaymentResponse,
};
use crate::config::Config;
use crate::database::models::{CreateTransaction, Transaction, TransactionStatus};
use crate::errors::{ServiceError, ServiceResult};
use crate::gateways::{CallbackStatus, IdentifierRequest, PaymentGateway, resolve_gateway};
use crate::repositories::transaction_repository::TransactionRepository;

pub struct PaymentService<'a> {
    pool: &'a SqlitePool,
    config: &'a Config,
}

impl<'a> PaymentService<'a> {
    /// Creates a new PaymentService instance.
    pub fn new(pool: &'a SqlitePool, config: &'a Config) -> Self {
        Self { pool, config }
    }

    /// Starts a payment: picks the provider's gateway, requests an
    /// identifier and hands back the redirect target.
    pub async fn initiate_payment(
        &self,
        request: InitiatePaymentRequest,
    ) -> ServiceResult<InitiatePaymentResponse> {
        if let Err(validation_errors) = request.validate() {
            return Err(ServiceError::validation(validation_errors.to_string()));
        }

        // Unknown provider names fail closed before any row is written.
        let gateway = resolve_gateway(&request.provider, self.config)?;
        self.initiate_with_gateway(gateway.as_ref(), request).await
    }

    pub(crate) async fn initiate_with_gateway(
        &self,
        gateway: &dyn PaymentGateway,
        request: InitiatePaymentRequest,
    ) -> ServiceResult<InitiatePaymentResponse> {
        let repo = TransactionRepository::new(self.pool);
        let tx = repo
            .create_transaction(CreateTransaction {
                id: Uuid::now_v7().to_string(),
                provider: gateway.name().to_string(),
                api_key: gateway.api_key().to_string(),
                amount: request.amount,
                product_group: request.product_group.clone(),
            })
            .await?;

        // Relative callback paths are absolutized against the configured base.
        let callback_url = if request.callback_url.starts_with('/') {
            format!("{}{}", self.config.callback_base_url, request.callback_url)
        } else {
            request.callback_url.clone()
        };

        let identifier = gateway
            .request_identifier(IdentifierRequest {
                amount: request.amount,
                callback_url: &callback_url,
                description: &request.description,
                mobile: request.mobile.as_deref(),
            })
            .await;

        match identifier {
            Ok(identifier) if !identifier.is_empty() => {
                if !repo.attach_identifier(&tx.id, &identifier).await? {
                    // The row was created pending in this call; a lost
                    // transition means something else already moved it.
                    tracing::error!(
                        transaction_id = %tx.id,
                        provider = gateway.name(),
                        "transaction left pending state before identifier attach"
                    );
                    return Err(ServiceError::invalid_operation(
                        "Transaction is no longer awaiting an identifier",
                    ));
                }
                tracing::info!(
                    transaction_id = %tx.id,
                    provider = gateway.name(),
                    "payment identifier issued"
                );
                Ok(InitiatePaymentResponse {
                    redirect_url: gateway.redirect_url(&identifier, &callback_url),
                    transaction_id: tx.id,
                })
            }
            other => {
                if let Err(error) = &other {
                    tracing::warn!(
                        transaction_id = %tx.id,
                        provider = gateway.name(),
                        %error,
                        "payment identifier request failed"
                    );
                }
                repo.transition(&tx.id, TransactionStatus::Pending, TransactionStatus::Failed)
                    .await?;
                Err(ServiceError::external_service("Payment initiation failed"))
            }
        }
    }

    /// Settles a transaction from a provider callback. Idempotent: a
    /// replayed callback for a terminal transaction acknowledges without
    /// re-verifying or re-crediting.
    pub async fn handle_callback(
        &self,
        provider: &str,
        params: &std::collections::HashMap<String, String>,
    ) -> ServiceResult<CallbackResponse> {
        let gateway = resolve_gateway(provider, self.config)?;
        self.handle_callback_with_gateway(gateway.as_ref(), params)
            .await
    }

    pub(crate) async fn handle_callback_with_gateway(
        &self,
        gateway: &dyn PaymentGateway,
        params: &std::collections::HashMap<String, String>,
    ) -> ServiceResult<CallbackResponse> {
        let repo = TransactionRepository::new(self.pool);

        let callback = gateway
            .parse_callback(params)
            .ok_or_else(|| ServiceError::validation("Unrecognized callback parameters"))?;

        // A callback naming an identifier we never issued is untrusted.
        let tx = repo
            .get_transaction_by_identifier(gateway.name(), &callback.identifier)
            .await?
            .ok_or_else(|| {
                tracing::warn!(
                    provider = gateway.name(),
                    identifier = %callback.identifier,
                    "callback for unknown transaction rejected"
                );
                ServiceError::not_found("Transaction", &callback.identifier)
            })?;

        if tx.status.is_terminal() {
            tracing::warn!(
                transaction_id = %tx.id,
                status = %tx.status,
                "callback replay for settled transaction, acknowledging"
            );
            return Ok(CallbackResponse {
                transaction_id: tx.id,
                status: tx.status,
            });
        }

        if callback.status == CallbackStatus::Nok {
            let status = self.settle(&repo, &tx, TransactionStatus::Failed).await?;
            return Ok(CallbackResponse {
                transaction_id: tx.id,
                status,
            });
        }

        // Verify against the stored amount; the callback channel is not
        // trusted with it.
        let outcome = match gateway.verify(&callback.identifier, tx.amount).await {
            Ok(verification) if verification.settled => {
                tracing::info!(
                    transaction_id = %tx.id,
                    reference = %verification.reference,
                    "payment verified"
                );
                TransactionStatus::Verified
            }
            Ok(verification) => {
                tracing::warn!(
                    transaction_id = %tx.id,
                    status_code = verification.status_code,
                    "provider rejected verification"
                );
                TransactionStatus::Failed
            }
            Err(error) => {
                tracing::warn!(transaction_id = %tx.id, %error, "verification call failed");
                TransactionStatus::Failed
            }
        };

        let status = self.settle(&repo, &tx, outcome).await?;
        Ok(CallbackResponse {
            transaction_id: tx.id,
            status,
        })
    }

    /// Lists transactions with pagination metadata inputs.
    pub async fn list_transactions(
        &self,
        pagination: &PaginationFilter,
    ) -> ServiceResult<(Vec<Transaction>, u64)> {
        let repo = TransactionRepository::new(self.pool);
        let items = repo.list_transactions(pagination).await?;
        let total = repo.count_transactions().await?;
        Ok((items, total))
    }

    /// Applies the awaiting_callback -> terminal transition. Losing the
    /// conditional update means a concurrent delivery settled first; the
    /// winner's status is returned instead.
    async fn settle(
        &self,
        repo: &TransactionRepository<'_>,
        tx: &Transaction,
        to: TransactionStatus,
    ) -> ServiceResult<TransactionStatus> {
        let moved = repo
            .transition(&tx.id, TransactionStatus::AwaitingCallback, to)
            .await?;
        if moved {
            return Ok(to);
        }

        let current = repo
            .get_transaction_by_id(&tx.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Transaction", &tx.id))?;
        Ok(current.status)
    }
}
