//! Database repository for payment transactions.
//!
//! Every state change goes through a conditional update: a transition only
//! lands if the row is still in the expected pre-state. That makes
//! concurrent or replayed provider callbacks safe without any in-process
//! locking.

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::api::common::PaginationFilter;
use crate::database::models::{CreateTransaction, Transaction, TransactionStatus};

const COLUMNS: &str =
    "id, provider, api_key, identifier, amount, status, product_group, created_at, updated_at";

/// Repository for transaction database operations.
pub struct TransactionRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> TransactionRepository<'a> {
    /// Creates a new TransactionRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a transaction in the `pending` state, before any provider
    /// contact.
    pub async fn create_transaction(&self, tx: CreateTransaction) -> Result<Transaction> {
        let now = Utc::now();
        let tx = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            INSERT INTO transactions (id, provider, api_key, amount, status, product_group, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(&tx.id)
        .bind(&tx.provider)
        .bind(&tx.api_key)
        .bind(tx.amount)
        .bind(TransactionStatus::Pending)
        .bind(&tx.product_group)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(tx)
    }

    /// Records the provider-issued identifier and moves the transaction to
    /// `awaiting_callback`. Conditional on the row still being `pending`.
    ///
    /// # Returns
    /// `true` if the transition landed.
    pub async fn attach_identifier(&self, id: &str, identifier: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE transactions SET identifier = ?, status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(identifier)
        .bind(TransactionStatus::AwaitingCallback)
        .bind(Utc::now())
        .bind(id)
        .bind(TransactionStatus::Pending)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Retrieves a transaction by its unique identifier.
    pub async fn get_transaction_by_id(&self, id: &str) -> Result<Option<Transaction>> {
        let tx = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {COLUMNS} FROM transactions WHERE id = ?",
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(tx)
    }

    /// Retrieves a transaction by the identifier the provider assigned.
    ///
    /// # Arguments
    /// * `provider` - Provider name the identifier belongs to
    /// * `identifier` - Provider-issued opaque identifier
    pub async fn get_transaction_by_identifier(
        &self,
        provider: &str,
        identifier: &str,
    ) -> Result<Option<Transaction>> {
        let tx = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {COLUMNS} FROM transactions WHERE provider = ? AND identifier = ?",
        ))
        .bind(provider)
        .bind(identifier)
        .fetch_optional(self.pool)
        .await?;

        Ok(tx)
    }

    /// Moves a transaction from `from` to `to` in one conditional update.
    ///
    /// # Returns
    /// `true` if this call performed the transition; `false` if the row was
    /// no longer in `from` (a concurrent or replayed delivery won).
    pub async fn transition(
        &self,
        id: &str,
        from: TransactionStatus,
        to: TransactionStatus,
    ) -> Result<bool> {
        let result =
            sqlx::query("UPDATE transactions SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
                .bind(to)
                .bind(Utc::now())
                .bind(id)
                .bind(from)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Lists transactions, newest first.
    pub async fn list_transactions(
        &self,
        pagination: &PaginationFilter,
    ) -> Result<Vec<Transaction>> {
        let txs = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {COLUMNS} FROM transactions ORDER BY created_at DESC LIMIT ? OFFSET ?",
        ))
        .bind(pagination.limit() as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(self.pool)
        .await?;

        Ok(txs)
    }

    /// Total transaction count, for pagination metadata.
    pub async fn count_transactions(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(self.pool)
            .await?;

        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::memory_pool;
    use uuid::Uuid;

    async fn pending_transaction(pool: &SqlitePool) -> Transaction {
        TransactionRepository::new(pool)
            .create_transaction(CreateTransaction {
                id: Uuid::now_v7().to_string(),
                provider: "wallet".to_string(),
                api_key: "internal".to_string(),
                amount: 50_000,
                product_group: "wallet-charge".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn attach_identifier_moves_pending_to_awaiting_callback() {
        let pool = memory_pool().await;
        let repo = TransactionRepository::new(&pool);
        let tx = pending_transaction(&pool).await;
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(tx.identifier.is_none());

        assert!(repo.attach_identifier(&tx.id, "A1B2C3D4E5F6G7H8").await.unwrap());

        let tx = repo.get_transaction_by_id(&tx.id).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::AwaitingCallback);
        assert_eq!(tx.identifier.as_deref(), Some("A1B2C3D4E5F6G7H8"));

        // Second attach misses: the row left `pending`.
        assert!(!repo.attach_identifier(&tx.id, "other").await.unwrap());
    }

    #[tokio::test]
    async fn transition_is_conditional_on_the_expected_pre_state() {
        let pool = memory_pool().await;
        let repo = TransactionRepository::new(&pool);
        let tx = pending_transaction(&pool).await;
        repo.attach_identifier(&tx.id, "IDENT").await.unwrap();

        assert!(
            repo.transition(
                &tx.id,
                TransactionStatus::AwaitingCallback,
                TransactionStatus::Verified
            )
            .await
            .unwrap()
        );

        // Terminal state: the same transition cannot land twice, and no
        // transition leads out of it.
        assert!(
            !repo
                .transition(
                    &tx.id,
                    TransactionStatus::AwaitingCallback,
                    TransactionStatus::Failed
                )
                .await
                .unwrap()
        );
        let tx = repo.get_transaction_by_id(&tx.id).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Verified);
    }

    #[tokio::test]
    async fn lookup_by_identifier_is_scoped_to_the_provider() {
        let pool = memory_pool().await;
        let repo = TransactionRepository::new(&pool);
        let tx = pending_transaction(&pool).await;
        repo.attach_identifier(&tx.id, "SHARED").await.unwrap();

        assert!(
            repo.get_transaction_by_identifier("wallet", "SHARED")
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            repo.get_transaction_by_identifier("zarinpal", "SHARED")
                .await
                .unwrap()
                .is_none()
        );
    }
}
