// Transaction (daily log) repository implementation

use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::Transaction;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

/// Repository for the expense ledger
#[derive(Clone)]
pub struct TransactionRepository {
    pool: DbPool,
}

impl TransactionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, transaction), fields(transaction_id = %transaction.id, user_id = %transaction.user_id))]
    pub async fn create(&self, transaction: &Transaction) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, user_id, description, amount, category, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.user_id)
        .bind(&transaction.description)
        .bind(transaction.amount)
        .bind(&transaction.category)
        .bind(transaction.date)
        .execute(self.pool.pool())
        .await?;

        tracing::debug!("Transaction recorded");
        Ok(())
    }

    /// All of a user's transactions, newest first
    #[instrument(skip(self))]
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Transaction>, DatabaseError> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, description, amount, category, date
            FROM transactions
            WHERE user_id = $1
            ORDER BY date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(transactions)
    }

    /// A user's transactions dated in `[from, until)`, newest first
    #[instrument(skip(self))]
    pub async fn find_by_user_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, DatabaseError> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, description, amount, category, date
            FROM transactions
            WHERE user_id = $1 AND date >= $2 AND date < $3
            ORDER BY date DESC
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(until)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(transactions)
    }

    /// Delete a transaction owned by `user_id`
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!(
                "Transaction not found: {}",
                id
            )));
        }

        tracing::info!(transaction_id = %id, "Transaction deleted");
        Ok(())
    }

    /// Sum of every transaction the user has logged
    #[instrument(skip(self))]
    pub async fn total_spent(&self, user_id: Uuid) -> Result<Decimal, DatabaseError> {
        let (total,): (Decimal,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.pool.pool())
        .await?;

        Ok(total)
    }

    /// Sum of the user's transactions dated at or after `since`
    #[instrument(skip(self))]
    pub async fn total_spent_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Decimal, DatabaseError> {
        let (total,): (Decimal,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE user_id = $1 AND date >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(self.pool.pool())
        .await?;

        Ok(total)
    }

    /// Whether any transaction since `since` mentions `name` in its description,
    /// ignoring case
    #[instrument(skip(self))]
    pub async fn has_description_match_since(
        &self,
        user_id: Uuid,
        name: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let (found,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM transactions
                WHERE user_id = $1
                  AND date >= $2
                  AND STRPOS(LOWER(description), LOWER($3)) > 0
            )
            "#,
        )
        .bind(user_id)
        .bind(since)
        .bind(name)
        .fetch_one(self.pool.pool())
        .await?;

        Ok(found)
    }
}
