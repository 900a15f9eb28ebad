// Data the reminder run reads: due bills and this month's payments

use crate::db::repositories::{FixedExpenseRepository, TransactionRepository};
use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::FixedExpense;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait ReminderSource: Send + Sync {
    /// Fixed expenses of every user whose due day is `day`
    async fn find_due_expenses(&self, day: u32) -> Result<Vec<FixedExpense>, DatabaseError>;

    /// Whether the user logged a transaction since `since` whose description
    /// contains `name`, ignoring case
    async fn has_payment_since(
        &self,
        user_id: Uuid,
        name: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, DatabaseError>;
}

/// Reminder source backed by the fixed_expenses and transactions tables
#[derive(Clone)]
pub struct PostgresReminderSource {
    fixed_expenses: FixedExpenseRepository,
    transactions: TransactionRepository,
}

impl PostgresReminderSource {
    pub fn new(pool: DbPool) -> Self {
        Self {
            fixed_expenses: FixedExpenseRepository::new(pool.clone()),
            transactions: TransactionRepository::new(pool),
        }
    }
}

#[async_trait]
impl ReminderSource for PostgresReminderSource {
    async fn find_due_expenses(&self, day: u32) -> Result<Vec<FixedExpense>, DatabaseError> {
        self.fixed_expenses.find_due_on(day as i32).await
    }

    async fn has_payment_since(
        &self,
        user_id: Uuid,
        name: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        self.transactions
            .has_description_match_since(user_id, name, since)
            .await
    }
}
