// Fixed expense (recurring bill) repository implementation

use crate::db::repositories::user::{lock_plan, store_derived_limit};
use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{FinancialPlan, FixedExpense};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

#[derive(Clone)]
pub struct FixedExpenseRepository {
    pool: DbPool,
}

impl FixedExpenseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a bill. When the owner has an income set, the daily limit is
    /// re-derived in the same transaction.
    #[instrument(skip(self, expense), fields(expense_id = %expense.id, user_id = %expense.user_id))]
    pub async fn create(&self, expense: &FixedExpense) -> Result<(), DatabaseError> {
        let mut tx = self.pool.pool().begin().await?;
        let plan = lock_plan(&mut tx, expense.user_id).await?;

        sqlx::query(
            r#"
            INSERT INTO fixed_expenses (id, user_id, name, amount, due_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(expense.id)
        .bind(expense.user_id)
        .bind(&expense.name)
        .bind(expense.amount)
        .bind(expense.due_date)
        .bind(expense.created_at)
        .execute(&mut *tx)
        .await?;

        replan_if_income_set(&mut tx, expense.user_id, &plan).await?;
        tx.commit().await?;

        tracing::info!("Fixed expense created");
        Ok(())
    }

    /// A user's bills ordered by due day
    #[instrument(skip(self))]
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<FixedExpense>, DatabaseError> {
        let expenses = sqlx::query_as::<_, FixedExpense>(
            r#"
            SELECT id, user_id, name, amount, due_date, created_at
            FROM fixed_expenses
            WHERE user_id = $1
            ORDER BY due_date ASC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(expenses)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<FixedExpense>, DatabaseError> {
        let expense = sqlx::query_as::<_, FixedExpense>(
            r#"
            SELECT id, user_id, name, amount, due_date, created_at
            FROM fixed_expenses
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(expense)
    }

    /// Bills of every user falling due on `day` of the month
    #[instrument(skip(self))]
    pub async fn find_due_on(&self, day: i32) -> Result<Vec<FixedExpense>, DatabaseError> {
        let expenses = sqlx::query_as::<_, FixedExpense>(
            r#"
            SELECT id, user_id, name, amount, due_date, created_at
            FROM fixed_expenses
            WHERE due_date = $1
            ORDER BY user_id, created_at
            "#,
        )
        .bind(day)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(expenses)
    }

    /// Delete one of the user's bills and re-derive the daily limit in the
    /// same transaction
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DatabaseError> {
        let mut tx = self.pool.pool().begin().await?;
        let plan = lock_plan(&mut tx, user_id).await?;

        let result = sqlx::query("DELETE FROM fixed_expenses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!(
                "Fixed expense not found: {}",
                id
            )));
        }

        replan_if_income_set(&mut tx, user_id, &plan).await?;
        tx.commit().await?;

        tracing::info!(expense_id = %id, "Fixed expense deleted");
        Ok(())
    }

    /// Sum of all of a user's monthly bills
    #[instrument(skip(self))]
    pub async fn total_for_user(&self, user_id: Uuid) -> Result<Decimal, DatabaseError> {
        let (total,): (Decimal,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0) FROM fixed_expenses WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.pool.pool())
        .await?;

        Ok(total)
    }
}

/// Users who never set an income keep their current, possibly manual, limit
async fn replan_if_income_set(
    conn: &mut PgConnection,
    user_id: Uuid,
    plan: &FinancialPlan,
) -> Result<(), DatabaseError> {
    if plan.monthly_income > Decimal::ZERO {
        store_derived_limit(conn, user_id, plan).await?;
    }
    Ok(())
}
