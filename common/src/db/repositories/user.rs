// User repository implementation

use crate::budget;
use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{FinancialPlan, PushSubscription, User};
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const USER_COLUMNS: &str = r#"
    id, email, name, password_hash, monthly_income, savings_target,
    is_percent_target, daily_limit, push_subscription, created_at, updated_at
"#;

/// Repository for user-related database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn create(&self, user: &User) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, name, password_hash, monthly_income, savings_target,
                is_percent_target, daily_limit, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.monthly_income)
        .bind(user.savings_target)
        .bind(user.is_percent_target)
        .bind(user.daily_limit)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(self.pool.pool())
        .await?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(())
    }

    /// Find a user by login email (case-insensitive)
    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(self.pool.pool())
            .await?;

        Ok(user)
    }

    /// Find a user by ID
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?;

        Ok(user)
    }

    /// Overwrite the daily limit
    #[instrument(skip(self))]
    pub async fn update_daily_limit(
        &self,
        id: Uuid,
        daily_limit: Decimal,
    ) -> Result<User, DatabaseError> {
        let query = format!(
            r#"
            UPDATE users
            SET daily_limit = $2, updated_at = $3
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(daily_limit)
            .bind(Utc::now())
            .fetch_optional(self.pool.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User not found: {}", id)))?;

        tracing::info!(user_id = %id, daily_limit = %daily_limit, "Daily limit updated");
        Ok(user)
    }

    /// Store new plan parameters and the daily limit derived from them and
    /// the user's current bills, in one transaction
    #[instrument(skip(self, plan))]
    pub async fn update_financial_plan(
        &self,
        id: Uuid,
        plan: &FinancialPlan,
    ) -> Result<User, DatabaseError> {
        let mut tx = self.pool.pool().begin().await?;
        lock_plan(&mut tx, id).await?;
        let user = store_derived_limit(&mut tx, id, plan).await?;
        tx.commit().await?;

        tracing::info!(user_id = %id, daily_limit = %user.daily_limit, "Financial plan updated");
        Ok(user)
    }

    /// Replace the stored Web Push subscription
    #[instrument(skip(self, subscription))]
    pub async fn save_push_subscription(
        &self,
        id: Uuid,
        subscription: &PushSubscription,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET push_subscription = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(sqlx::types::Json(subscription))
        .bind(Utc::now())
        .execute(self.pool.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("User not found: {}", id)));
        }

        tracing::info!(user_id = %id, "Push subscription saved");
        Ok(())
    }

    /// Load only the push subscription
    #[instrument(skip(self))]
    pub async fn find_push_subscription(
        &self,
        id: Uuid,
    ) -> Result<Option<PushSubscription>, DatabaseError> {
        let row: Option<(Option<sqlx::types::Json<PushSubscription>>,)> =
            sqlx::query_as("SELECT push_subscription FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool.pool())
                .await?;

        Ok(row.and_then(|(subscription,)| subscription.map(|json| json.0)))
    }
}

/// Lock the user's row until the surrounding transaction ends and read the
/// plan. Every write that changes the daily limit takes this lock first, so
/// concurrent plan and bill changes for one user apply one after another.
pub(crate) async fn lock_plan(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<FinancialPlan, DatabaseError> {
    let row: Option<(Decimal, Decimal, bool)> = sqlx::query_as(
        r#"
        SELECT monthly_income, savings_target, is_percent_target
        FROM users
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|(monthly_income, savings_target, is_percent_target)| FinancialPlan {
        monthly_income,
        savings_target,
        is_percent_target,
    })
    .ok_or_else(|| DatabaseError::NotFound(format!("User not found: {}", user_id)))
}

/// Write `plan` and the daily limit derived from it and the bills visible
/// inside the transaction
pub(crate) async fn store_derived_limit(
    conn: &mut PgConnection,
    user_id: Uuid,
    plan: &FinancialPlan,
) -> Result<User, DatabaseError> {
    let (total_fixed,): (Decimal,) = sqlx::query_as(
        "SELECT COALESCE(SUM(amount), 0) FROM fixed_expenses WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;
    let daily_limit = budget::daily_limit(plan, total_fixed);

    let query = format!(
        r#"
        UPDATE users
        SET monthly_income = $2,
            savings_target = $3,
            is_percent_target = $4,
            daily_limit = $5,
            updated_at = $6
        WHERE id = $1
        RETURNING {}
        "#,
        USER_COLUMNS
    );
    sqlx::query_as::<_, User>(&query)
        .bind(user_id)
        .bind(plan.monthly_income)
        .bind(plan.savings_target)
        .bind(plan.is_percent_target)
        .bind(daily_limit)
        .bind(Utc::now())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("User not found: {}", user_id)))
}
