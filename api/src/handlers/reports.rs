use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use common::budget::{BudgetSummary, LedgerTotals};
use common::db::repositories::{FixedExpenseRepository, TransactionRepository, UserRepository};
use common::errors::{FieldError, ValidationError};
use common::models::UserClaims;
use common::report::{category_breakdown, CategoryReport};
use common::schedule::{local_date, start_of_day, start_of_month, start_of_next_month};
use serde::Deserialize;

use crate::handlers::{current_user_id, ErrorResponse, SuccessResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    /// Calendar month as `YYYY-MM`; all time when absent
    pub month: Option<String>,
}

/// First day of a `YYYY-MM` month
fn parse_month(month: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d").map_err(|_| {
        ValidationError::Fields(vec![FieldError::new("month", "must be formatted as YYYY-MM")])
    })
}

/// Dashboard figures: limit, today's spend, safe balance
#[tracing::instrument(skip(state, claims))]
pub async fn summary(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> Result<Json<SuccessResponse<BudgetSummary>>, ErrorResponse> {
    let user_id = current_user_id(&claims)?;

    let user = UserRepository::new(state.db_pool.clone())
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ErrorResponse::new("not_found", "User not found"))?;

    let transactions = TransactionRepository::new(state.db_pool.clone());
    let today = local_date(Utc::now(), state.timezone);
    let totals = LedgerTotals {
        spent_today: transactions
            .total_spent_since(user_id, start_of_day(today, state.timezone))
            .await?,
        total_spent_all_time: transactions.total_spent(user_id).await?,
        total_fixed: FixedExpenseRepository::new(state.db_pool.clone())
            .total_for_user(user_id)
            .await?,
    };

    Ok(Json(SuccessResponse::new(BudgetSummary::compute(
        &user.plan(),
        user.daily_limit,
        totals,
    ))))
}

/// Spending grouped by category
#[tracing::instrument(skip(state, claims))]
pub async fn categories(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<SuccessResponse<CategoryReport>>, ErrorResponse> {
    let user_id = current_user_id(&claims)?;
    let month = query.month.as_deref().map(parse_month).transpose()?;

    let repository = TransactionRepository::new(state.db_pool.clone());
    let transactions = match month {
        Some(first_day) => {
            repository
                .find_by_user_between(
                    user_id,
                    start_of_month(first_day, state.timezone),
                    start_of_next_month(first_day, state.timezone),
                )
                .await?
        }
        None => repository.find_by_user(user_id).await?,
    };

    Ok(Json(SuccessResponse::new(category_breakdown(&transactions))))
}
