use axum::{extract::State, Extension, Json};
use common::db::repositories::{FixedExpenseRepository, TransactionRepository};
use common::models::{FixedExpense, Transaction, UserClaims};
use common::telemetry::{self, TransactionSource};
use common::validation::validate_fixed_expense;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::transactions::DeletedResponse;
use crate::handlers::{
    current_user_id, ApiJson, ApiPath, Created, ErrorResponse, SuccessResponse,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateFixedExpenseRequest {
    pub name: String,
    pub amount: Decimal,
    pub due_date: i32,
}

/// The user's recurring bills, by due day
#[tracing::instrument(skip(state, claims))]
pub async fn list_fixed_expenses(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> Result<Json<SuccessResponse<Vec<FixedExpense>>>, ErrorResponse> {
    let user_id = current_user_id(&claims)?;

    let expenses = FixedExpenseRepository::new(state.db_pool.clone())
        .find_by_user(user_id)
        .await?;

    Ok(Json(SuccessResponse::new(expenses)))
}

/// Add a recurring bill and re-derive the daily limit
#[tracing::instrument(skip(state, claims, req))]
pub async fn create_fixed_expense(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    ApiJson(req): ApiJson<CreateFixedExpenseRequest>,
) -> Result<Created<FixedExpense>, ErrorResponse> {
    let user_id = current_user_id(&claims)?;
    let name = req.name.trim();
    validate_fixed_expense(name, req.amount, req.due_date)?;

    let expense = FixedExpense::new(user_id, name.to_string(), req.amount, req.due_date);
    FixedExpenseRepository::new(state.db_pool.clone())
        .create(&expense)
        .await?;

    Ok(Created(
        SuccessResponse::new(expense).with_message("Fixed expense added"),
    ))
}

/// Remove a recurring bill and re-derive the daily limit
#[tracing::instrument(skip(state, claims))]
pub async fn delete_fixed_expense(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<SuccessResponse<DeletedResponse>>, ErrorResponse> {
    let user_id = current_user_id(&claims)?;

    FixedExpenseRepository::new(state.db_pool.clone())
        .delete(user_id, id)
        .await?;

    Ok(Json(
        SuccessResponse::new(DeletedResponse { id }).with_message("Fixed expense deleted"),
    ))
}

/// Record this month's payment of a bill as a transaction. The description
/// embeds the bill name so the reminder run sees it as paid.
#[tracing::instrument(skip(state, claims))]
pub async fn pay_fixed_expense(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Created<Transaction>, ErrorResponse> {
    let user_id = current_user_id(&claims)?;

    let expense = FixedExpenseRepository::new(state.db_pool.clone())
        .find_by_id(user_id, id)
        .await?
        .ok_or_else(|| ErrorResponse::new("not_found", "Fixed expense not found"))?;

    let transaction = expense.payment_transaction();
    TransactionRepository::new(state.db_pool.clone())
        .create(&transaction)
        .await?;
    telemetry::record_transaction_created(TransactionSource::BillPayment);

    tracing::info!(expense_id = %expense.id, transaction_id = %transaction.id, "Bill marked as paid");
    Ok(Created(
        SuccessResponse::new(transaction).with_message("Bill payment recorded"),
    ))
}
