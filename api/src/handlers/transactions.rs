use axum::{extract::State, Extension, Json};
use common::db::repositories::TransactionRepository;
use common::models::{Transaction, UserClaims};
use common::notification::PushPayload;
use common::telemetry::{self, TransactionSource};
use common::validation::validate_transaction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::{
    current_user_id, ApiJson, ApiPath, Created, ErrorResponse, SuccessResponse,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub description: String,
    pub amount: Decimal,
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: Uuid,
}

/// The user's transactions, newest first
#[tracing::instrument(skip(state, claims))]
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> Result<Json<SuccessResponse<Vec<Transaction>>>, ErrorResponse> {
    let user_id = current_user_id(&claims)?;

    let transactions = TransactionRepository::new(state.db_pool.clone())
        .find_by_user(user_id)
        .await?;

    Ok(Json(SuccessResponse::new(transactions)))
}

/// Log an expense
#[tracing::instrument(skip(state, claims, req))]
pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    ApiJson(req): ApiJson<CreateTransactionRequest>,
) -> Result<Created<Transaction>, ErrorResponse> {
    let user_id = current_user_id(&claims)?;
    let description = req.description.trim();
    let category = req.category.trim();
    validate_transaction(description, req.amount, category)?;

    let transaction = Transaction::new(
        user_id,
        description.to_string(),
        req.amount,
        category.to_string(),
    );
    TransactionRepository::new(state.db_pool.clone())
        .create(&transaction)
        .await?;
    telemetry::record_transaction_created(TransactionSource::Manual);

    state.notifications.notify_user_in_background(
        user_id,
        PushPayload::transaction_saved(&transaction.description, transaction.amount),
    );

    Ok(Created(
        SuccessResponse::new(transaction).with_message("Transaction saved"),
    ))
}

/// Delete one of the user's transactions
#[tracing::instrument(skip(state, claims))]
pub async fn delete_transaction(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<SuccessResponse<DeletedResponse>>, ErrorResponse> {
    let user_id = current_user_id(&claims)?;

    TransactionRepository::new(state.db_pool.clone())
        .delete(user_id, id)
        .await?;

    Ok(Json(
        SuccessResponse::new(DeletedResponse { id }).with_message("Transaction deleted"),
    ))
}
