use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use common::auth::AuthService;
use common::db::repositories::UserRepository;
use common::errors::{AuthError, FieldError, ValidationError};
use common::models::{FinancialPlan, PushSubscription, User, UserClaims};
use common::validation::{
    validate_daily_limit, validate_financial_plan, validate_login, validate_registration,
    Validator,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::{current_user_id, ApiJson, Created, ErrorResponse, SuccessResponse};
use crate::state::AppState;

const FORGOT_PASSWORD_MESSAGE: &str =
    "If the email is registered, a password reset link has been sent";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub daily_limit: Decimal,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
    pub redirect_to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Profile returned by `GET /api/auth/me` and the plan updates
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub monthly_income: Decimal,
    pub savings_target: Decimal,
    pub is_percent_target: bool,
    pub daily_limit: Decimal,
    pub push_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            monthly_income: user.monthly_income,
            savings_target: user.savings_target,
            is_percent_target: user.is_percent_target,
            daily_limit: user.daily_limit,
            push_enabled: user.push_subscription.is_some(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateLimitRequest {
    pub daily_limit: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct FinancialPlanRequest {
    pub monthly_income: Decimal,
    pub savings_target: Decimal,
    #[serde(default)]
    pub is_percent_target: bool,
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.jwt.clone(), UserRepository::new(state.db_pool.clone()))
}

/// Register a new account
#[tracing::instrument(skip(state, req))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(axum::http::StatusCode, Json<RegisterResponse>), ErrorResponse> {
    let email = req.email.trim();
    let name = req.name.trim();
    validate_registration(email, &req.password, name)?;

    let user = auth_service(&state)
        .register(email, &req.password, name)
        .await
        .map_err(|e| match e {
            AuthError::EmailTaken(_) => ErrorResponse::from(ValidationError::Fields(vec![
                FieldError::new("email", "is already registered"),
            ])),
            other => ErrorResponse::internal("Registration failed", other),
        })?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful".to_string(),
            user_id: user.id,
        }),
    ))
}

/// Exchange email and password for a bearer token
#[tracing::instrument(skip(state, req))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ErrorResponse> {
    let email = req.email.trim();
    validate_login(email, &req.password)?;

    let session = auth_service(&state)
        .login(email, &req.password)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials => {
                ErrorResponse::new("unauthorized", "Invalid email or password")
            }
            other => ErrorResponse::internal("Login failed", other),
        })?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token: session.token,
        user: LoginUser {
            id: session.user.id,
            name: session.user.name,
            email: session.user.email,
            daily_limit: session.user.daily_limit,
        },
    }))
}

/// Ask the identity provider to email a reset link. The answer never reveals
/// whether the address has an account.
#[tracing::instrument(skip(state, req))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    let email = req.email.trim();
    Validator::new().email("email", email).finish()?;

    let redirect_to = req
        .redirect_to
        .as_deref()
        .or(state.config.identity.reset_redirect_url.as_deref());

    state
        .identity
        .send_password_reset(email, redirect_to)
        .await
        .map_err(|e| ErrorResponse::internal("Password reset request failed", e))?;

    Ok(Json(MessageResponse {
        message: FORGOT_PASSWORD_MESSAGE.to_string(),
    }))
}

/// Current user's profile and plan
#[tracing::instrument(skip(state, claims))]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> Result<Json<SuccessResponse<ProfileResponse>>, ErrorResponse> {
    let user_id = current_user_id(&claims)?;

    let user = UserRepository::new(state.db_pool.clone())
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ErrorResponse::new("not_found", "User not found"))?;

    Ok(Json(SuccessResponse::new(user.into())))
}

/// Manually override the daily limit
#[tracing::instrument(skip(state, claims, req))]
pub async fn update_limit(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    ApiJson(req): ApiJson<UpdateLimitRequest>,
) -> Result<Json<SuccessResponse<ProfileResponse>>, ErrorResponse> {
    let user_id = current_user_id(&claims)?;
    validate_daily_limit(req.daily_limit)?;

    let user = UserRepository::new(state.db_pool.clone())
        .update_daily_limit(user_id, req.daily_limit)
        .await?;

    Ok(Json(
        SuccessResponse::new(ProfileResponse::from(user)).with_message("Daily limit updated"),
    ))
}

/// Store income and savings target and derive the daily limit from them
#[tracing::instrument(skip(state, claims, req))]
pub async fn update_financial_plan(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    ApiJson(req): ApiJson<FinancialPlanRequest>,
) -> Result<Json<SuccessResponse<ProfileResponse>>, ErrorResponse> {
    let user_id = current_user_id(&claims)?;
    validate_financial_plan(req.monthly_income, req.savings_target, req.is_percent_target)?;

    let plan = FinancialPlan {
        monthly_income: req.monthly_income,
        savings_target: req.savings_target,
        is_percent_target: req.is_percent_target,
    };
    let user = UserRepository::new(state.db_pool.clone())
        .update_financial_plan(user_id, &plan)
        .await?;

    Ok(Json(
        SuccessResponse::new(ProfileResponse::from(user)).with_message("Financial plan updated"),
    ))
}

/// Save the browser's Web Push subscription
#[tracing::instrument(skip(state, claims, subscription))]
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    ApiJson(subscription): ApiJson<PushSubscription>,
) -> Result<Created<MessageResponse>, ErrorResponse> {
    let user_id = current_user_id(&claims)?;
    Validator::new()
        .text("endpoint", &subscription.endpoint, 1, 2048)
        .text("keys.p256dh", &subscription.keys.p256dh, 1, 512)
        .text("keys.auth", &subscription.keys.auth, 1, 512)
        .finish()?;

    UserRepository::new(state.db_pool.clone())
        .save_push_subscription(user_id, &subscription)
        .await?;

    Ok(Created(SuccessResponse::new(MessageResponse {
        message: "Push subscription saved".to_string(),
    })))
}
