pub mod auth;
pub mod fixed_expenses;
pub mod health;
pub mod metrics;
pub mod reports;
pub mod transactions;

// Common response types
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common::errors::{DatabaseError, ValidationError};
use common::models::UserClaims;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

/// Standard API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub trace_id: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
            trace_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// 500 with a generic message; the cause is logged, never returned
    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        let response = Self::new("internal_error", "Internal server error");
        tracing::error!(trace_id = %response.trace_id, error = %err, "{}", context);
        response
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = match self.error.as_str() {
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "not_found" => StatusCode::NOT_FOUND,
            "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "service_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<ValidationError> for ErrorResponse {
    fn from(err: ValidationError) -> Self {
        let fields = err.field_errors();
        ErrorResponse::new("validation_error", err.to_string())
            .with_details(serde_json::json!({ "fields": fields }))
    }
}

impl From<DatabaseError> for ErrorResponse {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ErrorResponse::new("not_found", msg),
            other => ErrorResponse::internal("Database operation failed", other),
        }
    }
}

/// Standard API success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            message: None,
            data,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> IntoResponse for SuccessResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// `201 Created` with a success body
pub struct Created<T: Serialize>(pub SuccessResponse<T>);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

/// JSON body extractor whose rejections use the standard error shape
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ErrorResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ValidationError::InvalidJson(rejection.body_text()).into()),
        }
    }
}

/// Path parameter extractor whose rejections use the standard error shape
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ErrorResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(rejection) => Err(ValidationError::InvalidPath(rejection.body_text()).into()),
        }
    }
}

/// User id carried in the verified token
pub fn current_user_id(claims: &UserClaims) -> Result<Uuid, ErrorResponse> {
    claims
        .user_id()
        .ok_or_else(|| ErrorResponse::new("unauthorized", "Invalid token subject"))
}

/// Fallback for unknown routes
pub async fn not_found() -> ErrorResponse {
    ErrorResponse::new("not_found", "Route not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::errors::FieldError;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            ("unauthorized", StatusCode::UNAUTHORIZED),
            ("not_found", StatusCode::NOT_FOUND),
            ("validation_error", StatusCode::BAD_REQUEST),
            ("service_unavailable", StatusCode::SERVICE_UNAVAILABLE),
            ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            assert_eq!(ErrorResponse::new(code, "x").into_response().status(), status);
        }
    }

    #[test]
    fn test_validation_error_carries_fields() {
        let err = ValidationError::Fields(vec![FieldError::new("amount", "must be positive")]);
        let response = ErrorResponse::from(err);

        assert_eq!(response.error, "validation_error");
        let details = response.details.unwrap();
        assert_eq!(details["fields"][0]["field"], "amount");
    }

    #[test]
    fn test_database_not_found_maps_to_404() {
        let response = ErrorResponse::from(DatabaseError::NotFound("gone".to_string()));
        assert_eq!(response.error, "not_found");

        let response = ErrorResponse::from(DatabaseError::QueryFailed("syntax".to_string()));
        assert_eq!(response.error, "internal_error");
        assert_eq!(response.message, "Internal server error");
    }

    #[test]
    fn test_current_user_id_rejects_bad_subject() {
        let claims = UserClaims {
            sub: "not-a-uuid".to_string(),
            email: "budi@example.com".to_string(),
            exp: 0,
            iat: 0,
        };
        assert!(current_user_id(&claims).is_err());
    }
}
