// Error handling framework

use serde::Serialize;
use thiserror::Error;

/// Schedule-related errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression { expression: String, reason: String },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("No next execution time available for '{0}'")]
    NoNextExecution(String),
}

/// Authentication and authorization errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
}

/// A single rejected request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Request validation failed ({} field errors)", .0.len())]
    Fields(Vec<FieldError>),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid path parameter: {0}")]
    InvalidPath(String),
}

impl ValidationError {
    /// Flatten into the list of field errors reported to clients
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            ValidationError::Fields(errors) => errors.clone(),
            ValidationError::InvalidJson(reason) => vec![FieldError::new("body", reason.clone())],
            ValidationError::InvalidPath(reason) => vec![FieldError::new("path", reason.clone())],
        }
    }
}

/// Database-specific errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Database health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate key violation: {0}")]
    DuplicateKey(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

/// Push notification delivery errors
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Push gateway request failed: {0}")]
    GatewayRequestFailed(String),

    #[error("Push gateway rejected notification with status {status}: {body}")]
    GatewayRejected { status: u16, body: String },

    #[error("Stored push subscription is malformed: {0}")]
    InvalidSubscription(String),

    #[error("Failed to load subscription: {0}")]
    Lookup(#[from] DatabaseError),
}

/// Identity provider errors
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Identity provider request failed: {0}")]
    RequestFailed(String),

    #[error("Identity provider returned status {status}: {body}")]
    Rejected { status: u16, body: String },
}

// Implement From for common external errors
impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                // Check for specific database error codes
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => DatabaseError::DuplicateKey(db_err.message().to_string()),
                        "23503" => DatabaseError::ForeignKeyViolation(db_err.message().to_string()),
                        _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                    }
                } else {
                    DatabaseError::QueryFailed(db_err.message().to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(err.to_string())
    }
}

impl From<reqwest::Error> for NotificationError {
    fn from(err: reqwest::Error) -> Self {
        NotificationError::GatewayRequestFailed(err.to_string())
    }
}

impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        IdentityError::RequestFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_error_display() {
        let err = ScheduleError::InvalidCronExpression {
            expression: "* * * *".to_string(),
            reason: "invalid format".to_string(),
        };
        assert!(err.to_string().contains("Invalid cron expression"));
    }

    #[test]
    fn test_validation_error_flattens_field_list() {
        let err = ValidationError::Fields(vec![
            FieldError::new("email", "must be a valid email address"),
            FieldError::new("password", "must be at least 6 characters"),
        ]);
        let fields = err.field_errors();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "email");
    }

    #[test]
    fn test_rejected_body_and_path_name_their_source() {
        let body = ValidationError::InvalidJson("expected value at line 1".to_string());
        assert_eq!(body.field_errors()[0].field, "body");

        let path = ValidationError::InvalidPath("UUID parsing failed".to_string());
        assert_eq!(
            path.field_errors(),
            vec![FieldError::new("path", "UUID parsing failed")]
        );
    }

    #[test]
    fn test_gateway_rejection_display() {
        let err = NotificationError::GatewayRejected {
            status: 410,
            body: "subscription expired".to_string(),
        };
        assert!(err.to_string().contains("410"));
    }
}
