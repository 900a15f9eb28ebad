use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use common::errors::AuthError;

use crate::handlers::ErrorResponse;
use crate::state::AppState;

/// Authentication middleware that validates bearer JWT tokens
///
/// Every token problem (missing header, wrong scheme, bad signature, expiry)
/// is answered with 401. Verified claims are inserted into the request
/// extensions for handlers to read.
#[tracing::instrument(skip(state, req, next))]
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ErrorResponse> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ErrorResponse::new("unauthorized", "Missing authorization token"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            tracing::warn!("Invalid authorization header format");
            ErrorResponse::new("unauthorized", "Invalid authorization header format")
        })?;

    let claims = state.jwt.decode_token(token).map_err(|e| match e {
        AuthError::TokenExpired => ErrorResponse::new("unauthorized", "Token has expired"),
        _ => ErrorResponse::new("unauthorized", "Invalid token"),
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
