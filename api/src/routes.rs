use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::auth_middleware;
use crate::state::AppState;

/// Create the main application router with all routes and middleware
#[tracing::instrument(skip(state))]
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics_handler))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/auth/forgot-password",
            post(handlers::auth::forgot_password),
        );

    // Protected routes (bearer token required)
    let protected_routes = Router::new()
        // Account and plan
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/limit", patch(handlers::auth::update_limit))
        .route(
            "/api/auth/financial-plan",
            patch(handlers::auth::update_financial_plan),
        )
        .route("/api/auth/subscribe", post(handlers::auth::subscribe))
        // Daily expense log
        .route(
            "/api/transactions",
            get(handlers::transactions::list_transactions)
                .post(handlers::transactions::create_transaction),
        )
        .route(
            "/api/transactions/:id",
            delete(handlers::transactions::delete_transaction),
        )
        // Recurring bills
        .route(
            "/api/fixed-expenses",
            get(handlers::fixed_expenses::list_fixed_expenses)
                .post(handlers::fixed_expenses::create_fixed_expense),
        )
        .route(
            "/api/fixed-expenses/:id",
            delete(handlers::fixed_expenses::delete_fixed_expense),
        )
        .route(
            "/api/fixed-expenses/:id/pay",
            post(handlers::fixed_expenses::pay_fixed_expense),
        )
        // Reports
        .route("/api/reports/summary", get(handlers::reports::summary))
        .route(
            "/api/reports/categories",
            get(handlers::reports::categories),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
