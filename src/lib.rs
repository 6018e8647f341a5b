//! OTP-gated wallet payment service.
//!
//! A REST API for a digital wallet where payments are confirmed in two
//! phases: a payment request that delivers a one-time code to the client
//! out of band, and a confirmation that checks the code and debits the
//! wallet atomically.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: opaque access tokens with SHA-256 hashing
//! - **Format**: JSON requests/responses
//!
//! Business logic lives in the services, which talk to storage through
//! the ports in [`store`]. The Postgres store backs the server; an
//! in-memory store with the same semantics backs the tests.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod otp;
pub mod services;
pub mod store;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::DbPool;
use crate::services::client_service::ClientService;
use crate::services::payment_service::PaymentService;
use crate::services::wallet_service::WalletService;

/// Shared application state, cloned into every handler.
///
/// The pool is kept alongside the services for the health check, which
/// pings the database directly.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub clients: ClientService,
    pub wallet: WalletService,
    pub payments: PaymentService,
}

/// Create the router with all endpoints: public client/auth/health routes
/// plus the bearer-authenticated wallet and payment group, wrapped in
/// tracing and CORS layers.
pub fn router(state: AppState) -> Router {
    // Authenticated routes (wallet and payment endpoints)
    let authenticated_routes = Router::new()
        .route("/api/v1/wallet/recharge", post(handlers::wallet::recharge))
        .route("/api/v1/wallet/balance", get(handlers::wallet::balance))
        .route(
            "/api/v1/payments/request",
            post(handlers::payments::request_payment),
        )
        .route(
            "/api/v1/payments/confirm",
            post(handlers::payments::confirm_payment),
        )
        // Apply authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        // Public routes (no authentication required)
        .route("/health", get(handlers::health::health_check))
        .route("/api/v1/clients", post(handlers::clients::register_client))
        .route("/api/v1/clients", get(handlers::clients::list_clients))
        .route(
            "/api/v1/clients/{document}",
            get(handlers::clients::get_client),
        )
        .route("/api/v1/auth/login", post(handlers::clients::login))
        // Merge authenticated routes
        .merge(authenticated_routes)
        // Tracing for observability, permissive CORS for browser clients
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        // Share state with all handlers via State extraction
        .with_state(state)
}
