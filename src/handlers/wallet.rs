//! Wallet HTTP handlers.
//!
//! This module implements the wallet-related API endpoints:
//! - POST /api/v1/wallet/recharge - Add money to the wallet
//! - GET /api/v1/wallet/balance - Query the current balance
//!
//! Both endpoints require authentication, and both carry the client's
//! document and phone so the server can cross-check them against the
//! authenticated identity. A mismatch is rejected with 403 before any
//! balance is touched or revealed.

use crate::{
    AppState,
    error::AppError,
    middleware::auth::AuthContext,
    models::client::{BalanceQuery, BalanceResponse, RechargeRequest, RechargeResponse},
};
use axum::{
    Extension, Json,
    extract::{Query, State},
};

/// Recharge the authenticated client's wallet.
///
/// # Endpoint
///
/// `POST /api/v1/wallet/recharge`
///
/// # Request Body
///
/// ```json
/// {
///   "document": "12345678",
///   "phone": "3001234567",
///   "amount_cents": 100000
/// }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: Returns the new balance
/// - **Error (400)**: Amount is zero, negative, or above the cap
/// - **Error (403)**: Document or phone does not match the token's client
pub async fn recharge(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<RechargeRequest>,
) -> Result<Json<RechargeResponse>, AppError> {
    // Identity fields in the body must match the authenticated client
    if request.document != auth.document || request.phone != auth.phone {
        return Err(AppError::IdentityMismatch);
    }

    let balance_cents = state
        .wallet
        .recharge(auth.client_id, request.amount_cents)
        .await?;

    Ok(Json(RechargeResponse { balance_cents }))
}

/// Query the authenticated client's balance.
///
/// # Endpoint
///
/// `GET /api/v1/wallet/balance?document=12345678&phone=3001234567`
///
/// # Response
///
/// - **Success (200 OK)**:
///
/// ```json
/// {
///   "balance_cents": 95000,
///   "document": "12345678",
///   "name": "Maria Lopez"
/// }
/// ```
///
/// - **Error (403)**: Document or phone does not match the token's client
pub async fn balance(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceResponse>, AppError> {
    if query.document != auth.document || query.phone != auth.phone {
        return Err(AppError::IdentityMismatch);
    }

    let client = state.wallet.balance(auth.client_id).await?;

    Ok(Json(BalanceResponse {
        balance_cents: client.balance_cents,
        document: client.document,
        name: client.name,
    }))
}
