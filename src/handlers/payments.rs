//! Payment HTTP handlers.
//!
//! This module implements the two-phase payment endpoints:
//! - POST /api/v1/payments/request - Start a payment, delivering a code
//! - POST /api/v1/payments/confirm - Confirm a payment with the code

use crate::{
    AppState,
    error::AppError,
    middleware::auth::AuthContext,
    models::session::{ConfirmPaymentBody, PaymentReceipt, PaymentRequestBody, PaymentRequested},
};
use axum::{Extension, Json, extract::State, http::StatusCode};

/// Start a payment.
///
/// Creates a pending payment session and sends a one-time verification
/// code to the client out of band. No money moves here; the debit happens
/// at confirmation.
///
/// # Endpoint
///
/// `POST /api/v1/payments/request`
///
/// # Request Body
///
/// ```json
/// {
///   "document": "12345678",
///   "phone": "3001234567",
///   "amount_cents": 5000
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**:
///
/// ```json
/// {
///   "session_id": "770e8400-e29b-41d4-a716-446655440000",
///   "expires_at": "2026-08-25T10:15:00Z"
/// }
/// ```
///
/// - **Error (400)**: Invalid amount, or balance below the amount
/// - **Error (403)**: Document or phone does not match the token's client
pub async fn request_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<PaymentRequestBody>,
) -> Result<(StatusCode, Json<PaymentRequested>), AppError> {
    // Identity fields in the body must match the authenticated client
    if request.document != auth.document || request.phone != auth.phone {
        return Err(AppError::IdentityMismatch);
    }

    let requested = state
        .payments
        .request_payment(auth.client_id, request.amount_cents)
        .await?;

    Ok((StatusCode::CREATED, Json(requested)))
}

/// Confirm a payment with the delivered code.
///
/// On success the session is approved, the wallet is debited, and the
/// receipt reports the new balance. The session id doubles as the
/// transaction id.
///
/// # Endpoint
///
/// `POST /api/v1/payments/confirm`
///
/// # Request Body
///
/// ```json
/// {
///   "session_id": "770e8400-e29b-41d4-a716-446655440000",
///   "code": "482913"
/// }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**:
///
/// ```json
/// {
///   "transaction_id": "770e8400-e29b-41d4-a716-446655440000",
///   "amount_cents": 5000,
///   "new_balance_cents": 95000
/// }
/// ```
///
/// - **Error (400)**: Session expired, was rejected, or balance too low
/// - **Error (401)**: Wrong code, or session owned by another client
/// - **Error (404)**: Unknown session id
/// - **Error (409)**: Session was already confirmed
///
/// A wrong code or a low balance leaves the session pending, so the call
/// may be retried until the session expires.
pub async fn confirm_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<ConfirmPaymentBody>,
) -> Result<Json<PaymentReceipt>, AppError> {
    let receipt = state
        .payments
        .confirm_payment(request.session_id, Some(auth.client_id), &request.code)
        .await?;

    Ok(Json(receipt))
}
