//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::store::StoreError;

/// Application-wide error type.
///
/// This enum represents all possible errors that can occur in the application.
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Storage Errors**: Any failure from the backing store
/// - **Authentication Errors**: Invalid or missing access tokens, bad credentials
/// - **Resource Errors**: Requested clients or sessions not found
/// - **Payment Errors**: Violations of the confirmation state machine
/// - **Validation Errors**: Invalid request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The backing store failed (connection error, query error).
    ///
    /// Returns HTTP 500 with details hidden from the client.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Access token is missing, malformed, or unknown.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid access token")]
    InvalidAccessToken,

    /// Login credentials (document + phone) do not identify a client.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Submitted identity fields do not match the authenticated client.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Provided data does not match the authenticated client")]
    IdentityMismatch,

    /// No client exists for the given id or document.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Client not found")]
    ClientNotFound,

    /// A client with the same document is already registered.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Client already exists")]
    ClientExists,

    /// A client with the same email is already registered.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Email already registered")]
    EmailExists,

    /// No transaction session exists for the given id.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Payment session not found")]
    SessionNotFound,

    /// The session belongs to a different client than the requestor.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Session does not belong to the authenticated client")]
    NotSessionOwner,

    /// The session was already confirmed; the debit happened exactly once.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Transaction was already processed")]
    AlreadyProcessed,

    /// The session was rejected earlier and can never be confirmed.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Transaction was previously rejected")]
    AlreadyRejected,

    /// The confirmation window elapsed; the session is now rejected.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Verification code expired, request a new payment")]
    SessionExpired,

    /// The submitted code does not match the session's code.
    ///
    /// The session stays pending, so the caller may retry until expiry.
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid verification code")]
    InvalidCode,

    /// Balance is lower than the requested amount.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Insufficient balance")]
    InsufficientFunds,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),
}

/// Convert AppError into an HTTP response.
///
/// This implementation allows Axum handlers to return `Result<T, AppError>`
/// and have errors automatically converted to proper HTTP responses.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map each error variant to (HTTP status, error code, message)
        let (status, code, message) = match self {
            AppError::InvalidAccessToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_access_token",
                self.to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                self.to_string(),
            ),
            AppError::IdentityMismatch => {
                (StatusCode::FORBIDDEN, "identity_mismatch", self.to_string())
            }
            AppError::ClientNotFound => {
                (StatusCode::NOT_FOUND, "client_not_found", self.to_string())
            }
            AppError::ClientExists => (StatusCode::CONFLICT, "client_exists", self.to_string()),
            AppError::EmailExists => (StatusCode::CONFLICT, "email_exists", self.to_string()),
            AppError::SessionNotFound => {
                (StatusCode::NOT_FOUND, "session_not_found", self.to_string())
            }
            AppError::NotSessionOwner => (
                StatusCode::UNAUTHORIZED,
                "not_session_owner",
                self.to_string(),
            ),
            AppError::AlreadyProcessed => {
                (StatusCode::CONFLICT, "already_processed", self.to_string())
            }
            AppError::AlreadyRejected => (
                StatusCode::BAD_REQUEST,
                "already_rejected",
                self.to_string(),
            ),
            AppError::SessionExpired => {
                (StatusCode::BAD_REQUEST, "session_expired", self.to_string())
            }
            AppError::InvalidCode => (StatusCode::UNAUTHORIZED, "invalid_code", self.to_string()),
            AppError::InsufficientFunds => (
                StatusCode::BAD_REQUEST,
                "insufficient_funds",
                self.to_string(),
            ),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Storage(ref err) => {
                // Log the cause; the client only sees a generic message.
                tracing::error!("Storage failure: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        // Build JSON response body
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        // Return the response with status code and JSON body
        (status, body).into_response()
    }
}
