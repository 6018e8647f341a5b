//! Transaction session models and payment API types.
//!
//! This module defines:
//! - `TransactionSession`: Database entity for one pending payment
//! - `SessionStatus`: The three-state confirmation machine
//! - Request types for the request/confirm endpoints
//! - `PaymentRequested` / `PaymentReceipt`: responses returned to clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a transaction session.
///
/// A session starts `Pending` and crosses exactly one terminal edge:
/// `Pending -> Approved` when the debit commits, or `Pending -> Rejected`
/// when expiry is detected at confirm time. Terminal states are immutable;
/// the guarded status updates in the stores are what enforce that.
///
/// Maps to the PostgreSQL `transaction_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SessionStatus {
    /// Whether the session can still be confirmed or rejected.
    pub fn is_pending(self) -> bool {
        matches!(self, SessionStatus::Pending)
    }
}

/// Represents a transaction session record from the database.
///
/// # Database Table
///
/// Maps to the `transaction_sessions` table. Each session:
/// - Belongs to one client (back-reference only)
/// - Fixes its amount at creation; it never changes afterwards
/// - Stores only the SHA-256 digest of the verification code
/// - Is kept forever for audit, even once terminal
///
/// This type deliberately does not implement `Serialize`: the token hash
/// must never travel past the confirm-comparison path.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionSession {
    /// Unique identifier, also used as the transaction id in receipts
    pub id: Uuid,

    /// Client this payment would debit
    pub client_id: Uuid,

    /// Hex SHA-256 digest of the verification code (plaintext never stored)
    pub token_hash: String,

    /// Payment amount in cents, immutable after creation
    pub amount_cents: i64,

    /// Current confirmation state
    pub status: SessionStatus,

    /// Absolute expiry; confirms after this instant latch the session
    /// to `Rejected`
    pub expires_at: DateTime<Utc>,

    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// When the session last changed state (audit only)
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for creating a session.
///
/// The orchestrator computes the expiry and hashes the code before the
/// store ever sees the session, so plaintext codes stay out of storage.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub client_id: Uuid,
    pub amount_cents: i64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Request body for starting a payment.
///
/// # JSON Example
///
/// ```json
/// {
///   "document": "1234567890",
///   "phone": "3001234567",
///   "amount_cents": 5000
/// }
/// ```
///
/// # Validation
///
/// - Document and phone must match the authenticated client
/// - Amount must be positive and within the allowed maximum
#[derive(Debug, Deserialize)]
pub struct PaymentRequestBody {
    pub document: String,
    pub phone: String,

    /// Amount to debit in cents
    pub amount_cents: i64,
}

/// Request body for confirming a payment.
///
/// # JSON Example
///
/// ```json
/// {
///   "session_id": "f3629535-5369-4f50-ae05-6d8716c6c06a",
///   "code": "826375"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentBody {
    /// Session id returned by the request endpoint
    pub session_id: Uuid,

    /// The 6-digit code delivered out-of-band
    pub code: String,
}

/// Response returned when a payment was requested.
///
/// The verification code itself is never part of the response; it travels
/// out-of-band through the notifier.
///
/// # JSON Example
///
/// ```json
/// {
///   "session_id": "f3629535-5369-4f50-ae05-6d8716c6c06a",
///   "expires_at": "2025-06-20T10:15:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct PaymentRequested {
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Response returned when a payment was confirmed.
///
/// # JSON Example
///
/// ```json
/// {
///   "transaction_id": "f3629535-5369-4f50-ae05-6d8716c6c06a",
///   "amount_cents": 5000,
///   "new_balance_cents": 95000
/// }
/// ```
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PaymentReceipt {
    /// The confirmed session's id
    pub transaction_id: Uuid,

    /// Amount that was debited in cents
    pub amount_cents: i64,

    /// Client balance after the debit
    pub new_balance_cents: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_is_pending() {
        assert!(SessionStatus::Pending.is_pending());
        assert!(!SessionStatus::Approved.is_pending());
        assert!(!SessionStatus::Rejected.is_pending());
    }

    #[test]
    fn status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Pending).unwrap(),
            "\"PENDING\""
        );
        assert_eq!(
            serde_json::from_str::<SessionStatus>("\"APPROVED\"").unwrap(),
            SessionStatus::Approved
        );
    }
}
