//! Client data models and API request/response types.
//!
//! This module defines:
//! - `Client`: Database entity representing a wallet holder
//! - `NewClient`: Insert payload handed to the client store
//! - Request/response types for registration, login, balance and recharge

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a client record from the database.
///
/// # Database Table
///
/// Maps to the `clients` table. Each client is identified by an immutable
/// document number (unique) and carries a single wallet balance.
///
/// # Balance Storage
///
/// Balances are stored as `i64` cents to avoid floating-point precision
/// issues while keeping exactly two decimal digits.
///
/// For example:
/// - $10.50 is stored as 1050 cents
/// - $100.00 is stored as 10000 cents
///
/// The database enforces `balance_cents >= 0`; the conditional-debit query
/// is what keeps concurrent confirms from ever tripping that constraint.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Client {
    /// Unique identifier for this client
    pub id: Uuid,

    /// Identity document number (unique, immutable after registration)
    pub document: String,

    /// Display name
    pub name: String,

    /// Email address codes are delivered to (unique)
    pub email: String,

    /// Phone number, used together with the document as login credentials
    pub phone: String,

    /// Current wallet balance in cents (never negative)
    pub balance_cents: i64,

    /// Timestamp when the client registered
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last balance update
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for creating a client.
///
/// Passed to `ClientStore::create`; ids and timestamps are assigned by the
/// store.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub document: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Starting balance in cents (0 for ordinary registrations)
    pub balance_cents: i64,
}

/// Request body for registering a new client.
///
/// # JSON Example
///
/// ```json
/// {
///   "document": "1234567890",
///   "name": "Jane Roe",
///   "email": "jane@example.com",
///   "phone": "3001234567"
/// }
/// ```
///
/// # Validation
///
/// - `document`: 6 to 20 digits
/// - `phone`: 10 to 15 digits
/// - `email`: must look like an address
/// - `name`: non-empty
#[derive(Debug, Deserialize)]
pub struct RegisterClientRequest {
    pub document: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Request body for logging in.
///
/// Credentials are the registered document and phone pair.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub document: String,
    pub phone: String,
}

/// Response body for a successful login.
///
/// The `token` is an opaque bearer credential shown exactly once; only its
/// hash is stored server-side.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub client: ClientResponse,
}

/// Query parameters for the balance endpoint.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub document: String,
    pub phone: String,
}

/// Response body for the balance endpoint.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance_cents: i64,
    pub document: String,
    pub name: String,
}

/// Request body for recharging a wallet.
///
/// # JSON Example
///
/// ```json
/// {
///   "document": "1234567890",
///   "phone": "3001234567",
///   "amount_cents": 50000
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct RechargeRequest {
    pub document: String,
    pub phone: String,

    /// Amount to add in cents (must be positive)
    pub amount_cents: i64,
}

/// Response body for a recharge.
#[derive(Debug, Serialize)]
pub struct RechargeResponse {
    /// Balance after the credit was applied
    pub balance_cents: i64,
}

/// Response body for client endpoints.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "document": "1234567890",
///   "name": "Jane Roe",
///   "email": "jane@example.com",
///   "phone": "3001234567",
///   "balance_cents": 100000,
///   "created_at": "2025-06-20T10:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ClientResponse {
    pub id: Uuid,
    pub document: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub balance_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Client> for ClientResponse {
    fn from(client: Client) -> Self {
        Self {
            id: client.id,
            document: client.document,
            name: client.name,
            email: client.email,
            phone: client.phone,
            balance_cents: client.balance_cents,
            created_at: client.created_at,
        }
    }
}
