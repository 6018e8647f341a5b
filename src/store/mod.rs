//! Storage ports for clients and transaction sessions.
//!
//! The payment orchestrator never talks to a database directly; it goes
//! through these traits. `postgres` is the production backend, `memory`
//! backs the test suites with the same semantics.
//!
//! Condition misses (insufficient balance, session no longer pending) are
//! modeled as outcome enums rather than errors, because they are expected
//! results of the protocol, not faults.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::client::{Client, NewClient};
use crate::models::session::{NewSession, TransactionSession};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Storage-layer failure.
///
/// Services surface this through `AppError::Storage`, which hides the
/// details from API clients.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of a conditional debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// The decrement applied; `new_balance_cents` is the balance after it.
    Applied { new_balance_cents: i64 },
    /// Balance was below the amount (or the client row vanished);
    /// nothing was mutated.
    InsufficientFunds,
}

/// Result of the combined approve-and-debit commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproveOutcome {
    /// Status moved `PENDING -> APPROVED` and the debit committed, as one
    /// atomic unit.
    Approved { new_balance_cents: i64 },
    /// The conditional debit missed; everything rolled back and the
    /// session is still `PENDING`.
    InsufficientFunds,
    /// The session was not `PENDING` anymore: a concurrent confirm won, or
    /// the session was already terminal.
    NotPending,
}

/// Access to client records and their balances.
///
/// `debit` is the atomic conditional decrement from the balance-store
/// contract: it must apply `balance >= amount` and the subtraction as one
/// indivisible step with respect to concurrent debits on the same client.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn create(&self, new: NewClient) -> Result<Client, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, StoreError>;

    async fn find_by_document(&self, document: &str) -> Result<Option<Client>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Client>, StoreError>;

    async fn list(&self) -> Result<Vec<Client>, StoreError>;

    /// Unconditional atomic increment. Returns the new balance, or `None`
    /// if no such client exists.
    async fn credit(&self, id: Uuid, amount_cents: i64) -> Result<Option<i64>, StoreError>;

    /// Conditional atomic decrement; see `DebitOutcome`.
    async fn debit(&self, id: Uuid, amount_cents: i64) -> Result<DebitOutcome, StoreError>;

    /// Persist the hash of an issued access token.
    async fn store_access_token(
        &self,
        client_id: Uuid,
        token_hash: &str,
    ) -> Result<(), StoreError>;

    /// Resolve an access-token hash back to its client.
    async fn find_by_access_token(&self, token_hash: &str) -> Result<Option<Client>, StoreError>;
}

/// Access to transaction sessions.
///
/// Status updates are guarded: a terminal session is never written again.
/// `approve_and_debit` spans the session row and the client row because
/// "debit implies approved" has to hold under concurrency; the two
/// mutations commit or abort together.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, new: NewSession) -> Result<TransactionSession, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TransactionSession>, StoreError>;

    /// Latch `PENDING -> REJECTED`. Returns whether the transition was
    /// taken; a session that is already terminal is left untouched.
    async fn mark_rejected(&self, id: Uuid) -> Result<bool, StoreError>;

    /// The confirm commit: move the session `PENDING -> APPROVED` and
    /// conditionally debit the client, atomically. See `ApproveOutcome`.
    async fn approve_and_debit(
        &self,
        session_id: Uuid,
        client_id: Uuid,
        amount_cents: i64,
    ) -> Result<ApproveOutcome, StoreError>;
}
