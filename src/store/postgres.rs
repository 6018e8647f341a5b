//! PostgreSQL implementation of the storage ports.
//!
//! # Atomicity Guarantees
//!
//! Balance updates are single guarded `UPDATE` statements; the guard and
//! the decrement execute as one statement under row-level locking.
//! `approve_and_debit` wraps the session status flip and the debit in a
//! database transaction so they commit or roll back together.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::DbPool;
use crate::models::client::{Client, NewClient};
use crate::models::session::{NewSession, SessionStatus, TransactionSession};
use crate::store::{ApproveOutcome, ClientStore, DebitOutcome, SessionStore, StoreError};

/// Postgres-backed store. Cheap to clone; wraps the shared pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientStore for PgStore {
    async fn create(&self, new: NewClient) -> Result<Client, StoreError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (document, name, email, phone, balance_cents)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.document)
        .bind(new.name)
        .bind(new.email)
        .bind(new.phone)
        .bind(new.balance_cents)
        .fetch_one(&self.pool)
        .await?;

        Ok(client)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    async fn find_by_document(&self, document: &str) -> Result<Option<Client>, StoreError> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE document = $1")
            .bind(document)
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Client>, StoreError> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    async fn list(&self) -> Result<Vec<Client>, StoreError> {
        let clients =
            sqlx::query_as::<_, Client>("SELECT * FROM clients ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(clients)
    }

    async fn credit(&self, id: Uuid, amount_cents: i64) -> Result<Option<i64>, StoreError> {
        let new_balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE clients
            SET balance_cents = balance_cents + $1,
                updated_at = NOW()
            WHERE id = $2
            RETURNING balance_cents
            "#,
        )
        .bind(amount_cents)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(new_balance)
    }

    async fn debit(&self, id: Uuid, amount_cents: i64) -> Result<DebitOutcome, StoreError> {
        // Guard and decrement in one statement: the row lock makes
        // concurrent debits serialize, so the balance can never go negative.
        let new_balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE clients
            SET balance_cents = balance_cents - $1,
                updated_at = NOW()
            WHERE id = $2 AND balance_cents >= $1
            RETURNING balance_cents
            "#,
        )
        .bind(amount_cents)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match new_balance {
            Some(new_balance_cents) => DebitOutcome::Applied { new_balance_cents },
            None => DebitOutcome::InsufficientFunds,
        })
    }

    async fn store_access_token(
        &self,
        client_id: Uuid,
        token_hash: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO auth_tokens (client_id, token_hash) VALUES ($1, $2)")
            .bind(client_id)
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_by_access_token(&self, token_hash: &str) -> Result<Option<Client>, StoreError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT c.* FROM clients c
            JOIN auth_tokens t ON t.client_id = c.id
            WHERE t.token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn create(&self, new: NewSession) -> Result<TransactionSession, StoreError> {
        let session = sqlx::query_as::<_, TransactionSession>(
            r#"
            INSERT INTO transaction_sessions (client_id, token_hash, amount_cents, status, expires_at)
            VALUES ($1, $2, $3, 'PENDING', $4)
            RETURNING *
            "#,
        )
        .bind(new.client_id)
        .bind(new.token_hash)
        .bind(new.amount_cents)
        .bind(new.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TransactionSession>, StoreError> {
        let session = sqlx::query_as::<_, TransactionSession>(
            "SELECT * FROM transaction_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn mark_rejected(&self, id: Uuid) -> Result<bool, StoreError> {
        // Guarded on status so a terminal session is never rewritten.
        let updated_count = sqlx::query(
            r#"
            UPDATE transaction_sessions
            SET status = $1,
                updated_at = NOW()
            WHERE id = $2 AND status = $3
            "#,
        )
        .bind(SessionStatus::Rejected)
        .bind(id)
        .bind(SessionStatus::Pending)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated_count > 0)
    }

    async fn approve_and_debit(
        &self,
        session_id: Uuid,
        client_id: Uuid,
        amount_cents: i64,
    ) -> Result<ApproveOutcome, StoreError> {
        // Start database transaction
        let mut tx = self.pool.begin().await?;

        // Claim the session first. Under two concurrent confirms exactly
        // one sees a PENDING row here; the other gets 0 rows and reports
        // NotPending without touching the balance.
        let claimed = sqlx::query(
            r#"
            UPDATE transaction_sessions
            SET status = $1,
                updated_at = NOW()
            WHERE id = $2 AND status = $3
            "#,
        )
        .bind(SessionStatus::Approved)
        .bind(session_id)
        .bind(SessionStatus::Pending)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if claimed == 0 {
            tx.rollback().await?;
            return Ok(ApproveOutcome::NotPending);
        }

        // Conditional debit. On a miss the rollback also undoes the status
        // flip above, leaving the session PENDING and retryable.
        let new_balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE clients
            SET balance_cents = balance_cents - $1,
                updated_at = NOW()
            WHERE id = $2 AND balance_cents >= $1
            RETURNING balance_cents
            "#,
        )
        .bind(amount_cents)
        .bind(client_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(new_balance_cents) = new_balance else {
            tx.rollback().await?;
            return Ok(ApproveOutcome::InsufficientFunds);
        };

        // Commit both changes atomically
        tx.commit().await?;

        Ok(ApproveOutcome::Approved { new_balance_cents })
    }
}
