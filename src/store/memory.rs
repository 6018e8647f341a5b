//! In-memory implementation of the storage ports.
//!
//! Backs the test suites; nothing here persists. A single `RwLock` guards
//! clients, sessions and tokens together so `approve_and_debit` holds the
//! write lock across both mutations and keeps the same all-or-nothing
//! behavior as the Postgres backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::client::{Client, NewClient};
use crate::models::session::{NewSession, SessionStatus, TransactionSession};
use crate::store::{ApproveOutcome, ClientStore, DebitOutcome, SessionStore, StoreError};

#[derive(Default)]
struct Inner {
    clients: HashMap<Uuid, Client>,
    sessions: HashMap<Uuid, TransactionSession>,
    /// token hash -> client id
    tokens: HashMap<String, Uuid>,
}

/// A thread-safe in-memory store for clients and transaction sessions.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientStore for InMemoryStore {
    async fn create(&self, new: NewClient) -> Result<Client, StoreError> {
        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            document: new.document,
            name: new.name,
            email: new.email,
            phone: new.phone,
            balance_cents: new.balance_cents,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.write().await;
        inner.clients.insert(client.id, client.clone());
        Ok(client)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.clients.get(&id).cloned())
    }

    async fn find_by_document(&self, document: &str) -> Result<Option<Client>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .clients
            .values()
            .find(|c| c.document == document)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Client>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.clients.values().find(|c| c.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<Client>, StoreError> {
        let inner = self.inner.read().await;
        let mut clients: Vec<Client> = inner.clients.values().cloned().collect();
        clients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(clients)
    }

    async fn credit(&self, id: Uuid, amount_cents: i64) -> Result<Option<i64>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.clients.get_mut(&id).map(|client| {
            client.balance_cents += amount_cents;
            client.updated_at = Utc::now();
            client.balance_cents
        }))
    }

    async fn debit(&self, id: Uuid, amount_cents: i64) -> Result<DebitOutcome, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.clients.get_mut(&id) {
            Some(client) if client.balance_cents >= amount_cents => {
                client.balance_cents -= amount_cents;
                client.updated_at = Utc::now();
                Ok(DebitOutcome::Applied {
                    new_balance_cents: client.balance_cents,
                })
            }
            _ => Ok(DebitOutcome::InsufficientFunds),
        }
    }

    async fn store_access_token(
        &self,
        client_id: Uuid,
        token_hash: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.tokens.insert(token_hash.to_string(), client_id);
        Ok(())
    }

    async fn find_by_access_token(&self, token_hash: &str) -> Result<Option<Client>, StoreError> {
        let inner = self.inner.read().await;
        let client_id = match inner.tokens.get(token_hash) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(inner.clients.get(&client_id).cloned())
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn create(&self, new: NewSession) -> Result<TransactionSession, StoreError> {
        let now = Utc::now();
        let session = TransactionSession {
            id: Uuid::new_v4(),
            client_id: new.client_id,
            token_hash: new.token_hash,
            amount_cents: new.amount_cents,
            status: SessionStatus::Pending,
            expires_at: new.expires_at,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.write().await;
        inner.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TransactionSession>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.sessions.get(&id).cloned())
    }

    async fn mark_rejected(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.sessions.get_mut(&id) {
            Some(session) if session.status.is_pending() => {
                session.status = SessionStatus::Rejected;
                session.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn approve_and_debit(
        &self,
        session_id: Uuid,
        client_id: Uuid,
        amount_cents: i64,
    ) -> Result<ApproveOutcome, StoreError> {
        // One write lock across both checks and both mutations.
        let mut inner = self.inner.write().await;

        match inner.sessions.get(&session_id) {
            Some(session) if session.status.is_pending() => {}
            _ => return Ok(ApproveOutcome::NotPending),
        }

        let new_balance_cents = match inner.clients.get_mut(&client_id) {
            Some(client) if client.balance_cents >= amount_cents => {
                client.balance_cents -= amount_cents;
                client.updated_at = Utc::now();
                client.balance_cents
            }
            // Session untouched, still PENDING.
            _ => return Ok(ApproveOutcome::InsufficientFunds),
        };

        if let Some(session) = inner.sessions.get_mut(&session_id) {
            session.status = SessionStatus::Approved;
            session.updated_at = Utc::now();
        }

        Ok(ApproveOutcome::Approved { new_balance_cents })
    }
}
