//! Shared harness for integration tests.
//!
//! Wires the real services over the in-memory store, with a notifier
//! that captures verification codes instead of delivering them.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use wallet_payment_server::models::client::{Client, NewClient};
use wallet_payment_server::notify::CodeNotifier;
use wallet_payment_server::services::client_service::ClientService;
use wallet_payment_server::services::payment_service::PaymentService;
use wallet_payment_server::services::wallet_service::WalletService;
use wallet_payment_server::store::{ClientStore, InMemoryStore};

/// Captures every code that would have been delivered.
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    /// The most recently captured code.
    pub fn last_code(&self) -> String {
        self.sent
            .lock()
            .unwrap()
            .last()
            .expect("no code was sent")
            .1
            .clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl CodeNotifier for RecordingNotifier {
    async fn send_code(&self, email: &str, _name: &str, code: &str, _ttl_minutes: i64) {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), code.to_string()));
    }
}

/// The whole service stack over one in-memory store.
pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub clients: ClientService,
    pub wallet: WalletService,
    pub payments: PaymentService,
}

impl TestApp {
    pub fn new(ttl_minutes: i64) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        Self {
            clients: ClientService::new(store.clone()),
            wallet: WalletService::new(store.clone()),
            payments: PaymentService::new(
                store.clone(),
                store.clone(),
                notifier.clone(),
                ttl_minutes,
            ),
            store,
            notifier,
        }
    }

    /// Seed a client directly in the store with a starting balance.
    pub async fn seed_client(&self, document: &str, balance_cents: i64) -> Client {
        self.store
            .create(NewClient {
                document: document.to_string(),
                name: format!("Client {}", document),
                email: format!("{}@example.com", document),
                phone: "3001234567".to_string(),
                balance_cents,
            })
            .await
            .unwrap()
    }
}
