//! Two-phase payment confirmation.
//!
//! Phase one (`request_payment`) checks the balance, persists a PENDING
//! session holding only the hash of a one-time code, and hands the code to
//! the notifier for out-of-band delivery.
//!
//! Phase two (`confirm_payment`) runs a fixed sequence of checks and, when
//! they all pass, approves the session and debits the wallet in a single
//! atomic commit. Sessions are never deleted; every outcome is a status.
//!
//! # Expiry
//!
//! There is no background sweeper. An expired session stays PENDING in
//! storage until a confirm attempt observes the deadline, at which point
//! it is moved to REJECTED and the caller is told the code expired.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::session::{NewSession, PaymentReceipt, PaymentRequested, SessionStatus};
use crate::notify::CodeNotifier;
use crate::otp;
use crate::services::MAX_AMOUNT_CENTS;
use crate::store::{ApproveOutcome, ClientStore, SessionStore};

/// Payment orchestration over the storage and notifier ports.
#[derive(Clone)]
pub struct PaymentService {
    clients: Arc<dyn ClientStore>,
    sessions: Arc<dyn SessionStore>,
    notifier: Arc<dyn CodeNotifier>,
    ttl: Duration,
}

impl PaymentService {
    pub fn new(
        clients: Arc<dyn ClientStore>,
        sessions: Arc<dyn SessionStore>,
        notifier: Arc<dyn CodeNotifier>,
        ttl_minutes: i64,
    ) -> Self {
        Self {
            clients,
            sessions,
            notifier,
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Start a payment: persist a PENDING session and send the code.
    ///
    /// The balance check here is advisory. It rejects payments that cannot
    /// possibly succeed, but the balance may still change before
    /// confirmation; the binding check happens at confirm time.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest`: amount is zero, negative, or above the cap
    /// - `ClientNotFound`: no such client
    /// - `InsufficientFunds`: balance is below the amount right now
    pub async fn request_payment(
        &self,
        client_id: Uuid,
        amount_cents: i64,
    ) -> Result<PaymentRequested, AppError> {
        // Validate amount
        if amount_cents <= 0 {
            return Err(AppError::InvalidRequest(
                "Amount must be positive".to_string(),
            ));
        }
        if amount_cents > MAX_AMOUNT_CENTS {
            return Err(AppError::InvalidRequest(
                "Amount exceeds the maximum allowed".to_string(),
            ));
        }

        let client = self
            .clients
            .find_by_id(client_id)
            .await?
            .ok_or(AppError::ClientNotFound)?;

        if client.balance_cents < amount_cents {
            return Err(AppError::InsufficientFunds);
        }

        // Persist the hash only; the raw code never touches storage.
        let code = otp::generate();
        let session = self
            .sessions
            .create(NewSession {
                client_id: client.id,
                amount_cents,
                token_hash: otp::hash(&code),
                expires_at: Utc::now() + self.ttl,
            })
            .await?;

        tracing::info!(
            "Payment session {} created for client {} ({} cents)",
            session.id,
            client.id,
            amount_cents
        );

        // Delivery is best-effort; the session exists either way.
        self.notifier
            .send_code(&client.email, &client.name, &code, self.ttl.num_minutes())
            .await;

        Ok(PaymentRequested {
            session_id: session.id,
            expires_at: session.expires_at,
        })
    }

    /// Confirm a payment with the delivered code.
    ///
    /// Checks run in a fixed order, so callers always get the most
    /// specific error:
    ///
    /// 1. session exists
    /// 2. session belongs to `requestor` (skipped when `None`)
    /// 3. session was not already approved
    /// 4. session was not already rejected
    /// 5. session has not expired (expiry is persisted here)
    /// 6. code matches
    /// 7. balance covers the amount (atomic with the approval)
    ///
    /// A wrong code or an insufficient balance leaves the session PENDING,
    /// so the same session can be retried until it expires.
    pub async fn confirm_payment(
        &self,
        session_id: Uuid,
        requestor: Option<Uuid>,
        code: &str,
    ) -> Result<PaymentReceipt, AppError> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or(AppError::SessionNotFound)?;

        if let Some(requestor_id) = requestor {
            if session.client_id != requestor_id {
                return Err(AppError::NotSessionOwner);
            }
        }

        match session.status {
            SessionStatus::Approved => return Err(AppError::AlreadyProcessed),
            SessionStatus::Rejected => return Err(AppError::AlreadyRejected),
            SessionStatus::Pending => {}
        }

        // Lazy expiry: persist the rejection before reporting it.
        if Utc::now() > session.expires_at {
            if !self.sessions.mark_rejected(session.id).await? {
                // A concurrent confirm settled the session between our
                // status read and the latch; the guard left it untouched.
                return Err(self.settled_error(session.id).await);
            }
            tracing::info!("Payment session {} expired", session.id);
            return Err(AppError::SessionExpired);
        }

        if !otp::verify(code, &session.token_hash) {
            return Err(AppError::InvalidCode);
        }

        match self
            .sessions
            .approve_and_debit(session.id, session.client_id, session.amount_cents)
            .await?
        {
            ApproveOutcome::Approved { new_balance_cents } => {
                tracing::info!(
                    "Payment session {} approved ({} cents)",
                    session.id,
                    session.amount_cents
                );
                Ok(PaymentReceipt {
                    transaction_id: session.id,
                    amount_cents: session.amount_cents,
                    new_balance_cents,
                })
            }
            ApproveOutcome::InsufficientFunds => Err(AppError::InsufficientFunds),
            ApproveOutcome::NotPending => {
                // Lost a race with a concurrent confirm or expiry; report
                // what the session became.
                Err(self.settled_error(session.id).await)
            }
        }
    }

    /// The error for a session that settled out from under a caller:
    /// re-read it and report the state it actually reached.
    async fn settled_error(&self, session_id: Uuid) -> AppError {
        match self.sessions.find_by_id(session_id).await {
            Ok(Some(session)) => match session.status {
                SessionStatus::Rejected => AppError::AlreadyRejected,
                _ => AppError::AlreadyProcessed,
            },
            Ok(None) => AppError::SessionNotFound,
            Err(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::client::{Client, NewClient};
    use crate::models::session::TransactionSession;
    use crate::notify::CodeNotifier;
    use crate::store::{InMemoryStore, StoreError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Captures codes instead of delivering them.
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }

        fn last_code(&self) -> String {
            self.sent.lock().unwrap().last().unwrap().1.clone()
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

    struct Harness {
        store: Arc<InMemoryStore>,
        notifier: Arc<RecordingNotifier>,
        service: PaymentService,
        client: Client,
    }

    async fn harness(balance_cents: i64, ttl_minutes: i64) -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let client = ClientStore::create(
            store.as_ref(),
            NewClient {
                document: "12345678".to_string(),
                name: "Maria Lopez".to_string(),
                email: "maria@example.com".to_string(),
                phone: "3001234567".to_string(),
                balance_cents,
            },
        )
        .await
        .unwrap();
        let service = PaymentService::new(
            store.clone(),
            store.clone(),
            notifier.clone(),
            ttl_minutes,
        );
        Harness {
            store,
            notifier,
            service,
            client,
        }
    }

    #[tokio::test]
    async fn request_persists_the_hash_not_the_code() {
        let h = harness(100_000, 15).await;

        let requested = h.service.request_payment(h.client.id, 5_000).await.unwrap();
        let code = h.notifier.last_code();

        let session = SessionStore::find_by_id(h.store.as_ref(), requested.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.status, SessionStatus::Pending);
        assert_eq!(session.amount_cents, 5_000);
        assert_ne!(session.token_hash, code);
        assert_eq!(session.token_hash, otp::hash(&code));

        // The request phase must not move money.
        let client = ClientStore::find_by_id(h.store.as_ref(), h.client.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(client.balance_cents, 100_000);
    }

    #[tokio::test]
    async fn expiry_is_persisted_when_observed() {
        // Negative ttl: the session is born expired.
        let h = harness(100_000, -1).await;

        let requested = h.service.request_payment(h.client.id, 5_000).await.unwrap();
        let code = h.notifier.last_code();

        let err = h
            .service
            .confirm_payment(requested.session_id, None, &code)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SessionExpired));

        // The latch wrote REJECTED, so the next attempt reports that.
        let session = SessionStore::find_by_id(h.store.as_ref(), requested.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.status, SessionStatus::Rejected);

        let err = h
            .service
            .confirm_payment(requested.session_id, None, &code)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyRejected));
    }

    #[tokio::test]
    async fn wrong_code_leaves_the_session_retryable() {
        let h = harness(100_000, 15).await;

        let requested = h.service.request_payment(h.client.id, 5_000).await.unwrap();
        let code = h.notifier.last_code();
        // Six digits that cannot match: codes never start with '0'.
        let wrong = "000000";
        assert_ne!(wrong, code);

        let err = h
            .service
            .confirm_payment(requested.session_id, None, wrong)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCode));

        let session = SessionStore::find_by_id(h.store.as_ref(), requested.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.status, SessionStatus::Pending);

        // The right code still works afterwards.
        let receipt = h
            .service
            .confirm_payment(requested.session_id, None, &code)
            .await
            .unwrap();
        assert_eq!(receipt.transaction_id, requested.session_id);
        assert_eq!(receipt.amount_cents, 5_000);
        assert_eq!(receipt.new_balance_cents, 95_000);
    }

    /// Session store that approves the session out from under the caller
    /// the moment the expiry latch tries to reject it.
    struct SettleBeforeLatch {
        inner: Arc<InMemoryStore>,
        client_id: Uuid,
        amount_cents: i64,
    }

    #[async_trait]
    impl SessionStore for SettleBeforeLatch {
        async fn create(&self, new: NewSession) -> Result<TransactionSession, StoreError> {
            SessionStore::create(self.inner.as_ref(), new).await
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<TransactionSession>, StoreError> {
            SessionStore::find_by_id(self.inner.as_ref(), id).await
        }

        async fn mark_rejected(&self, id: Uuid) -> Result<bool, StoreError> {
            // Another confirmation wins right before the latch runs.
            self.inner
                .approve_and_debit(id, self.client_id, self.amount_cents)
                .await?;
            self.inner.mark_rejected(id).await
        }

        async fn approve_and_debit(
            &self,
            session_id: Uuid,
            client_id: Uuid,
            amount_cents: i64,
        ) -> Result<ApproveOutcome, StoreError> {
            self.inner
                .approve_and_debit(session_id, client_id, amount_cents)
                .await
        }
    }

    #[tokio::test]
    async fn lost_expiry_latch_reports_the_settled_state() {
        let store = Arc::new(InMemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let client = ClientStore::create(
            store.as_ref(),
            NewClient {
                document: "12345678".to_string(),
                name: "Maria Lopez".to_string(),
                email: "maria@example.com".to_string(),
                phone: "3001234567".to_string(),
                balance_cents: 100_000,
            },
        )
        .await
        .unwrap();

        let racing = Arc::new(SettleBeforeLatch {
            inner: store.clone(),
            client_id: client.id,
            amount_cents: 5_000,
        });
        // Negative ttl: the session is born expired.
        let service = PaymentService::new(store.clone(), racing, notifier.clone(), -1);

        let requested = service.request_payment(client.id, 5_000).await.unwrap();
        let code = notifier.last_code();

        // By the time the latch runs the session is APPROVED, so the
        // caller is told it settled, not that it expired.
        let err = service
            .confirm_payment(requested.session_id, None, &code)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyProcessed));

        let session = SessionStore::find_by_id(store.as_ref(), requested.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.status, SessionStatus::Approved);

        // The winner's debit is the only one that happened.
        let balance = ClientStore::find_by_id(store.as_ref(), client.id)
            .await
            .unwrap()
            .unwrap()
            .balance_cents;
        assert_eq!(balance, 95_000);
    }

    #[tokio::test]
    async fn requestor_must_own_the_session() {
        let h = harness(100_000, 15).await;

        let requested = h.service.request_payment(h.client.id, 5_000).await.unwrap();
        let code = h.notifier.last_code();

        let err = h
            .service
            .confirm_payment(requested.session_id, Some(Uuid::new_v4()), &code)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotSessionOwner));

        // The owner can still confirm.
        let receipt = h
            .service
            .confirm_payment(requested.session_id, Some(h.client.id), &code)
            .await
            .unwrap();
        assert_eq!(receipt.new_balance_cents, 95_000);
    }
}
