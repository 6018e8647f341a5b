//! End-to-end tests for the two-phase payment protocol.
//!
//! These run the real services over the in-memory store, which shares
//! its conditional-update semantics with the Postgres backend.

mod common;

use common::TestApp;
use uuid::Uuid;
use wallet_payment_server::error::AppError;
use wallet_payment_server::models::session::SessionStatus;
use wallet_payment_server::store::{ClientStore, SessionStore};

#[tokio::test]
async fn approved_payment_debits_once_and_reports_receipt() {
    let app = TestApp::new(15);
    let client = app.seed_client("11111111", 100_000).await;

    let requested = app.payments.request_payment(client.id, 5_000).await.unwrap();
    let code = app.notifier.last_code();

    let receipt = app
        .payments
        .confirm_payment(requested.session_id, Some(client.id), &code)
        .await
        .unwrap();

    // The session id doubles as the transaction id.
    assert_eq!(receipt.transaction_id, requested.session_id);
    assert_eq!(receipt.amount_cents, 5_000);
    assert_eq!(receipt.new_balance_cents, 95_000);

    let stored = ClientStore::find_by_id(app.store.as_ref(), client.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.balance_cents, 95_000);

    let session = SessionStore::find_by_id(app.store.as_ref(), requested.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.status, SessionStatus::Approved);
}

#[tokio::test]
async fn second_confirmation_conflicts_and_money_moves_once() {
    let app = TestApp::new(15);
    let client = app.seed_client("11111111", 100_000).await;

    let requested = app.payments.request_payment(client.id, 5_000).await.unwrap();
    let code = app.notifier.last_code();

    app.payments
        .confirm_payment(requested.session_id, Some(client.id), &code)
        .await
        .unwrap();

    // Replaying the confirmation must not debit again.
    let err = app
        .payments
        .confirm_payment(requested.session_id, Some(client.id), &code)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyProcessed));

    let stored = ClientStore::find_by_id(app.store.as_ref(), client.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.balance_cents, 95_000);
}

#[tokio::test]
async fn expired_session_is_rejected_and_stays_rejected() {
    // Negative ttl makes every session expire immediately.
    let app = TestApp::new(-1);
    let client = app.seed_client("11111111", 100_000).await;

    let requested = app.payments.request_payment(client.id, 5_000).await.unwrap();
    let code = app.notifier.last_code();

    let err = app
        .payments
        .confirm_payment(requested.session_id, Some(client.id), &code)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SessionExpired));

    // The rejection was persisted by the failed confirm.
    let session = SessionStore::find_by_id(app.store.as_ref(), requested.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.status, SessionStatus::Rejected);

    // From now on the session reports its terminal state.
    let err = app
        .payments
        .confirm_payment(requested.session_id, Some(client.id), &code)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyRejected));

    // No money moved at any point.
    let stored = ClientStore::find_by_id(app.store.as_ref(), client.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.balance_cents, 100_000);
}

#[tokio::test]
async fn wrong_code_is_retryable_until_the_right_one_arrives() {
    let app = TestApp::new(15);
    let client = app.seed_client("11111111", 100_000).await;

    let requested = app.payments.request_payment(client.id, 5_000).await.unwrap();
    let code = app.notifier.last_code();

    // Codes are 100000..=999999, so six zeros never matches.
    let err = app
        .payments
        .confirm_payment(requested.session_id, Some(client.id), "000000")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCode));

    let session = SessionStore::find_by_id(app.store.as_ref(), requested.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.status, SessionStatus::Pending);

    let receipt = app
        .payments
        .confirm_payment(requested.session_id, Some(client.id), &code)
        .await
        .unwrap();
    assert_eq!(receipt.new_balance_cents, 95_000);
}

#[tokio::test]
async fn funds_are_checked_again_at_confirmation() {
    let app = TestApp::new(15);
    let client = app.seed_client("11111111", 10_000).await;

    // Advisory check passes with the balance intact.
    let requested = app.payments.request_payment(client.id, 8_000).await.unwrap();
    let code = app.notifier.last_code();

    // The balance drops before the code is submitted.
    app.store.debit(client.id, 5_000).await.unwrap();

    let err = app
        .payments
        .confirm_payment(requested.session_id, Some(client.id), &code)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds));

    // The session survives the failed attempt.
    let session = SessionStore::find_by_id(app.store.as_ref(), requested.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.status, SessionStatus::Pending);

    // A recharge makes the same session confirmable.
    app.wallet.recharge(client.id, 20_000).await.unwrap();
    let receipt = app
        .payments
        .confirm_payment(requested.session_id, Some(client.id), &code)
        .await
        .unwrap();
    assert_eq!(receipt.new_balance_cents, 25_000 - 8_000);
}

#[tokio::test]
async fn request_rejects_what_cannot_possibly_succeed() {
    let app = TestApp::new(15);
    let client = app.seed_client("11111111", 1_000).await;

    let err = app
        .payments
        .request_payment(client.id, 5_000)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds));

    let err = app.payments.request_payment(client.id, 0).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidRequest(_)));

    let err = app
        .payments
        .request_payment(Uuid::new_v4(), 5_000)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ClientNotFound));

    // None of the rejected requests dispatched a code.
    assert_eq!(app.notifier.sent_count(), 0);
}

#[tokio::test]
async fn confirming_an_unknown_session_is_not_found() {
    let app = TestApp::new(15);

    let err = app
        .payments
        .confirm_payment(Uuid::new_v4(), None, "123456")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SessionNotFound));
}

#[tokio::test]
async fn ownership_is_checked_before_anything_else() {
    let app = TestApp::new(15);
    let owner = app.seed_client("11111111", 100_000).await;
    let intruder = app.seed_client("22222222", 100_000).await;

    let requested = app.payments.request_payment(owner.id, 5_000).await.unwrap();
    let code = app.notifier.last_code();

    app.payments
        .confirm_payment(requested.session_id, Some(owner.id), &code)
        .await
        .unwrap();

    // Even on a terminal session, a foreign requestor learns nothing
    // beyond "not yours".
    let err = app
        .payments
        .confirm_payment(requested.session_id, Some(intruder.id), &code)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotSessionOwner));

    // Without a requestor the ownership check is skipped.
    let err = app
        .payments
        .confirm_payment(requested.session_id, None, &code)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyProcessed));
}

#[tokio::test]
async fn concurrent_confirmations_debit_exactly_once() {
    let app = TestApp::new(15);
    let client = app.seed_client("11111111", 100_000).await;

    let requested = app.payments.request_payment(client.id, 5_000).await.unwrap();
    let code = app.notifier.last_code();

    let (first, second) = tokio::join!(
        app.payments
            .confirm_payment(requested.session_id, Some(client.id), &code),
        app.payments
            .confirm_payment(requested.session_id, Some(client.id), &code),
    );

    // Exactly one side wins; the other sees the conflict.
    let (winner, loser) = match (first, second) {
        (Ok(receipt), Err(err)) | (Err(err), Ok(receipt)) => (receipt, err),
        other => panic!("expected exactly one success, got {:?}", other),
    };
    assert_eq!(winner.new_balance_cents, 95_000);
    assert!(matches!(loser, AppError::AlreadyProcessed));

    let stored = ClientStore::find_by_id(app.store.as_ref(), client.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.balance_cents, 95_000);
}

#[tokio::test]
async fn competing_sessions_never_drive_the_balance_negative() {
    let app = TestApp::new(15);
    let client = app.seed_client("11111111", 10_000).await;

    // Both requests pass the advisory check; no money has moved yet.
    let first = app.payments.request_payment(client.id, 8_000).await.unwrap();
    let first_code = app.notifier.last_code();
    let second = app.payments.request_payment(client.id, 8_000).await.unwrap();
    let second_code = app.notifier.last_code();

    let (a, b) = tokio::join!(
        app.payments
            .confirm_payment(first.session_id, Some(client.id), &first_code),
        app.payments
            .confirm_payment(second.session_id, Some(client.id), &second_code),
    );

    // Only one of the two fits in the balance.
    let results = [a, b];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    let failure = results
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("one confirmation must fail");
    assert!(matches!(failure, AppError::InsufficientFunds));

    let stored = ClientStore::find_by_id(app.store.as_ref(), client.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.balance_cents, 2_000);

    // The starved session is still pending and could succeed after a
    // recharge.
    let statuses = [
        SessionStore::find_by_id(app.store.as_ref(), first.session_id)
            .await
            .unwrap()
            .unwrap()
            .status,
        SessionStore::find_by_id(app.store.as_ref(), second.session_id)
            .await
            .unwrap()
            .unwrap()
            .status,
    ];
    assert!(statuses.contains(&SessionStatus::Approved));
    assert!(statuses.contains(&SessionStatus::Pending));
}
