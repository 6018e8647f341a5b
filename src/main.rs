//! Wallet Payment Service - Main Application Entry Point
//!
//! REST API server for a digital wallet with OTP-confirmed payments.
//! Clients register, recharge their wallet, and pay in two phases: a
//! payment request that sends a six-digit code out of band, and a
//! confirmation that verifies the code and debits the balance.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Wire services over the Postgres store
//! 5. Build HTTP router with routes and middleware
//! 6. Start server on configured port

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use wallet_payment_server::{
    AppState, config, db,
    notify::{CodeNotifier, HttpNotifier, LogNotifier},
    router,
    services::{
        client_service::ClientService, payment_service::PaymentService,
        wallet_service::WalletService,
    },
    store::PgStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    // One Postgres store serves as both the client and session backend
    let store = Arc::new(PgStore::new(pool.clone()));

    // Verification codes go to the gateway when configured, otherwise to the log
    let notifier: Arc<dyn CodeNotifier> = match config.notify_url {
        Some(ref url) => {
            tracing::info!("Delivering verification codes via {}", url);
            Arc::new(HttpNotifier::new(url, config.notify_secret.clone())?)
        }
        None => {
            tracing::warn!("NOTIFY_URL not set; verification codes will be written to the log");
            Arc::new(LogNotifier)
        }
    };

    let state = AppState {
        pool: pool.clone(),
        clients: ClientService::new(store.clone()),
        wallet: WalletService::new(store.clone()),
        payments: PaymentService::new(
            store.clone(),
            store.clone(),
            notifier,
            config.otp_ttl_minutes,
        ),
    };

    // Build HTTP router (public routes, authenticated group, middleware)
    let app = router(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    // This blocks forever, handling requests concurrently with tokio
    axum::serve(listener, app).await?;

    Ok(())
}
