//! Database connection pool and migration management.

use sqlx::{Pool, Postgres};

/// Type alias for the PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// The pool keeps a small set of connections alive and hands them out to
/// request handlers, so requests never open connections of their own.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection string is invalid
/// - Cannot connect to PostgreSQL server
/// - Database authentication fails
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        // Limit concurrent connections
        .max_connections(5)
        .connect(database_url)
        .await
}

/// Run database migrations from the `migrations/` directory.
///
/// Executes all pending SQL migration files in order. Applied migrations
/// are tracked in the `_sqlx_migrations` table, so each file runs once.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro embeds ./migrations at compile time
    sqlx::migrate!("./migrations").run(pool).await
}
