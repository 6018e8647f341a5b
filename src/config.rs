//! Application configuration management.
//!
//! Configuration comes from environment variables, deserialized into a
//! type-safe struct by the `envy` crate. A local `.env` file is loaded
//! first when present.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `OTP_TTL_MINUTES` (optional): verification code lifetime, defaults to 15
/// - `NOTIFY_URL` (optional): code delivery gateway; codes are logged when unset
/// - `NOTIFY_SECRET` (optional): HMAC secret for signing gateway payloads
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_otp_ttl_minutes")]
    pub otp_ttl_minutes: i64,

    #[serde(default)]
    pub notify_url: Option<String>,

    #[serde(default)]
    pub notify_secret: Option<String>,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

/// Default verification code lifetime.
fn default_otp_ttl_minutes() -> i64 {
    15
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Attempts to load a `.env` file first (optional), then reads the
    /// environment and deserializes it into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names map to upper-cased variables: notify_url -> NOTIFY_URL
        envy::from_env::<Config>()
    }
}
