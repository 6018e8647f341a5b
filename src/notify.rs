//! Out-of-band delivery of verification codes.
//!
//! Delivery is advisory: the payment request succeeds whether or not the
//! code reaches the client, so implementations log failures instead of
//! returning them.
//!
//! Two implementations ship:
//! - [`HttpNotifier`] posts the code to an external delivery gateway,
//!   optionally signing the payload so the gateway can verify the sender.
//! - [`LogNotifier`] writes the code to the application log. Intended for
//!   development, where no gateway is running.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Delivery port for verification codes.
#[async_trait]
pub trait CodeNotifier: Send + Sync {
    /// Deliver `code` to the client identified by `email`.
    ///
    /// Must not fail the calling operation; implementations handle and
    /// log their own errors.
    async fn send_code(&self, email: &str, name: &str, code: &str, ttl_minutes: i64);
}

/// Posts verification codes to an HTTP delivery gateway.
///
/// # Headers Sent
///
/// - `Content-Type: application/json`
/// - `X-Notify-Signature: sha256=<hex>` (only when a secret is configured)
///
/// # Timeout
///
/// 5 seconds per delivery (prevents hanging on a slow gateway)
pub struct HttpNotifier {
    client: reqwest::Client,
    url: String,
    secret: Option<String>,
}

impl HttpNotifier {
    /// Build a notifier for the given gateway URL.
    ///
    /// # Rules
    ///
    /// - Must be a valid URL of at most 2048 characters
    /// - Must be HTTPS (HTTP localhost allowed for development)
    pub fn new(url: &str, secret: Option<String>) -> Result<Self, AppError> {
        validate_notify_url(url)?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::InvalidRequest(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
            secret,
        })
    }
}

#[async_trait]
impl CodeNotifier for HttpNotifier {
    async fn send_code(&self, email: &str, name: &str, code: &str, ttl_minutes: i64) {
        let payload = json!({
            "to": email,
            "name": name,
            "code": code,
            "ttl_minutes": ttl_minutes,
        });

        let payload_json = match serde_json::to_string(&payload) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to serialize notify payload: {}", e);
                return;
            }
        };

        // Logged before dispatch so the code is recoverable when the
        // gateway call fails and the session is already persisted.
        tracing::debug!("Dispatching verification code {} for {}", code, email);

        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json");

        if let Some(ref secret) = self.secret {
            request = request.header(
                "X-Notify-Signature",
                generate_signature(secret, &payload_json),
            );
        }

        match request.body(payload_json).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!("Verification code delivered to {}", email);
            }
            Ok(resp) => {
                tracing::error!(
                    "Notify gateway returned {} for {}",
                    resp.status().as_u16(),
                    email
                );
            }
            Err(e) => {
                tracing::error!("Failed to reach notify gateway for {}: {}", email, e);
            }
        }
    }
}

/// Writes verification codes to the application log instead of sending them.
pub struct LogNotifier;

#[async_trait]
impl CodeNotifier for LogNotifier {
    async fn send_code(&self, email: &str, name: &str, code: &str, ttl_minutes: i64) {
        tracing::info!(
            "Verification code for {} <{}>: {} (valid {} minutes)",
            name,
            email,
            code,
            ttl_minutes
        );
    }
}

/// Generate HMAC-SHA256 signature for a notify payload.
///
/// # Format
///
/// `sha256=<hex_encoded_hmac>`
fn generate_signature(secret: &str, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC key length is valid");
    mac.update(payload.as_bytes());
    let result = mac.finalize();
    format!("sha256={}", hex::encode(result.into_bytes()))
}

/// Validate the delivery gateway URL.
fn validate_notify_url(url: &str) -> Result<(), AppError> {
    if url.len() > 2048 {
        return Err(AppError::InvalidRequest(
            "Notify URL exceeds 2048 characters".to_string(),
        ));
    }

    // Parse URL
    let parsed = url::Url::parse(url)
        .map_err(|_| AppError::InvalidRequest("Invalid notify URL format".to_string()))?;

    // Check scheme
    match parsed.scheme() {
        "https" => Ok(()),
        "http" => {
            // Allow HTTP for localhost/127.0.0.1 (testing)
            if parsed.host_str() == Some("localhost")
                || parsed.host_str() == Some("127.0.0.1")
                || parsed.host_str() == Some("0.0.0.0")
            {
                Ok(())
            } else {
                Err(AppError::InvalidRequest(
                    "HTTP is only allowed for localhost. Use HTTPS for production.".to_string(),
                ))
            }
        }
        _ => Err(AppError::InvalidRequest(
            "Notify URL must use HTTP or HTTPS".to_string(),
        )),
    }
}
