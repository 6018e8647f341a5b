//! Client registration, login and lookup.
//!
//! Login issues opaque access tokens. Only the SHA-256 hash of a token is
//! stored; the raw value is returned to the caller once and cannot be
//! recovered from the database.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::models::client::{Client, NewClient, RegisterClientRequest};
use crate::store::ClientStore;

/// Client account operations over the [`ClientStore`] port.
#[derive(Clone)]
pub struct ClientService {
    clients: Arc<dyn ClientStore>,
}

impl ClientService {
    pub fn new(clients: Arc<dyn ClientStore>) -> Self {
        Self { clients }
    }

    /// Register a new client with a zero balance.
    ///
    /// # Validation
    ///
    /// - `document`: 6 to 20 digits
    /// - `phone`: 10 to 15 digits
    /// - `email`: must contain `@`
    /// - `name`: must not be blank
    ///
    /// # Errors
    ///
    /// - `ClientExists`: document already registered
    /// - `EmailExists`: email already registered
    pub async fn register(&self, request: RegisterClientRequest) -> Result<Client, AppError> {
        validate_registration(&request)?;

        // Check for duplicates before inserting
        if self
            .clients
            .find_by_document(&request.document)
            .await?
            .is_some()
        {
            return Err(AppError::ClientExists);
        }
        if self.clients.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::EmailExists);
        }

        let client = self
            .clients
            .create(NewClient {
                document: request.document,
                name: request.name.trim().to_string(),
                email: request.email,
                phone: request.phone,
                balance_cents: 0,
            })
            .await?;

        tracing::info!("Registered client {}", client.id);

        Ok(client)
    }

    /// Authenticate by document and phone, issuing a fresh access token.
    ///
    /// Returns the client and the raw token. A mismatch on either field
    /// yields the same `InvalidCredentials` error, so callers cannot probe
    /// which half was wrong.
    pub async fn login(&self, document: &str, phone: &str) -> Result<(Client, String), AppError> {
        let client = self
            .clients
            .find_by_document(document)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if client.phone != phone {
            return Err(AppError::InvalidCredentials);
        }

        // Issue an opaque token; only its hash is persisted.
        let token = generate_token();
        self.clients
            .store_access_token(client.id, &hash_token(&token))
            .await?;

        Ok((client, token))
    }

    /// Resolve a raw access token to its client.
    pub async fn authenticate(&self, token: &str) -> Result<Client, AppError> {
        self.clients
            .find_by_access_token(&hash_token(token))
            .await?
            .ok_or(AppError::InvalidAccessToken)
    }

    /// Look up a client by document number.
    pub async fn find_by_document(&self, document: &str) -> Result<Client, AppError> {
        self.clients
            .find_by_document(document)
            .await?
            .ok_or(AppError::ClientNotFound)
    }

    /// List all clients, newest first.
    pub async fn list(&self) -> Result<Vec<Client>, AppError> {
        Ok(self.clients.list().await?)
    }
}

/// Validate the registration request fields.
fn validate_registration(request: &RegisterClientRequest) -> Result<(), AppError> {
    if !is_digits(&request.document, 6, 20) {
        return Err(AppError::InvalidRequest(
            "Document must be 6 to 20 digits".to_string(),
        ));
    }
    if !is_digits(&request.phone, 10, 15) {
        return Err(AppError::InvalidRequest(
            "Phone must be 10 to 15 digits".to_string(),
        ));
    }
    if request.name.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Name must not be empty".to_string(),
        ));
    }
    if !request.email.contains('@') {
        return Err(AppError::InvalidRequest(
            "Email must be a valid address".to_string(),
        ));
    }

    Ok(())
}

fn is_digits(value: &str, min_len: usize, max_len: usize) -> bool {
    (min_len..=max_len).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit())
}

/// Generate an opaque access token (32 random bytes, hex encoded).
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Hash a token for storage and lookup.
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
