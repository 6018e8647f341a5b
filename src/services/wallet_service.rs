//! Wallet recharges and balance queries.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::client::Client;
use crate::services::MAX_AMOUNT_CENTS;
use crate::store::ClientStore;

/// Balance operations over the [`ClientStore`] port.
#[derive(Clone)]
pub struct WalletService {
    clients: Arc<dyn ClientStore>,
}

impl WalletService {
    pub fn new(clients: Arc<dyn ClientStore>) -> Self {
        Self { clients }
    }

    /// Credit the client's wallet and return the new balance in cents.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest`: amount is zero, negative, or above the cap
    /// - `ClientNotFound`: no such client
    pub async fn recharge(&self, client_id: Uuid, amount_cents: i64) -> Result<i64, AppError> {
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

        let new_balance = self
            .clients
            .credit(client_id, amount_cents)
            .await?
            .ok_or(AppError::ClientNotFound)?;

        tracing::info!("Recharged client {} by {} cents", client_id, amount_cents);

        Ok(new_balance)
    }

    /// Fetch the client for a balance query.
    pub async fn balance(&self, client_id: Uuid) -> Result<Client, AppError> {
        self.clients
            .find_by_id(client_id)
            .await?
            .ok_or(AppError::ClientNotFound)
    }
}
