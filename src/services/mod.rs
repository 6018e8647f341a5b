//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! Each service owns the ports it needs and is constructed once at
//! startup; handlers reach them through the application state.

pub mod client_service;
pub mod payment_service;
pub mod wallet_service;

/// Upper bound for a single recharge or payment, in cents.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000;
