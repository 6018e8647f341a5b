//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Delegates to the services for business logic
//! 3. Returns HTTP response (JSON, status code)

/// Client registration, login and lookup endpoints
pub mod clients;

/// Health check endpoint
pub mod health;

/// Payment request and confirmation endpoints
pub mod payments;

/// Wallet recharge and balance endpoints
pub mod wallet;
