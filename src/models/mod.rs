//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request/response types the API exchanges with clients.

/// Wallet holder model and account API types
pub mod client;
/// Transaction session model and payment API types
pub mod session;
