//! Access token authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the access token from the Authorization header
//! 2. Resolve it to a client through the client service
//! 3. Inject authentication context into the request
//! 4. Reject unauthorized requests with HTTP 401

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{AppState, error::AppError};

/// Authentication context attached to authenticated requests.
///
/// Inserted into the request's extension map; route handlers extract it
/// to know which client made the request and to cross-check identity
/// fields carried in request bodies.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// ID of the authenticated client
    pub client_id: Uuid,

    /// Document number of the authenticated client
    pub document: String,

    /// Phone number of the authenticated client
    pub phone: String,
}

/// Access token authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` header from request
/// 2. Resolve the token via the client service (hash and lookup)
/// 3. If found: inject `AuthContext` into request, call next handler
/// 4. If not found: return 401 Unauthorized error
///
/// # Headers
///
/// Expected header format:
/// ```text
/// Authorization: Bearer 3f7c9a...
/// ```
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::InvalidAccessToken)?;

    // Expected format: "Bearer <token>"
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::InvalidAccessToken)?;

    // Hashing and lookup live in the client service.
    let client = state.clients.authenticate(token).await?;

    let auth_context = AuthContext {
        client_id: client.id,
        document: client.document,
        phone: client.phone,
    };

    // Route handlers extract this using Extension<AuthContext>
    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}
