//! Client management HTTP handlers.
//!
//! This module implements the client-related API endpoints:
//! - POST /api/v1/clients - Register a new client
//! - POST /api/v1/auth/login - Authenticate and obtain an access token
//! - GET /api/v1/clients - List all clients
//! - GET /api/v1/clients/{document} - Get client by document number

use crate::{
    AppState,
    error::AppError,
    models::client::{ClientResponse, LoginRequest, LoginResponse, RegisterClientRequest},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// Register a new client.
///
/// # Endpoint
///
/// `POST /api/v1/clients`
///
/// # Request Body
///
/// ```json
/// {
///   "document": "12345678",
///   "name": "Maria Lopez",
///   "email": "maria@example.com",
///   "phone": "3001234567"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: Returns the created client with a zero balance
/// - **Error (400)**: Validation failed (document, phone, email or name)
/// - **Error (409)**: Document or email already registered
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "document": "12345678",
///   "name": "Maria Lopez",
///   "email": "maria@example.com",
///   "phone": "3001234567",
///   "balance_cents": 0,
///   "created_at": "2026-08-25T10:00:00Z"
/// }
/// ```
pub async fn register_client(
    State(state): State<AppState>,
    Json(request): Json<RegisterClientRequest>,
) -> Result<(StatusCode, Json<ClientResponse>), AppError> {
    let client = state.clients.register(request).await?;

    Ok((StatusCode::CREATED, Json(client.into())))
}

/// Authenticate a client and issue an access token.
///
/// # Endpoint
///
/// `POST /api/v1/auth/login`
///
/// # Request Body
///
/// ```json
/// {
///   "document": "12345678",
///   "phone": "3001234567"
/// }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: Returns the token and the client
/// - **Error (401)**: Document and phone do not identify a client
///
/// The raw token is shown only here; the server stores a hash of it.
/// Send it on protected routes as `Authorization: Bearer <token>`.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (client, token) = state.clients.login(&request.document, &request.phone).await?;

    Ok(Json(LoginResponse {
        token,
        client: client.into(),
    }))
}

/// List all registered clients, newest first.
///
/// # Endpoint
///
/// `GET /api/v1/clients`
pub async fn list_clients(
    State(state): State<AppState>,
) -> Result<Json<Vec<ClientResponse>>, AppError> {
    let clients = state.clients.list().await?;

    let responses: Vec<ClientResponse> = clients.into_iter().map(Into::into).collect();

    Ok(Json(responses))
}

/// Get a client by document number.
///
/// # Endpoint
///
/// `GET /api/v1/clients/{document}`
///
/// # Response
///
/// - **Success (200 OK)**: Returns the client
/// - **Error (404)**: No client with that document
pub async fn get_client(
    State(state): State<AppState>,
    Path(document): Path<String>,
) -> Result<Json<ClientResponse>, AppError> {
    let client = state.clients.find_by_document(&document).await?;

    Ok(Json(client.into()))
}
