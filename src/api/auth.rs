use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::observability::AuthenticatedUser;
use super::{ApiError, ApiResponse, AppState, TokenRequest, TokenResponse};
use crate::services::AuthError;

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the bearer token to an account and stores it as a request
/// extension. Accepts `Authorization: Bearer <token>` and
/// `Authorization: Token <token>`. The caller's id is echoed on the response
/// for the request span.
pub async fn require_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&headers).ok_or(AuthError::MissingToken)?;

    let account = state.auth_service().authorize(&token).await?;

    let user = AuthenticatedUser(account.id);
    request.extensions_mut().insert(account);

    let mut response = next.run(request).await;
    response.extensions_mut().insert(user);
    Ok(response)
}

/// Auth schemes are case-insensitive (RFC 7235).
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    let (scheme, token) = auth_str.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") && !scheme.eq_ignore_ascii_case("Token") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/user/token/
/// Exchange email and password for the account's token
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let issued = state
        .auth_service()
        .authenticate(&payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(TokenResponse {
        token: issued.token,
    })))
}
