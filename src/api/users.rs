use axum::{Extension, Json, extract::State, http::StatusCode};
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState, CreateUserRequest, UpdateSelfRequest, UserProfileDto,
};
use crate::models::account::{Account, AccountUpdate};

/// POST /api/user/create/
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserProfileDto>>), ApiError> {
    let account = state
        .account_service()
        .register(&payload.email, &payload.password, &payload.profile())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(account.into())),
    ))
}

/// GET /api/user/self
pub async fn get_self(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<Account>,
) -> Result<Json<ApiResponse<UserProfileDto>>, ApiError> {
    let account = state.account_service().get_profile(account.id).await?;
    Ok(Json(ApiResponse::success(account.into())))
}

/// PATCH /api/user/self
pub async fn update_self(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<Account>,
    Json(payload): Json<UpdateSelfRequest>,
) -> Result<Json<ApiResponse<UserProfileDto>>, ApiError> {
    let update = AccountUpdate::from(payload);
    let account = state
        .account_service()
        .update_self(&account, &update)
        .await?;

    Ok(Json(ApiResponse::success(account.into())))
}
