use serde::{Deserialize, Serialize};

use crate::models::account::{Account, AccountUpdate, ProfileFields};
use crate::services::FieldErrors;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Field name to messages, present on validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            errors: None,
        }
    }

    pub fn field_errors(message: impl Into<String>, errors: FieldErrors) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            errors: Some(errors),
        }
    }
}

/// Public profile. The password and its hash are never part of it.
#[derive(Debug, Serialize)]
pub struct UserProfileDto {
    pub id: i32,
    pub email: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_staff: bool,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Account> for UserProfileDto {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            username: account.username,
            first_name: account.first_name,
            last_name: account.last_name,
            is_staff: account.is_staff,
            is_active: account.is_active,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl CreateUserRequest {
    #[must_use]
    pub fn profile(&self) -> ProfileFields {
        ProfileFields {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Unknown keys (including `email`) are ignored.
#[derive(Debug, Deserialize)]
pub struct UpdateSelfRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

impl From<UpdateSelfRequest> for AccountUpdate {
    fn from(req: UpdateSelfRequest) -> Self {
        Self {
            username: req.username,
            first_name: req.first_name,
            last_name: req.last_name,
            password: req.password,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
    pub uptime_seconds: u64,
}
