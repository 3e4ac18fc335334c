use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::entities::users;

/// Maximum length of the optional profile text fields.
pub const PROFILE_FIELD_MAX_LEN: usize = 50;

/// Maximum length of an email address.
pub const EMAIL_MAX_LEN: usize = 254;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
            .expect("Invalid regex")
    })
}

/// An account as seen outside the store. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: i32,
    pub email: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub last_login: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for Account {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
            is_active: model.is_active,
            last_login: model.last_login,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Optional free-text fields supplied at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileFields {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Partial self-service update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AccountUpdate {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

impl AccountUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.password.is_none()
    }
}

/// Lower-cases the domain part of an email address.
///
/// Some mail providers treat the local part case-sensitively, so it is kept
/// verbatim. Input without an `@` is returned unchanged.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= EMAIL_MAX_LEN && email_regex().is_match(email)
}
