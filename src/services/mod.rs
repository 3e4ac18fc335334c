pub mod account_service;
pub use account_service::{AccountError, AccountService, FieldErrors};

pub mod account_service_impl;
pub use account_service_impl::SeaOrmAccountService;

pub mod auth_service;
pub use auth_service::{AuthError, AuthService, IssuedToken};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod password_policy;
pub use password_policy::{PasswordPolicy, PasswordViolation, UserContext};
