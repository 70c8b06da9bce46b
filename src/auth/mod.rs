pub mod extractors;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Role, User};

pub use extractors::{AdminUser, AuthenticatedUser};
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService};

lazy_static! {
    // Display names: letters, digits, spaces and ' . _ - ; must start with a letter or digit
    static ref NAME_REGEX: regex::Regex =
        regex::Regex::new(r"^[\p{L}\p{N}][\p{L}\p{N} '._-]*$").unwrap();
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name. At least 2 characters; letters, digits, spaces, `'`, `.`, `_`, `-`.
    #[validate(
        length(min = 2, message = "Name must be at least 2 characters long"),
        regex(
            path = "NAME_REGEX",
            message = "Name may only contain letters, digits, spaces and ' . _ -"
        )
    )]
    pub name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    /// Bootstrap-admin secret. Grants `admin` only when it matches the configured value.
    pub admin_token: Option<String>,
    /// Opaque reference to an already uploaded profile image.
    pub image_url: Option<String>,
}

/// Payload for `PATCH /api/auth/profile`. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    #[validate(
        length(min = 2, message = "Name must be at least 2 characters long"),
        regex(
            path = "NAME_REGEX",
            message = "Name may only contain letters, digits, spaces and ' . _ -"
        )
    )]
    pub name: Option<String>,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: Option<String>,
    pub image_url: Option<String>,
}

/// Response structure after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    /// The JWT for session authentication.
    pub token: String,
}

/// Emails are matched case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `admin` only when a bootstrap secret is configured and `supplied` matches it.
pub fn role_for_registration(supplied: Option<&str>, invite_token: Option<&str>) -> Role {
    match (supplied, invite_token) {
        (Some(given), Some(expected)) if given == expected => Role::Admin,
        _ => Role::Member,
    }
}
