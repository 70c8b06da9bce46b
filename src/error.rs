//!
//! # Custom Error Handling
//!
//! This module defines `AppError`, the single error type shared by the HTTP handlers,
//! the store implementations and the credential service.
//!
//! `AppError` implements `actix_web::error::ResponseError`, so a handler returning
//! `Err(AppError)` is rendered as the standard JSON envelope
//! `{ "status": "fail" | "error", "message": ..., "data": ... }`.
//! `From` conversions for `sqlx::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error` and `bcrypt::BcryptError` let the `?` operator do the rest.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use validator::ValidationErrors;

/// One rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Represents all possible errors that can occur within the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed request: unparsable JSON body, query string or path segment (HTTP 400).
    #[error("Bad Request: {0}")]
    BadRequest(String),

    /// Request fields failed validation (HTTP 422).
    #[error("Validation Error: {}", format_fields(.0))]
    Validation(Vec<FieldError>),

    /// Missing, invalid or expired credentials (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but the caller's role or relationship does not allow the action (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested record does not exist (HTTP 404).
    #[error("Not Found: {0}")]
    NotFound(String),

    /// The request collides with existing state, e.g. a duplicate email (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Errors raised by the database driver (HTTP 500).
    #[error("Database Error: {0}")]
    Database(String),

    /// Any other unexpected server-side failure (HTTP 500).
    #[error("Internal Server Error: {0}")]
    Internal(String),
}

fn format_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl AppError {
    /// Message shown to the client, without the variant prefix used by `Display`.
    pub fn message(&self) -> String {
        match self {
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Database(msg)
            | AppError::Internal(msg) => msg.clone(),
            AppError::Validation(_) => "Validation failed".to_string(),
        }
    }

    fn data(&self) -> Value {
        match self {
            AppError::Validation(fields) => json!(fields),
            _ => Value::Null,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let envelope_status = if status.is_server_error() {
            log::error!("{}", self);
            "error"
        } else {
            "fail"
        };

        HttpResponse::build(status).json(json!({
            "status": envelope_status,
            "message": self.message(),
            "data": self.data(),
        }))
    }
}

/// `RowNotFound` becomes `NotFound` and unique-index violations become `Conflict`;
/// everything else is a `Database` error.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Record already exists".into())
            }
            _ => AppError::Database(error.to_string()),
        }
    }
}

/// Flattens `validator` output into a field-sorted list of `{field, message}` pairs.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value ({})", e.code)),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::Validation(fields)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(format!("Invalid token: {:?}", error.kind()))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::Internal(error.to_string())
    }
}
