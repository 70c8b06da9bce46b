//! Success envelope shared by every handler.
//!
//! Error envelopes are rendered by `AppError::error_response` with the same shape.

use actix_web::{http::StatusCode, HttpResponse};
use serde::{Deserialize, Serialize};

/// `{ "status": "success", "message": ..., "data": ... }`
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }
}

fn respond<T: Serialize>(status: StatusCode, message: impl Into<String>, data: T) -> HttpResponse {
    HttpResponse::build(status).json(Envelope::success(message, data))
}

/// 200 with the success envelope.
pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> HttpResponse {
    respond(StatusCode::OK, message, data)
}

/// 201 with the success envelope.
pub fn created<T: Serialize>(message: impl Into<String>, data: T) -> HttpResponse {
    respond(StatusCode::CREATED, message, data)
}
