// src/handlers.rs
use actix_web::{error::JsonPayloadError, HttpRequest, HttpResponse};
use serde::Serialize;
use crate::error::ApiError;

// ==================== COMMON STRUCTURES ====================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

/// Turns body deserialization failures (missing or mistyped fields) into
/// validation errors that name the offending field.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let api_error = match &err {
        JsonPayloadError::Deserialize(e) => ApiError::ValidationError(e.to_string()),
        JsonPayloadError::ContentType => {
            ApiError::ValidationError("Content type must be application/json".to_string())
        }
        JsonPayloadError::Serialize(e) => ApiError::InternalServerError(e.to_string()),
        other => ApiError::ValidationError(other.to_string()),
    };
    api_error.into()
}

pub async fn home() -> HttpResponse {
    HttpResponse::Ok().body("Medstock API is running!")
}
