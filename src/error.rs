// src/error.rs
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    ValidationError(String),
    InsufficientStock { available: i64, requested: i64 },
    DataUnavailable(String),
    InternalServerError(String),
    DatabaseError(sqlx::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: &'static str,
    message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            ApiError::InsufficientStock { available, requested } => write!(
                f,
                "Insufficient stock. Available: {}, Requested: {}",
                available, requested
            ),
            ApiError::DataUnavailable(msg) => write!(f, "Data Unavailable: {}", msg),
            ApiError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::DatabaseError(err) => write!(f, "Database Error: {}", err),
        }
    }
}

impl ApiError {
    /// Stable machine-readable kind for the error payload
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::ValidationError(_) => "validation_error",
            ApiError::InsufficientStock { .. } => "insufficient_stock",
            ApiError::DataUnavailable(_) => "data_unavailable",
            ApiError::InternalServerError(_) | ApiError::DatabaseError(_) => "internal",
        }
    }

    /// Message that is safe to hand to the caller. Internal details stay in the log.
    fn public_message(&self) -> String {
        match self {
            ApiError::InternalServerError(_) | ApiError::DatabaseError(_) => {
                "Internal server error".to_string()
            }
            ApiError::DataUnavailable(_) => {
                "Inventory data is currently unavailable".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::InternalServerError(_) | ApiError::DatabaseError(_) | ApiError::DataUnavailable(_) => {
                log::error!("{}", self);
            }
            _ => log::debug!("{}", self),
        }

        let error_response = ErrorResponse {
            success: false,
            error: self.kind(),
            message: self.public_message(),
        };

        HttpResponse::build(self.status_code()).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::InsufficientStock { .. } => StatusCode::CONFLICT,
            ApiError::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(err)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        ApiError::ValidationError(format!("Malformed CSV: {}", err))
    }
}

// Domain specific constructors
impl ApiError {
    pub fn batch_not_found(id: i64) -> Self {
        ApiError::NotFound(format!("Stock batch with ID '{}' not found", id))
    }

    pub fn medicine_not_found(id: i64) -> Self {
        ApiError::NotFound(format!("Medicine with ID '{}' not found", id))
    }

    pub fn insufficient_stock(available: i64, requested: i64) -> Self {
        ApiError::InsufficientStock { available, requested }
    }

    pub fn missing_field(field: &str) -> Self {
        ApiError::ValidationError(format!("Missing required field: {}", field))
    }

    pub fn data_unavailable(err: impl fmt::Display) -> Self {
        ApiError::DataUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::batch_not_found(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::insufficient_stock(40, 50).status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::missing_field("quantity").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::data_unavailable("pool closed").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_insufficient_stock_mentions_available() {
        let err = ApiError::insufficient_stock(40, 50);
        assert!(err.to_string().contains("Available: 40"));
        assert_eq!(err.kind(), "insufficient_stock");
    }

    #[actix_rt::test]
    async fn test_internal_detail_not_exposed() {
        let err = ApiError::InternalServerError("disk I/O error at page 42".to_string());
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("page 42"));
        assert!(text.contains("\"error\":\"internal\""));
    }
}
