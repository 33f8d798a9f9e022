use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use shared::SharedError;
use std::fmt;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl ApiError {
    pub fn new(error: &str, message: &str, status_code: u16) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status_code,
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BAD_REQUEST", message, 400)
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NOT_FOUND", message, 404)
    }

    pub fn conflict(message: &str) -> Self {
        Self::new("CONFLICT", message, 409)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("INTERNAL_ERROR", message, 500)
    }

    pub fn storage_error(message: &str) -> Self {
        Self::new("STORAGE_ERROR", message, 500)
    }

    pub fn upstream_error(message: &str) -> Self {
        Self::new("UPSTREAM_ERROR", message, 502)
    }

    pub fn validation_error(message: &str) -> Self {
        Self::new("VALIDATION_ERROR", message, 400)
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let status = match actix_web::http::StatusCode::from_u16(self.status_code) {
            Ok(status) => status,
            Err(_) => {
                log::warn!("Invalid status code {}, defaulting to 500", self.status_code);
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        HttpResponse::build(status).json(self)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl From<SharedError> for ApiError {
    fn from(err: SharedError) -> Self {
        let message = err.to_string();
        match err {
            SharedError::StoreUnreadable(_) | SharedError::StoreUnwritable(_) => {
                Self::storage_error(&message)
            }
            SharedError::ProviderUnavailable(_) | SharedError::IdentityUnavailable(_) => {
                Self::upstream_error(&message)
            }
            SharedError::DuplicateIdentity(_) => Self::conflict(&message),
            SharedError::NotFound(_) => Self::not_found(&message),
            SharedError::BadRequest(_) => Self::bad_request(&message),
            SharedError::Validation(_) => Self::validation_error(&message),
            SharedError::Configuration(_) | SharedError::Internal(_) => Self::internal_error(&message),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::bad_request(&format!("JSON error: {}", err))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::validation_error(&format!("Validation error: {}", err))
    }
}
