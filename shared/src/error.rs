use thiserror::Error;
use validator::ValidationErrors;
use serde_json::Error as JsonError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum SharedError {
    #[error("Store unreadable: {0}")]
    StoreUnreadable(String),

    #[error("Store unwritable: {0}")]
    StoreUnwritable(String),

    #[error("Rating provider unavailable for {0}")]
    ProviderUnavailable(String),

    #[error("Identity provider unavailable: {0}")]
    IdentityUnavailable(String),

    #[error("Duplicate identity: {0}")]
    DuplicateIdentity(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl SharedError {
    /// Store-level failures abort a whole cycle; everything else is scoped to one record or command.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, SharedError::StoreUnreadable(_) | SharedError::StoreUnwritable(_))
    }
}

impl From<ValidationErrors> for SharedError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<JsonError> for SharedError {
    fn from(error: JsonError) -> Self {
        Self::BadRequest(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SharedError>;
