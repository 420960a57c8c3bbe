//! The closed set of failures an account operation can end in.

use thiserror::Error;

use crate::domain::{FieldErrors, UserId};
use crate::services::notification::NotificationError;
use crate::services::password::HashError;
use crate::services::user_store::StoreError;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Email address is already registered")]
    DuplicateEmail,

    #[error("Activation notification failed: {0}")]
    NotificationFailure(String),

    #[error("Invalid activation token")]
    InvalidToken,

    #[error("User {0} not found")]
    NotFound(UserId),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("User {0} may not be modified by the caller")]
    Forbidden(UserId),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            StoreError::DuplicateToken | StoreError::Database(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<HashError> for AccountError {
    fn from(err: HashError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<NotificationError> for AccountError {
    fn from(err: NotificationError) -> Self {
        Self::NotificationFailure(err.to_string())
    }
}

impl From<FieldErrors> for AccountError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}
