//! Mapping from [`AccountError`] to the wire-level [`ApiError`].
//!
//! [`map_error`] is a total function over the error variants; handlers never
//! build error bodies themselves.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::context::RequestContext;
use crate::constants::AUTH_REALM;
use crate::i18n::{Locale, Message};
use crate::services::AccountError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub validation_errors: Option<BTreeMap<String, String>>,
}

#[must_use]
pub fn map_error(err: &AccountError, path: &str, locale: Locale) -> (StatusCode, ApiError) {
    let (status, message, validation_errors) = match err {
        AccountError::Validation(fields) => {
            let details = fields
                .iter()
                .map(|(field, message)| (field.to_string(), message.resolve(locale).to_string()))
                .collect();
            (StatusCode::BAD_REQUEST, Message::ValidationFailed, Some(details))
        }
        AccountError::DuplicateEmail => (StatusCode::BAD_REQUEST, Message::EmailInUse, None),
        AccountError::NotificationFailure(_) => {
            (StatusCode::BAD_GATEWAY, Message::NotificationFailed, None)
        }
        AccountError::InvalidToken => (StatusCode::BAD_REQUEST, Message::InvalidToken, None),
        // Clients depend on 400 here rather than 404.
        AccountError::NotFound(_) => (StatusCode::BAD_REQUEST, Message::UserNotFound, None),
        AccountError::Unauthenticated => (
            StatusCode::UNAUTHORIZED,
            Message::AuthenticationRequired,
            None,
        ),
        AccountError::Forbidden(_) => (StatusCode::FORBIDDEN, Message::Forbidden, None),
        AccountError::Internal(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Message::Unexpected,
            None,
        ),
    };

    let body = ApiError {
        status: status.as_u16(),
        message: message.resolve(locale).to_string(),
        path: path.to_string(),
        validation_errors,
    };

    (status, body)
}

/// An [`AccountError`] bound to the request it happened in.
#[derive(Debug)]
pub struct AppError {
    pub error: AccountError,
    pub path: String,
    pub locale: Locale,
}

impl RequestContext {
    pub fn fail(&self, error: impl Into<AccountError>) -> AppError {
        AppError {
            error: error.into(),
            path: self.path.clone(),
            locale: self.locale,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self.error {
            AccountError::Internal(detail) => {
                tracing::error!(path = %self.path, "Internal error: {}", detail);
            }
            AccountError::NotificationFailure(detail) => {
                tracing::warn!(path = %self.path, "Mail service error: {}", detail);
            }
            other => {
                tracing::debug!(path = %self.path, "Request failed: {}", other);
            }
        }

        let (status, body) = map_error(&self.error, &self.path, self.locale);
        let mut response = (status, Json(body)).into_response();

        if matches!(self.error, AccountError::Unauthenticated) {
            let challenge = format!("Basic realm=\"{AUTH_REALM}\"");
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response.headers_mut().insert(WWW_AUTHENTICATE, value);
            }
        }

        response
    }
}
