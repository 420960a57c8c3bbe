use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Basic};

use super::AppState;
use crate::domain::{PlaintextPassword, User};
use crate::services::AccountError;

/// Credentials from an `Authorization: Basic` header.
///
/// `Ok(None)` means no header was sent; a header that is present but not
/// valid Basic credentials is an authentication failure.
fn basic_credentials(
    headers: &HeaderMap,
) -> Result<Option<(String, PlaintextPassword)>, AccountError> {
    if !headers.contains_key(AUTHORIZATION) {
        return Ok(None);
    }

    let basic = headers
        .typed_get::<Authorization<Basic>>()
        .ok_or(AccountError::Unauthenticated)?;

    Ok(Some((
        basic.username().to_string(),
        PlaintextPassword::new(basic.password()),
    )))
}

async fn authenticate(
    state: &AppState,
    email: &str,
    password: &PlaintextPassword,
) -> Result<User, AccountError> {
    let user = state.users.authenticate(email, password).await?;
    tracing::Span::current().record("user_id", user.id.value());
    Ok(user)
}

/// Resolves the caller for a guarded route. Missing or wrong credentials are
/// both [`AccountError::Unauthenticated`].
pub async fn require_caller(state: &AppState, headers: &HeaderMap) -> Result<User, AccountError> {
    let (email, password) = basic_credentials(headers)?.ok_or(AccountError::Unauthenticated)?;
    authenticate(state, &email, &password).await
}

/// Resolves the caller on an open route. Anonymous requests yield `None`;
/// credentials that were sent must still be valid.
pub async fn optional_caller(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<User>, AccountError> {
    match basic_credentials(headers)? {
        Some((email, password)) => authenticate(state, &email, &password).await.map(Some),
        None => Ok(None),
    }
}
