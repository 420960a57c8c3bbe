use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
};
use std::convert::Infallible;

use crate::i18n::Locale;

/// Per-request data every error response needs: the path as the client sent
/// it (before router nesting strips it) and the caller's locale.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub path: String,
    pub locale: Locale,
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let path = parts.extensions.get::<OriginalUri>().map_or_else(
            || parts.uri.path().to_string(),
            |uri| uri.path().to_string(),
        );

        Ok(Self {
            path,
            locale: Locale::from_headers(&parts.headers),
        })
    }
}
