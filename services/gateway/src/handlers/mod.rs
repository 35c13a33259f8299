//! REST handlers

pub mod account;
pub mod admin;
pub mod market;
pub mod orders;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;
use types::ids::SessionId;

use crate::middleware::session_from_headers;

/// Extracts the caller's session from `X-Session-ID`
pub struct RestSession(pub SessionId);

#[async_trait]
impl<S> FromRequestParts<S> for RestSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_from_headers(&parts.headers)))
    }
}
