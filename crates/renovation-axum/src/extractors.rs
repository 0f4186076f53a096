//! Axum extractors for the bootstrapped request context.
//!
//! # Usage
//!
//! ```ignore
//! use renovation_axum::{SiteContext, TokenAuth};
//!
//! // Any request that passed the bootstrap
//! async fn whoami(ctx: SiteContext) -> String {
//!     ctx.user.clone().unwrap_or_else(|| "Guest".into())
//! }
//!
//! // Only requests authenticated by a bearer token (401 otherwise)
//! async fn download(auth: TokenAuth) -> String {
//!     format!("session {:?}", auth.session_id)
//! }
//! ```

use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use renovation_auth_core::RequestContext;

use crate::error::SiteAuthError;

/// The request context produced by [`crate::SiteAuthLayer`].
///
/// Flags set through this context (for example by issuing a token) are seen
/// by the layer when it flushes cookies.
#[derive(Debug, Clone)]
pub struct SiteContext(pub RequestContext);

impl Deref for SiteContext {
    type Target = RequestContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for SiteContext
where
    S: Send + Sync,
{
    type Rejection = SiteAuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .map(Self)
            .ok_or(SiteAuthError::MissingLayer)
    }
}

/// Extractor that requires bearer token authentication.
///
/// Returns 401 Unauthorized for cookie-authenticated requests.
#[derive(Debug, Clone)]
pub struct TokenAuth(pub RequestContext);

impl Deref for TokenAuth {
    type Target = RequestContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for TokenAuth
where
    S: Send + Sync,
{
    type Rejection = SiteAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let SiteContext(ctx) = SiteContext::from_request_parts(parts, state).await?;
        if !ctx.flags.is_token_authenticated() {
            return Err(SiteAuthError::TokenRequired);
        }
        Ok(Self(ctx))
    }
}
