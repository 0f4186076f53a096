//! Capabilities the host framework provides to the bootstrap.
//!
//! Routing, session storage, CSRF policy and language negotiation stay with
//! the host. The bootstrap only orders these calls and adds the bearer
//! token handling around them.

use async_trait::async_trait;
use http::request::Parts;

use crate::context::RequestContext;
use crate::cookies::CookieManager;
use crate::AuthError;

/// Request lifecycle hooks of the host framework.
#[async_trait]
pub trait SiteHost: Send + Sync {
    /// The host's native cookie manager.
    type Cookies: CookieManager;

    /// Resolve the request language from content negotiation.
    fn resolve_language(&self, parts: &Parts) -> Option<String>;

    /// Open the database connection for this request.
    async fn connect(&self, ctx: &RequestContext) -> Result<(), AuthError>;

    /// Create the native cookie manager for this request.
    fn cookie_manager(&self, ctx: &RequestContext) -> Self::Cookies;

    /// Run the login/session manager.
    ///
    /// Consults `ctx.session_id` and fills in `ctx.user`. A login that
    /// creates a new session marks `ctx.flags` as just authenticated.
    async fn login(&self, parts: &Parts, ctx: &mut RequestContext) -> Result<(), AuthError>;

    /// Map a requested language to a supported language code.
    fn language_code(&self, requested: &str) -> Option<String>;

    /// Validate CSRF protection for the request.
    fn validate_csrf(&self, parts: &Parts, ctx: &RequestContext) -> Result<(), AuthError>;

    /// Fail if the resolved session has been stopped administratively.
    async fn check_session_stopped(&self, ctx: &RequestContext) -> Result<(), AuthError>;
}
