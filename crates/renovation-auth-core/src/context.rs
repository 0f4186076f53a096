//! Per-request authentication context.
//!
//! [`RequestContext`] is built at the start of every request by the
//! bootstrap and travels through the pipeline explicitly. Nothing here is
//! shared between requests.

use std::sync::Arc;

use parking_lot::RwLock;

/// Loopback address used when the request carries no address information
pub const LOOPBACK_ADDRESS: &str = "127.0.0.1";

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "sid";

/// Session identifier of an anonymous visitor
pub const GUEST_SESSION: &str = "Guest";

/// Request-scoped authentication flags.
///
/// Cloning yields another handle to the same flags, so the host's login
/// machinery can mark a fresh login that the cookie gate observes at flush
/// time. Handles never outlive the request that created them.
#[derive(Debug, Clone, Default)]
pub struct AuthFlags {
    inner: Arc<RwLock<FlagState>>,
}

#[derive(Debug, Default)]
struct FlagState {
    just_authenticated: bool,
    bearer_token: Option<String>,
}

impl AuthFlags {
    /// Create a fresh set of flags for a new request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the request logged in during this cycle.
    pub fn mark_just_authenticated(&self) {
        self.inner.write().just_authenticated = true;
    }

    /// Record the bearer token that authenticates this request.
    pub fn set_bearer_token(&self, token: impl Into<String>) {
        self.inner.write().bearer_token = Some(token.into());
    }

    /// Whether the request logged in during this cycle.
    #[must_use]
    pub fn is_just_authenticated(&self) -> bool {
        self.inner.read().just_authenticated
    }

    /// Whether the request is authenticated by a bearer token.
    #[must_use]
    pub fn is_token_authenticated(&self) -> bool {
        self.inner.read().bearer_token.is_some()
    }

    /// The bearer token recorded for this request, if any.
    #[must_use]
    pub fn bearer_token(&self) -> Option<String> {
        self.inner.read().bearer_token.clone()
    }
}

/// Authentication context for one request-response cycle.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Client-visible domain with any `www.` prefix removed.
    pub domain: Option<String>,
    /// Originating network address of the client.
    pub source_address: String,
    /// Resolved request language.
    pub lang: Option<String>,
    /// Session identifier consulted by the login machinery.
    ///
    /// Starts as the `sid` cookie and is replaced by the token's `sid`
    /// when a bearer token authenticates the request.
    pub session_id: Option<String>,
    /// User resolved by the login machinery.
    pub user: Option<String>,
    /// Authentication flags read at response egress.
    pub flags: AuthFlags,
}

impl RequestContext {
    /// Create a new context for a request from the given address.
    #[must_use]
    pub fn new(source_address: impl Into<String>) -> Self {
        Self {
            domain: None,
            source_address: source_address.into(),
            lang: None,
            session_id: None,
            user: None,
            flags: AuthFlags::new(),
        }
    }

    /// Set the domain.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the session identifier.
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Set the user.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// The live session identifier, if the request has a non-guest session.
    #[must_use]
    pub fn live_session(&self) -> Option<&str> {
        self.session_id
            .as_deref()
            .filter(|sid| !sid.is_empty() && *sid != GUEST_SESSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_start_clear() {
        let flags = AuthFlags::new();
        assert!(!flags.is_just_authenticated());
        assert!(!flags.is_token_authenticated());
        assert_eq!(flags.bearer_token(), None);
    }

    #[test]
    fn test_flag_handles_share_state() {
        let ctx = RequestContext::new(LOOPBACK_ADDRESS);
        let handle = ctx.flags.clone();

        handle.mark_just_authenticated();
        handle.set_bearer_token("abc.def.ghi");

        assert!(ctx.flags.is_just_authenticated());
        assert_eq!(ctx.flags.bearer_token().as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_separate_requests_do_not_share_flags() {
        let first = RequestContext::new(LOOPBACK_ADDRESS);
        let second = RequestContext::new(LOOPBACK_ADDRESS);

        first.flags.mark_just_authenticated();
        assert!(!second.flags.is_just_authenticated());
    }

    #[test]
    fn test_live_session() {
        let ctx = RequestContext::new(LOOPBACK_ADDRESS);
        assert_eq!(ctx.live_session(), None);

        let guest = RequestContext::new(LOOPBACK_ADDRESS).with_session(GUEST_SESSION);
        assert_eq!(guest.live_session(), None);

        let empty = RequestContext::new(LOOPBACK_ADDRESS).with_session("");
        assert_eq!(empty.live_session(), None);

        let user = RequestContext::new(LOOPBACK_ADDRESS)
            .with_session("8a2f1c")
            .with_user("jane@example.com");
        assert_eq!(user.live_session(), Some("8a2f1c"));
    }
}
