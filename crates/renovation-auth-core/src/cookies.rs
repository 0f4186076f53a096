//! Token-aware cookie flushing.
//!
//! The host framework keeps its own cookie manager; [`CookieGate`] wraps it
//! and decides, per response, whether the accumulated session cookies reach
//! the client at all.

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::context::{AuthFlags, RequestContext};

/// Response header naming the site that served the request
pub const CLIENT_SITE_HEADER: HeaderName = HeaderName::from_static("x-client-site");

/// The host framework's native cookie manager.
pub trait CookieManager: Send {
    /// Accumulate the session cookies for the response.
    ///
    /// `ctx` holds the session resolved by login, which may differ from the
    /// one the manager was created with.
    fn init_cookies(&mut self, ctx: &RequestContext);

    /// Drop every cookie accumulated so far.
    fn clear_cookies(&mut self);

    /// Write accumulated cookies into the response headers.
    fn flush_cookies(&mut self, headers: &mut HeaderMap);
}

/// What a flush did with the accumulated cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushDecision {
    /// Fresh login: accumulated cookies were discarded, then flushed
    ResetAndFlush,
    /// Token request: nothing was written
    Skip,
    /// Native flush
    Flush,
}

impl FlushDecision {
    /// Decide how to flush for a request with the given flags.
    ///
    /// A fresh login wins over token authentication.
    #[must_use]
    pub fn for_flags(flags: &AuthFlags) -> Self {
        if flags.is_just_authenticated() {
            Self::ResetAndFlush
        } else if flags.is_token_authenticated() {
            Self::Skip
        } else {
            Self::Flush
        }
    }
}

/// Cookie manager decorator installed for every request.
#[derive(Debug)]
pub struct CookieGate<C> {
    inner: C,
    site_header: Option<HeaderValue>,
}

impl<C: CookieManager> CookieGate<C> {
    /// Wrap the host's cookie manager for a site.
    pub fn new(inner: C, site_name: &str) -> Self {
        let site_header = HeaderValue::from_str(site_name).ok();
        if site_header.is_none() {
            tracing::warn!("Site name {:?} is not a valid header value", site_name);
        }
        Self { inner, site_header }
    }

    /// Accumulate the session cookies via the host manager.
    pub fn init_cookies(&mut self, ctx: &RequestContext) {
        self.inner.init_cookies(ctx);
    }

    /// Flush cookies onto a response according to the request flags.
    ///
    /// The site header is written whatever the decision.
    pub fn flush_cookies(&mut self, flags: &AuthFlags, headers: &mut HeaderMap) -> FlushDecision {
        if let Some(site) = &self.site_header {
            headers.insert(CLIENT_SITE_HEADER, site.clone());
        }

        let decision = FlushDecision::for_flags(flags);
        match decision {
            FlushDecision::ResetAndFlush => {
                self.inner.clear_cookies();
                self.inner.flush_cookies(headers);
            }
            FlushDecision::Skip => {
                tracing::trace!("Token authenticated request, leaving cookies untouched");
            }
            FlushDecision::Flush => self.inner.flush_cookies(headers),
        }
        decision
    }

    /// The wrapped host manager
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Mutable access to the wrapped host manager
    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }
}
