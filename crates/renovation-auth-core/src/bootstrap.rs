//! Per-request bootstrap with bearer token support.
//!
//! [`RequestBootstrap::run`] executes the request lifecycle in a fixed
//! order. The first failing step aborts the rest; once the cookie gate
//! exists it is returned with the error.

use std::net::SocketAddr;
use std::sync::Arc;

use http::request::Parts;
use http::HeaderMap;

use crate::config::{AuthConfig, ConfigError};
use crate::context::{AuthFlags, RequestContext};
use crate::cookies::{CookieGate, CookieManager, FlushDecision};
use crate::extract;
use crate::host::SiteHost;
use crate::token::TokenCodec;
use crate::AuthError;

/// Result of a successful bootstrap.
#[derive(Debug)]
pub struct Bootstrapped<C> {
    /// Context for the rest of the request.
    pub context: RequestContext,
    /// Cookie gate to flush onto the response.
    pub cookies: CookieGate<C>,
}

/// A bootstrap step failed.
///
/// Once the cookie gate exists it travels with the error, so the error
/// response still carries the site header and any cookies already written.
pub struct BootstrapFailure<C> {
    /// Error of the failing step.
    pub error: AuthError,
    /// Flags of the failed request.
    pub flags: AuthFlags,
    /// Cookie gate, if the failure happened after it was created.
    pub cookies: Option<CookieGate<C>>,
}

impl<C: CookieManager> BootstrapFailure<C> {
    /// Flush the gate onto the error response, if there is one.
    pub fn flush_cookies(&mut self, headers: &mut HeaderMap) -> Option<FlushDecision> {
        let flags = &self.flags;
        self.cookies
            .as_mut()
            .map(|gate| gate.flush_cookies(flags, headers))
    }
}

impl<C> From<BootstrapFailure<C>> for AuthError {
    fn from(failure: BootstrapFailure<C>) -> Self {
        failure.error
    }
}

impl<C> std::fmt::Debug for BootstrapFailure<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapFailure")
            .field("error", &self.error)
            .field("has_cookies", &self.cookies.is_some())
            .finish()
    }
}

impl<C> std::fmt::Display for BootstrapFailure<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl<C> std::error::Error for BootstrapFailure<C> {}

/// Runs the request lifecycle against a host framework.
pub struct RequestBootstrap<H> {
    host: Arc<H>,
    codec: TokenCodec,
    site_name: String,
    private_files_prefix: String,
}

impl<H> Clone for RequestBootstrap<H> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
            codec: self.codec.clone(),
            site_name: self.site_name.clone(),
            private_files_prefix: self.private_files_prefix.clone(),
        }
    }
}

impl<H: SiteHost> RequestBootstrap<H> {
    /// Create a bootstrap for the given host and config
    pub fn new(host: Arc<H>, config: &AuthConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            host,
            codec: TokenCodec::from_config(config)?,
            site_name: config.site_name.clone(),
            private_files_prefix: config.private_files_prefix.clone(),
        })
    }

    /// The host framework
    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// The codec used to verify bearer tokens
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Bootstrap one request.
    ///
    /// `peer` is the connection's remote address, used when no
    /// `X-Forwarded-For` header is present.
    pub async fn run(
        &self,
        parts: &Parts,
        peer: Option<SocketAddr>,
    ) -> Result<Bootstrapped<H::Cookies>, BootstrapFailure<H::Cookies>> {
        // Domain and source address
        let mut ctx = RequestContext::new(extract::source_address(&parts.headers, peer));
        ctx.domain = extract::client_domain(parts);
        ctx.session_id = extract::session_cookie(&parts.headers);

        if let Err(error) = self.authenticate(parts, &mut ctx).await {
            return Err(BootstrapFailure {
                error,
                flags: ctx.flags,
                cookies: None,
            });
        }

        // Cookie gate for this cycle
        let mut cookies = CookieGate::new(self.host.cookie_manager(&ctx), &self.site_name);

        match self.establish(parts, &mut ctx, &mut cookies).await {
            Ok(()) => Ok(Bootstrapped {
                context: ctx,
                cookies,
            }),
            Err(error) => Err(BootstrapFailure {
                error,
                flags: ctx.flags,
                cookies: Some(cookies),
            }),
        }
    }

    /// Language, connection and bearer token.
    async fn authenticate(&self, parts: &Parts, ctx: &mut RequestContext) -> Result<(), AuthError> {
        ctx.lang = self.host.resolve_language(parts);

        // Connect before token checks so failures are handled with a live connection
        self.host.connect(ctx).await?;

        // Bearer token replaces the cookie session
        if let Some(token) = extract::bearer_token(parts, &self.private_files_prefix) {
            ctx.flags.set_bearer_token(token.clone());
            let claims = self
                .codec
                .verify_for(&token, &ctx.source_address)
                .inspect_err(|e| {
                    tracing::debug!(
                        path = %parts.uri.path(),
                        source_address = %ctx.source_address,
                        "Bearer token rejected: {}",
                        e
                    );
                })?;
            tracing::trace!(user = %claims.sub, "Request authenticated by bearer token");
            ctx.session_id = Some(claims.sid);
        }
        Ok(())
    }

    /// Login through session check, with the cookie gate in place.
    async fn establish(
        &self,
        parts: &Parts,
        ctx: &mut RequestContext,
        cookies: &mut CookieGate<H::Cookies>,
    ) -> Result<(), AuthError> {
        self.host.login(parts, ctx).await?;

        // Explicit language override, form body before query string
        if let Some(requested) = extract::form_field(parts, extract::LANG_FIELD) {
            if let Some(lang) = self.host.language_code(&requested) {
                ctx.lang = Some(lang);
            }
        }

        self.host.validate_csrf(parts, ctx)?;

        // Write out latest cookies
        cookies.init_cookies(ctx);

        // Detected late: cookies are already written
        self.host.check_session_stopped(ctx).await
    }
}

impl<H> std::fmt::Debug for RequestBootstrap<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBootstrap")
            .field("site_name", &self.site_name)
            .field("private_files_prefix", &self.private_files_prefix)
            .finish_non_exhaustive()
    }
}
