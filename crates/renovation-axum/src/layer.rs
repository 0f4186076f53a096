//! Tower middleware layer running the site auth bootstrap.
//!
//! [`SiteAuthLayer`] bootstraps every request before the inner service sees
//! it, stores the [`RequestContext`] in the request extensions, and flushes
//! the host's cookies through the cookie gate once the response is ready.
//! Error responses from late bootstrap steps get the same flush.
//!
//! Urlencoded form bodies are buffered up front so that form fields such as
//! `_lang` are visible to the bootstrap; the handler receives the same bytes.

use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use renovation_auth_core::extract::is_urlencoded_form;
use renovation_auth_core::{
    AuthConfig, BootstrapFailure, Bootstrapped, ConfigError, CookieManager, FormFields,
    RequestBootstrap, RequestContext, SiteHost,
};
use tower::{Layer, Service};

use crate::error::SiteAuthError;

/// Default limit for buffered form bodies (2 MiB)
pub const DEFAULT_FORM_LIMIT: usize = 2 * 1024 * 1024;

/// Tower layer that adds site auth to requests.
pub struct SiteAuthLayer<H> {
    bootstrap: RequestBootstrap<H>,
    form_limit: usize,
}

impl<H> Clone for SiteAuthLayer<H> {
    fn clone(&self) -> Self {
        Self {
            bootstrap: self.bootstrap.clone(),
            form_limit: self.form_limit,
        }
    }
}

impl<H: SiteHost> SiteAuthLayer<H> {
    /// Create a layer for the given host framework.
    pub fn new(host: Arc<H>, config: &AuthConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_bootstrap(RequestBootstrap::new(host, config)?))
    }

    /// Create a layer from an existing bootstrap.
    #[must_use]
    pub fn from_bootstrap(bootstrap: RequestBootstrap<H>) -> Self {
        Self {
            bootstrap,
            form_limit: DEFAULT_FORM_LIMIT,
        }
    }

    /// Set the largest form body buffered before the bootstrap runs.
    #[must_use]
    pub fn with_form_limit(mut self, limit: usize) -> Self {
        self.form_limit = limit;
        self
    }
}

impl<S, H> Layer<S> for SiteAuthLayer<H> {
    type Service = SiteAuthService<S, H>;

    fn layer(&self, inner: S) -> Self::Service {
        SiteAuthService {
            inner,
            bootstrap: self.bootstrap.clone(),
            form_limit: self.form_limit,
        }
    }
}

/// The site auth service.
pub struct SiteAuthService<S, H> {
    inner: S,
    bootstrap: RequestBootstrap<H>,
    form_limit: usize,
}

impl<S: Clone, H> Clone for SiteAuthService<S, H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            bootstrap: self.bootstrap.clone(),
            form_limit: self.form_limit,
        }
    }
}

impl<S, H> Service<Request<Body>> for SiteAuthService<S, H>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    H: SiteHost + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // Keep the service that was driven to readiness
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let bootstrap = self.bootstrap.clone();
        let form_limit = self.form_limit;

        Box::pin(async move {
            let peer = req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr);
            let (mut parts, mut body) = req.into_parts();

            if is_urlencoded_form(&parts.headers) {
                let bytes = match axum::body::to_bytes(body, form_limit).await {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        tracing::debug!("Failed to buffer form body: {}", err);
                        return Ok(SiteAuthError::UnreadableBody.into_response());
                    }
                };
                parts.extensions.insert(FormFields::parse(&bytes));
                body = Body::from(bytes);
            }

            let Bootstrapped {
                context,
                mut cookies,
            } = match bootstrap.run(&parts, peer).await {
                Ok(done) => done,
                Err(failure) => return Ok(failure_response(failure)),
            };

            let flags = context.flags.clone();
            parts.extensions.insert::<RequestContext>(context);

            let mut response = inner.call(Request::from_parts(parts, body)).await?;
            cookies.flush_cookies(&flags, response.headers_mut());
            Ok(response)
        })
    }
}

fn failure_response<C: CookieManager>(mut failure: BootstrapFailure<C>) -> Response {
    let mut response = SiteAuthError::from(failure.error.clone()).into_response();
    failure.flush_cookies(response.headers_mut());
    response
}
