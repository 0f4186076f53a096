//! In-memory host framework for testing

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use http::header::{ACCEPT_LANGUAGE, SET_COOKIE};
use http::request::Parts;
use http::{HeaderMap, HeaderValue, Method};
use parking_lot::Mutex;

use renovation_auth_core::{AuthError, CookieManager, RequestContext, SiteHost};

pub const TEST_SECRET: &str = "renovation-test-encryption-key-0123456789";
pub const TEST_SITE: &str = "site1.local";
pub const CSRF_HEADER: &str = "x-frappe-csrf-token";
pub const CSRF_TOKEN: &str = "csrf-ok";
pub const LOGIN_PATH: &str = "/api/method/login";
pub const NEW_SESSION: &str = "fresh-sid";

/// Step names recorded in call order
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

/// In-memory host with a session table
#[derive(Default)]
pub struct MockHost {
    sessions: Mutex<HashMap<String, String>>,
    stopped: Mutex<bool>,
    fail_connect: Mutex<bool>,
    /// Session id seen by each login call
    pub login_sessions: Mutex<Vec<Option<String>>>,
    pub calls: CallLog,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live session
    pub fn with_session(self, sid: &str, user: &str) -> Self {
        self.sessions.lock().insert(sid.to_string(), user.to_string());
        self
    }

    pub fn stop_sessions(&self) {
        *self.stopped.lock() = true;
    }

    pub fn fail_connect(&self) {
        *self.fail_connect.lock() = true;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn last_login_session(&self) -> Option<String> {
        self.login_sessions.lock().last().cloned().flatten()
    }
}

/// Cookie manager that writes the session cookie plus any extras
#[derive(Debug)]
pub struct MockCookies {
    pub pending: Vec<String>,
    calls: CallLog,
}

impl CookieManager for MockCookies {
    fn init_cookies(&mut self, ctx: &RequestContext) {
        self.calls.lock().push("init_cookies");
        if let Some(sid) = &ctx.session_id {
            self.pending.push(format!("sid={sid}; Path=/; HttpOnly"));
        }
    }

    fn clear_cookies(&mut self) {
        self.pending.clear();
    }

    fn flush_cookies(&mut self, headers: &mut HeaderMap) {
        for cookie in self.pending.drain(..) {
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                headers.append(SET_COOKIE, value);
            }
        }
    }
}

#[async_trait]
impl SiteHost for MockHost {
    type Cookies = MockCookies;

    fn resolve_language(&self, parts: &Parts) -> Option<String> {
        self.calls.lock().push("resolve_language");
        parts
            .headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.split(',').next())
            .map(|lang| lang.trim().to_string())
    }

    async fn connect(&self, _ctx: &RequestContext) -> Result<(), AuthError> {
        self.calls.lock().push("connect");
        if *self.fail_connect.lock() {
            return Err(AuthError::Database("connection refused".to_string()));
        }
        Ok(())
    }

    fn cookie_manager(&self, _ctx: &RequestContext) -> MockCookies {
        self.calls.lock().push("cookie_manager");
        MockCookies {
            pending: vec!["user_image=; Path=/".to_string()],
            calls: Arc::clone(&self.calls),
        }
    }

    async fn login(&self, parts: &Parts, ctx: &mut RequestContext) -> Result<(), AuthError> {
        self.calls.lock().push("login");
        self.login_sessions.lock().push(ctx.session_id.clone());

        if parts.uri.path() == LOGIN_PATH {
            self.sessions
                .lock()
                .insert(NEW_SESSION.to_string(), "jane@example.com".to_string());
            ctx.session_id = Some(NEW_SESSION.to_string());
            ctx.user = Some("jane@example.com".to_string());
            ctx.flags.mark_just_authenticated();
            return Ok(());
        }

        let user = ctx
            .session_id
            .as_ref()
            .and_then(|sid| self.sessions.lock().get(sid).cloned());
        match user {
            Some(user) => ctx.user = Some(user),
            None if ctx.flags.is_token_authenticated() => return Err(AuthError::SessionExpired),
            None => {
                ctx.session_id = Some("Guest".to_string());
                ctx.user = Some("Guest".to_string());
            }
        }
        Ok(())
    }

    fn language_code(&self, requested: &str) -> Option<String> {
        ["en", "de", "pt-BR"]
            .iter()
            .find(|code| code.eq_ignore_ascii_case(requested))
            .map(|code| code.to_string())
    }

    fn validate_csrf(&self, parts: &Parts, ctx: &RequestContext) -> Result<(), AuthError> {
        self.calls.lock().push("validate_csrf");
        if parts.method != Method::POST || ctx.flags.is_token_authenticated() {
            return Ok(());
        }
        let sent = parts.headers.get(CSRF_HEADER).and_then(|h| h.to_str().ok());
        if ctx.user.as_deref() != Some("Guest") && sent != Some(CSRF_TOKEN) {
            return Err(AuthError::InvalidCsrfToken);
        }
        Ok(())
    }

    async fn check_session_stopped(&self, _ctx: &RequestContext) -> Result<(), AuthError> {
        self.calls.lock().push("check_session_stopped");
        if *self.stopped.lock() {
            return Err(AuthError::SessionStopped(
                "Session stopped for maintenance".to_string(),
            ));
        }
        Ok(())
    }
}
