//! Request inspection helpers used by the bootstrap.

use std::net::SocketAddr;

use http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, HOST};
use http::request::Parts;
use http::{HeaderMap, HeaderName, Uri};

use crate::context::LOOPBACK_ADDRESS;

/// Proxy-supplied client address chain
pub const FORWARDED_FOR_HEADER: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Query parameter carrying a token on private file links
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Form/query field overriding the request language
pub const LANG_FIELD: &str = "_lang";

/// Media type of bodies whose fields are visible to the bootstrap
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Fields of a buffered `application/x-www-form-urlencoded` body.
///
/// Placed in the request extensions by whoever buffers the body, before the
/// bootstrap runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    /// Parse a urlencoded body. Invalid UTF-8 is replaced, not rejected.
    pub fn parse(body: &[u8]) -> Self {
        Self(pairs(&String::from_utf8_lossy(body)).collect())
    }

    /// First value of a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Whether the request body is a urlencoded form.
pub fn is_urlencoded_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(FORM_URLENCODED))
}

/// Client-visible domain of the request, without a leading `www.`.
pub fn client_domain(parts: &Parts) -> Option<String> {
    let host = parts
        .headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))?;

    if host.is_empty() {
        return None;
    }
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Originating address of the request.
///
/// The first `X-Forwarded-For` entry wins, then the connection's peer
/// address, then loopback.
pub fn source_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(&FORWARDED_FOR_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty());

    if let Some(chain) = forwarded {
        if let Some(first) = chain.split(',').next() {
            return first.trim().to_string();
        }
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => LOOPBACK_ADDRESS.to_string(),
    }
}

/// Bearer token presented with the request, if any.
///
/// With an `Authorization` header, the last space-separated segment is the
/// token unless the scheme is `Basic`, the credential holds a `:` (API
/// key/secret pairs), or the scheme is `Bearer` with a credential that isn't
/// JWT-shaped (OAuth access tokens belong to the host). Without one, a
/// `token` query parameter is honored on private file paths.
pub fn bearer_token(parts: &Parts, private_files_prefix: &str) -> Option<String> {
    let authorization = parts.headers.get(AUTHORIZATION).filter(|h| !h.is_empty());

    match authorization {
        // A header that isn't text still rules out the query token
        Some(header) => header.to_str().ok().and_then(token_from_authorization),
        None if parts.uri.path().starts_with(private_files_prefix) => {
            query_param(&parts.uri, TOKEN_QUERY_PARAM).filter(|t| !t.is_empty())
        }
        None => None,
    }
}

fn token_from_authorization(header: &str) -> Option<String> {
    let segments: Vec<&str> = header.split(' ').collect();
    let scheme = segments.first()?.to_ascii_lowercase();
    let credential = *segments.last()?;

    if credential.is_empty() || credential.contains(':') {
        return None;
    }

    match scheme.as_str() {
        "basic" => None,
        "bearer" if !is_jwt_shaped(credential) => None,
        _ => Some(credential.to_string()),
    }
}

fn is_jwt_shaped(credential: &str) -> bool {
    let parts: Vec<&str> = credential.split('.').collect();
    parts.len() == 3 && parts.iter().all(|p| !p.is_empty())
}

/// Session identifier from the `sid` cookie.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            (name == crate::context::SESSION_COOKIE).then(|| value.trim_matches('"').to_string())
        })
}

/// First value of a query parameter, percent-decoded.
pub fn query_param(uri: &Uri, name: &str) -> Option<String> {
    pairs(uri.query()?).find_map(|(key, value)| (key == name).then_some(value))
}

/// Value of a request field: the buffered form body first, then the query.
pub fn form_field(parts: &Parts, name: &str) -> Option<String> {
    parts
        .extensions
        .get::<FormFields>()
        .and_then(|form| form.get(name))
        .map(str::to_string)
        .or_else(|| query_param(&parts.uri, name))
}

fn pairs(raw: &str) -> impl Iterator<Item = (String, String)> + '_ {
    raw.split('&').filter(|pair| !pair.is_empty()).map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (decode_component(key), decode_component(value))
    })
}

fn decode_component(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    urlencoding::decode(&raw)
        .map(|s| s.into_owned())
        .unwrap_or(raw)
}
