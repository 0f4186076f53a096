//! Bearer token encoding and verification
//!
//! Tokens are compact HS256 JWTs signed with the deployment secret. The
//! payload binds a user to an existing session (`sid`) and records the
//! address the token was issued to (`ip`).

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{AddressBinding, AuthConfig, ConfigError};
use crate::context::GUEST_SESSION;
use crate::key::SigningKey;
use crate::AuthError;

/// `typ` header value written into every token
pub const TOKEN_TYPE: &str = "jwt";

/// Claims carried by a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user identifier)
    pub sub: String,
    /// Address the token was issued to
    pub ip: String,
    /// Session identifier the token stands in for
    pub sid: String,
    /// Expiration timestamp (seconds since epoch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Create claims for a session, without expiry
    pub fn new(
        subject: impl Into<String>,
        session_id: impl Into<String>,
        source_address: impl Into<String>,
    ) -> Self {
        Self {
            sub: subject.into(),
            ip: source_address.into(),
            sid: session_id.into(),
            exp: None,
        }
    }

    /// Set the expiry
    pub fn expires_on(mut self, expire_on: DateTime<Utc>) -> Self {
        self.exp = Some(expire_on.timestamp());
        self
    }

    /// Check if the claims are expired
    pub fn is_expired(&self) -> bool {
        self.exp.is_some_and(|exp| Utc::now().timestamp() > exp)
    }
}

/// Token encoder/verifier bound to one signing key
#[derive(Clone)]
pub struct TokenCodec {
    key: SigningKey,
    validation: Validation,
    address_binding: AddressBinding,
}

impl TokenCodec {
    /// Create a codec with no expiry leeway and no address binding
    pub fn new(key: SigningKey) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is optional; it is still enforced whenever present
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        Self {
            key,
            validation,
            address_binding: AddressBinding::Disabled,
        }
    }

    /// Create a codec from the site auth config
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.signing_key()?)
            .with_leeway(config.token_leeway)
            .with_address_binding(config.address_binding))
    }

    /// Set the clock skew tolerated on `exp`
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.validation.leeway = leeway.as_secs();
        self
    }

    /// Set the address binding policy used by [`Self::verify_for`]
    pub fn with_address_binding(mut self, binding: AddressBinding) -> Self {
        self.address_binding = binding;
        self
    }

    /// Sign claims into a compact token
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some(TOKEN_TYPE.to_string());

        encode(&header, claims, self.key.encoding_key()).map_err(|e| {
            tracing::error!("Failed to sign token: {}", e);
            AuthError::Internal("Failed to sign token".to_string())
        })
    }

    /// Verify a token's signature and expiry and return its claims.
    ///
    /// The `ip` claim is not compared with anything here.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data = decode::<TokenClaims>(token, self.key.decoding_key(), &self.validation)?;
        Ok(data.claims)
    }

    /// Verify a token presented from `source_address`, applying the
    /// address binding policy
    pub fn verify_for(&self, token: &str, source_address: &str) -> Result<TokenClaims, AuthError> {
        let claims = self.decode(token)?;

        if self.address_binding == AddressBinding::Enforced && claims.ip != source_address {
            tracing::debug!(
                "Token address mismatch: issued to {}, presented from {}",
                claims.ip,
                source_address
            );
            return Err(AuthError::AddressMismatch);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("key", &self.key)
            .field("leeway", &self.validation.leeway)
            .field("address_binding", &self.address_binding)
            .finish()
    }
}

/// Encode a token for a session.
///
/// Returns `Ok(None)` when there is no live session to stand in for
/// (missing, empty, or the guest session).
pub fn encode_token(
    subject: &str,
    session_id: Option<&str>,
    source_address: &str,
    key: &SigningKey,
    expire_on: Option<DateTime<Utc>>,
) -> Result<Option<String>, AuthError> {
    let Some(sid) = session_id.filter(|sid| !sid.is_empty() && *sid != GUEST_SESSION) else {
        return Ok(None);
    };

    let mut claims = TokenClaims::new(subject, sid, source_address);
    if let Some(expire_on) = expire_on {
        claims = claims.expires_on(expire_on);
    }

    TokenCodec::new(key.clone()).encode(&claims).map(Some)
}

/// Decode and verify a token with the given key
pub fn decode_token(token: &str, key: &SigningKey) -> Result<TokenClaims, AuthError> {
    TokenCodec::new(key.clone()).decode(token)
}

/// Parse an expiry given as text.
///
/// Accepts RFC 3339 timestamps as well as naive `YYYY-MM-DD HH:MM:SS[.ffffff]`
/// and `YYYY-MM-DD` values, which are taken to be UTC.
pub fn parse_expiry(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d").map(|date| date.and_time(NaiveTime::MIN).and_utc())
}
