//! Token issuance for live sessions

use chrono::{DateTime, Utc};

use crate::context::RequestContext;
use crate::token::{TokenClaims, TokenCodec};
use crate::AuthError;

/// Issues bearer tokens that stand in for the current request's session.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    codec: TokenCodec,
}

impl TokenIssuer {
    /// Create an issuer signing with the given codec
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }

    /// Issue a token for `subject` bound to the context's session.
    ///
    /// Returns `Ok(None)` when the request has no live session. An issued
    /// token is recorded on the request flags, so the response leaves the
    /// client's cookies alone.
    pub fn issue(
        &self,
        ctx: &RequestContext,
        subject: &str,
        expire_on: Option<DateTime<Utc>>,
    ) -> Result<Option<String>, AuthError> {
        let Some(sid) = ctx.live_session() else {
            tracing::debug!("No live session, not issuing a token for {}", subject);
            return Ok(None);
        };

        let mut claims = TokenClaims::new(subject, sid, ctx.source_address.clone());
        if let Some(expire_on) = expire_on {
            claims = claims.expires_on(expire_on);
        }

        let token = self.codec.encode(&claims)?;
        ctx.flags.set_bearer_token(token.clone());
        Ok(Some(token))
    }

    /// The codec tokens are signed with
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}
