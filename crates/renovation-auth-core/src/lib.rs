//! Renovation Auth Core - bearer token authentication for host framework sites
//!
//! Lets a site accept a signed, time-limited bearer token alongside the host
//! framework's session cookies:
//! - token encoding, verification and issuance for live sessions
//! - a cookie gate that keeps token requests from rewriting client cookies
//! - the per-request bootstrap that swaps a verified token's session in for
//!   the cookie session before the host's login machinery runs

pub mod bootstrap;
pub mod config;
pub mod context;
pub mod cookies;
pub mod error;
pub mod extract;
pub mod host;
pub mod issuer;
pub mod key;
pub mod token;

pub use bootstrap::{BootstrapFailure, Bootstrapped, RequestBootstrap};
pub use config::{AddressBinding, AuthConfig, ConfigError};
pub use context::{AuthFlags, RequestContext};
pub use cookies::{CookieGate, CookieManager, FlushDecision, CLIENT_SITE_HEADER};
pub use error::*;
pub use extract::FormFields;
pub use host::SiteHost;
pub use issuer::TokenIssuer;
pub use key::{KeyError, SigningKey};
pub use token::{decode_token, encode_token, parse_expiry, TokenClaims, TokenCodec};
