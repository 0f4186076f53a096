//! Renovation Axum Integration
//!
//! Axum middleware and extractors that run the site auth bootstrap for
//! every request.
//!
//! # Quick Start
//!
//! ```ignore
//! use renovation_axum::{SiteAuthLayer, SiteContext};
//! use axum::{Router, routing::get};
//!
//! async fn whoami(ctx: SiteContext) -> String {
//!     ctx.user.clone().unwrap_or_default()
//! }
//!
//! let app = Router::new()
//!     .route("/api/method/whoami", get(whoami))
//!     .layer(SiteAuthLayer::new(host, &config)?);
//! ```
//!
//! The layer verifies bearer tokens, lets the host log the request in, and
//! flushes the host's cookies through the cookie gate on the way out.

pub mod error;
pub mod extractors;
pub mod layer;

pub use error::SiteAuthError;
pub use extractors::{SiteContext, TokenAuth};
pub use layer::{SiteAuthLayer, SiteAuthService};
