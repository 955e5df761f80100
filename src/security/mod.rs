//! Security headers middleware.
//!
//! Adds Content-Security-Policy (plus its Report-Only and deprecated
//! `X-` variants), HSTS, X-Frame-Options, X-Content-Type-Options and
//! X-XSS-Protection to HTTP responses.
//!
//! Configuration is resolved once, either from option key/value pairs
//! ([`SecurityConfig::from_params`]), the environment, or the builder, and
//! shared read-only by every request.
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use bulwark::security::{SecurityConfig, build_security_headers_layer};
//!
//! # fn main() -> Result<(), bulwark::security::ConfigError> {
//! let config = SecurityConfig::from_params([
//!     ("hstsMaxAgeSeconds", "31536000"),
//!     ("antiClickJackingOption", "SAMEORIGIN"),
//! ])?;
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "Hello" }))
//!     .layer(build_security_headers_layer(&config)?);
//! # Ok(())
//! # }
//! ```

mod commit;
mod config;
mod error;
mod headers;
mod transport;

pub use commit::ResponseCommit;
pub use config::{DEFAULT_POLICY, FrameOption, SecurityConfig, SecurityConfigBuilder, option};
pub use error::{ConfigError, SecurityHeaderError};
pub use headers::{
    SecurityHeaders, SecurityHeadersLayer, SecurityHeadersService, X_CONTENT_SECURITY_POLICY,
    X_WEBKIT_CSP, build_security_headers_layer,
};
pub use transport::SecureTransport;
