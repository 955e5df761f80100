//! Bulwark - HTTP security response headers for Axum applications
//!
//! Bulwark resolves a small, strict set of configuration options into a
//! Tower layer that stamps every response with security headers:
//!
//! - `Content-Security-Policy`, `Content-Security-Policy-Report-Only`
//! - the deprecated `X-Content-Security-Policy` and `X-Webkit-CSP`
//! - `Strict-Transport-Security` (secure requests only)
//! - `X-Frame-Options`, `X-Content-Type-Options`, `X-XSS-Protection`
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use bulwark::{App, ConfigBuilder};
//!
//! #[tokio::main]
//! async fn main() -> bulwark::Result<()> {
//!     bulwark::init_tracing();
//!
//!     let config = ConfigBuilder::new()
//!         .from_env()
//!         .build()?;
//!
//!     App::with_config(config)
//!         .merge_router(Router::new().route("/", get(|| async { "Hello" })))
//!         .serve()
//!         .await
//! }
//! ```

mod config;
mod core;
mod error;
pub mod http;
mod middleware;
pub mod security;
pub mod testing;
mod utils;

// Re-exports for public API
pub use crate::config::{Config, ConfigBuilder, LoggingConfig, ServerConfig};
pub use crate::core::{App, AppBuilder};
pub use crate::error::{BulwarkError, Result};
pub use crate::http::RouteModule;
pub use crate::security::{
    ConfigError, FrameOption, ResponseCommit, SecureTransport, SecurityConfig,
    SecurityConfigBuilder, SecurityHeaderError, SecurityHeaders, SecurityHeadersLayer,
    build_security_headers_layer,
};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// Call this early in `main()`, before building the App.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "bulwark=debug")
/// - `BULWARK_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json_logs = utils::get_env_flag("LOG_JSON").unwrap_or(false);

    install_subscriber(env_filter, json_logs);
}

/// Initialize tracing from the `logging` section of a [`Config`]
pub fn init_tracing_with_config(config: &Config) {
    install_subscriber(EnvFilter::new(&config.logging.level), config.logging.json);
}

fn install_subscriber(env_filter: EnvFilter, json: bool) {
    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
