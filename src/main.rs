//! Demo server: a greeting page behind the security headers layer.
//!
//! Configure through the environment, e.g.
//!
//! ```text
//! BULWARK_PORT=8080 \
//! BULWARK_SECURITY_HSTS_MAX_AGE=31536000 \
//! BULWARK_SECURITY_X_FRAME_OPTIONS=SAMEORIGIN \
//! cargo run
//! ```

use anyhow::Context;
use axum::{Json, Router, response::Html, routing::get};
use bulwark::{App, ConfigBuilder, RouteModule};
use serde_json::{Value, json};

struct PagesModule;

impl RouteModule for PagesModule {
    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(hello))
            .route("/health", get(health))
    }
}

async fn hello() -> Html<&'static str> {
    Html("<!DOCTYPE html><html><head><title>Hello</title></head><body><h1>Hello from Bulwark</h1></body></html>")
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

#[tokio::main]
async fn main() -> bulwark::Result<()> {
    let config = ConfigBuilder::new()
        .from_env()
        .build()
        .context("invalid configuration in environment")?;
    bulwark::init_tracing_with_config(&config);

    tracing::info!(
        csp = %config.security.csp,
        hsts_max_age = config.security.hsts_max_age_seconds,
        frame_option = %config.security.anti_click_jacking_option,
        "Security headers configured"
    );

    App::builder()
        .with_config(config)
        .register_module(PagesModule)
        .build()
        .serve()
        .await
        .context("server stopped with an error")?;

    Ok(())
}
