//! Tests for App and AppBuilder functionality

use axum::{Router, routing::get};
use bulwark::testing::get as test_get;
use bulwark::{App, RouteModule};

// A module with a prefix
struct PrefixedModule;

impl RouteModule for PrefixedModule {
    fn routes(&self) -> Router {
        Router::new()
            .route("/hello", get(|| async { "hello from prefixed" }))
            .route("/world", get(|| async { "world" }))
    }

    fn prefix(&self) -> Option<&str> {
        Some("/api/v1")
    }
}

// A module without a prefix
struct UnprefixedModule;

impl RouteModule for UnprefixedModule {
    fn routes(&self) -> Router {
        Router::new().route("/status", get(|| async { "ok" }))
    }
}

#[tokio::test]
async fn test_app_builder_respects_module_prefix() {
    let app = App::builder()
        .register_module(PrefixedModule)
        .build()
        .into_router()
        .unwrap();

    test_get(app.clone(), "/api/v1/hello")
        .execute()
        .await
        .assert_ok();

    // Should NOT be accessible without the prefix
    test_get(app, "/hello").execute().await.assert_not_found();
}

#[tokio::test]
async fn test_modules_share_security_headers() {
    let app = App::builder()
        .register_module(PrefixedModule)
        .register_module(UnprefixedModule)
        .build()
        .into_router()
        .unwrap();

    test_get(app.clone(), "/api/v1/world")
        .execute()
        .await
        .assert_ok()
        .assert_header("x-frame-options", "DENY");

    test_get(app, "/status")
        .execute()
        .await
        .assert_ok()
        .assert_header("x-frame-options", "DENY");
}

#[tokio::test]
async fn test_register_module_on_app() {
    let app = App::new()
        .register_module(UnprefixedModule)
        .into_router()
        .unwrap();

    let body = test_get(app, "/status")
        .execute()
        .await
        .assert_ok()
        .body_string()
        .await;
    assert_eq!(body, "ok");
}
