//! End-to-end tests for the security headers layer

use axum::{Router, routing::get};
use bulwark::testing::get as test_get;
use bulwark::{App, ConfigBuilder, SecurityConfig, build_security_headers_layer};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn hello_router() -> Router {
    Router::new().route("/", get(|| async { "Hello" }))
}

fn app_with(security: SecurityConfig) -> Router {
    App::builder()
        .with_security(security)
        .build()
        .merge_router(hello_router())
        .into_router()
        .unwrap()
}

#[tokio::test]
async fn test_default_headers_on_secure_request() {
    let app = app_with(SecurityConfig::default());

    test_get(app, "/")
        .secure()
        .execute()
        .await
        .assert_ok()
        .assert_header("content-security-policy", "default-src 'self';")
        .assert_header("content-security-policy-report-only", "default-src 'self';")
        .assert_header("x-content-security-policy", "default-src 'self';")
        .assert_header("x-webkit-csp", "default-src 'self';")
        .assert_header("strict-transport-security", "max-age=0")
        .assert_header("x-frame-options", "DENY")
        .assert_header("x-content-type-options", "nosniff")
        .assert_header("x-xss-protection", "1; mode=block");
}

#[tokio::test]
async fn test_no_hsts_on_insecure_request() {
    let app = app_with(SecurityConfig::default());

    test_get(app, "/")
        .execute()
        .await
        .assert_ok()
        .assert_no_header("strict-transport-security")
        .assert_header("x-frame-options", "DENY");
}

#[tokio::test]
async fn test_absolute_https_target_is_not_secure() {
    let config = SecurityConfig::builder()
        .hsts_max_age(31536000)
        .hsts_include_subdomains(true)
        .build();
    let app = app_with(config);

    // The client picks the request target, so it says nothing about TLS
    test_get(app.clone(), "https://example.com/")
        .execute()
        .await
        .assert_ok()
        .assert_no_header("strict-transport-security")
        .assert_header("x-frame-options", "DENY");

    test_get(app, "https://example.com/")
        .secure()
        .execute()
        .await
        .assert_ok()
        .assert_header("strict-transport-security", "max-age=31536000;includeSubDomains");
}

#[tokio::test]
async fn test_forwarded_proto_only_when_trusted() {
    let untrusted = app_with(SecurityConfig::default());
    test_get(untrusted, "/")
        .header("x-forwarded-proto", "https")
        .execute()
        .await
        .assert_no_header("strict-transport-security");

    let trusted = app_with(SecurityConfig::builder().trust_forwarded_proto(true).build());
    test_get(trusted, "/")
        .header("x-forwarded-proto", "https")
        .execute()
        .await
        .assert_header("strict-transport-security", "max-age=0");
}

#[tokio::test]
async fn test_csp_disabled_keeps_report_only() {
    let config = SecurityConfig::from_params([
        ("contentSecurityPolicyEnabled", "false"),
        ("headerXcontentSecurityPolicyEnabled", "true"),
        ("headerXwebkitCSPEnabled", "TRUE"),
    ])
    .unwrap();
    let app = app_with(config);

    test_get(app, "/")
        .execute()
        .await
        .assert_no_header("content-security-policy")
        .assert_no_header("x-content-security-policy")
        .assert_no_header("x-webkit-csp")
        .assert_header("content-security-policy-report-only", "default-src 'self';");
}

#[tokio::test]
async fn test_allow_from_frame_option() {
    let config = ConfigBuilder::new()
        .with_security_params([
            ("antiClickJackingOption", "allow-from"),
            ("antiClickJackingUri", "https://example.com"),
        ])
        .build()
        .unwrap();
    let app = App::with_config(config)
        .merge_router(hello_router())
        .into_router()
        .unwrap();

    test_get(app, "/")
        .execute()
        .await
        .assert_header("x-frame-options", "ALLOW-FROM https://example.com");
}

#[tokio::test]
async fn test_committed_response_skips_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let router = Router::new().route(
        "/",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                "Hello"
            }
        }),
    );
    let app = App::new().merge_router(router).into_router().unwrap();

    test_get(app.clone(), "/")
        .committed()
        .execute()
        .await
        .assert_server_error()
        .assert_no_header("x-frame-options");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    test_get(app, "/").execute().await.assert_ok();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_handler_headers_are_replaced() {
    let router = Router::new().route(
        "/framed",
        get(|| async { ([("x-frame-options", "SAMEORIGIN"), ("x-xss-protection", "0")], "Hi") }),
    );
    let app = App::new().merge_router(router).into_router().unwrap();

    test_get(app, "/framed")
        .execute()
        .await
        .assert_header("x-frame-options", "DENY")
        .assert_header("x-xss-protection", "1; mode=block");
}

#[tokio::test]
async fn test_headers_on_not_found() {
    let app = app_with(SecurityConfig::default());

    test_get(app, "/missing")
        .execute()
        .await
        .assert_not_found()
        .assert_header("x-content-type-options", "nosniff");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = app_with(SecurityConfig::default());

    let response = test_get(app, "/").execute().await.assert_ok().response();
    let request_id = response.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(request_id).is_ok());
}

#[tokio::test]
async fn test_client_request_id_is_kept() {
    let app = app_with(SecurityConfig::default());

    test_get(app, "/")
        .header("x-request-id", "req-1234")
        .execute()
        .await
        .assert_ok()
        .assert_header("x-request-id", "req-1234")
        .assert_header("x-frame-options", "DENY");
}

#[tokio::test]
async fn test_layer_on_plain_router() {
    let config = SecurityConfig::builder().same_origin_framing().nosniff(false).build();
    let app = hello_router().layer(build_security_headers_layer(&config).unwrap());

    test_get(app, "/")
        .execute()
        .await
        .assert_ok()
        .assert_header("x-frame-options", "SAMEORIGIN")
        .assert_no_header("x-content-type-options");
}
