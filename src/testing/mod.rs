//! Testing utilities for Bulwark applications
//!
//! Drive a [`Router`](axum::Router) in-process and assert on the response
//! headers without binding a socket.
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use bulwark::testing;
//!
//! #[tokio::test]
//! async fn test_frame_options() {
//!     let app = bulwark::App::new()
//!         .merge_router(Router::new().route("/", get(|| async { "Hello" })))
//!         .into_router()
//!         .unwrap();
//!
//!     testing::get(app, "/")
//!         .secure()
//!         .execute()
//!         .await
//!         .assert_ok()
//!         .assert_header("x-frame-options", "DENY")
//!         .assert_header("strict-transport-security", "max-age=0");
//! }
//! ```

mod scenario;

pub use scenario::{Scenario, ScenarioAssert, get, post};
