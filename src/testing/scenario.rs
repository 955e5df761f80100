use crate::security::{ResponseCommit, SecureTransport};
use axum::{
    Router,
    body::Body,
    http::{HeaderName, Method, Request, StatusCode},
};
use tower::ServiceExt;

/// Test scenario builder for exercising a router in-process
pub struct Scenario {
    app: Router,
    request: Request<Body>,
}

impl Scenario {
    /// Create a new test scenario with the given app
    pub fn new(app: Router) -> Self {
        Self {
            app,
            request: Request::builder()
                .method(Method::GET)
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        }
    }

    /// Set the HTTP method
    pub fn method(mut self, method: Method) -> Self {
        *self.request.method_mut() = method;
        self
    }

    /// Set the URI/path
    pub fn uri(mut self, uri: &str) -> Self {
        *self.request.uri_mut() = uri.parse().unwrap();
        self
    }

    /// Add a header
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.request.headers_mut().insert(
            HeaderName::from_bytes(key.as_bytes()).unwrap(),
            value.parse().unwrap(),
        );
        self
    }

    /// Mark the request as received over TLS
    pub fn secure(mut self) -> Self {
        self.request.extensions_mut().insert(SecureTransport);
        self
    }

    /// Attach a commit flag that has already been set, as if an outer
    /// stage had flushed the response head
    pub fn committed(mut self) -> Self {
        let commit = ResponseCommit::new();
        commit.commit();
        self.request.extensions_mut().insert(commit);
        self
    }

    /// Set plain text body
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        *self.request.body_mut() = Body::from(body.into());
        self
    }

    /// Execute the request and get an assertion builder
    pub async fn execute(self) -> ScenarioAssert {
        let response = self.app.oneshot(self.request).await.unwrap();
        ScenarioAssert { response }
    }
}

/// Assertion builder for test responses
pub struct ScenarioAssert {
    response: axum::response::Response,
}

impl ScenarioAssert {
    /// Assert the response status code
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.response.status(),
            expected,
            "Expected status {}, got {}",
            expected,
            self.response.status()
        );
        self
    }

    /// Assert status is 200 OK
    pub fn assert_ok(self) -> Self {
        self.assert_status(StatusCode::OK)
    }

    /// Assert status is 404 Not Found
    pub fn assert_not_found(self) -> Self {
        self.assert_status(StatusCode::NOT_FOUND)
    }

    /// Assert status is 500 Internal Server Error
    pub fn assert_server_error(self) -> Self {
        self.assert_status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Assert a header exists exactly once with the given value
    pub fn assert_header(self, key: &str, expected: &str) -> Self {
        let values: Vec<&str> = self
            .response
            .headers()
            .get_all(key)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert!(!values.is_empty(), "Header '{}' not found", key);
        assert_eq!(values, vec![expected], "Header '{}' value mismatch", key);
        self
    }

    /// Assert a header is absent
    pub fn assert_no_header(self, key: &str) -> Self {
        assert!(
            !self.response.headers().contains_key(key),
            "Header '{}' should not be set, got {:?}",
            key,
            self.response.headers().get(key)
        );
        self
    }

    /// Get the response body as a string
    pub async fn body_string(self) -> String {
        let bytes = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// Get the underlying response for custom assertions
    pub fn response(self) -> axum::response::Response {
        self.response
    }
}

/// Start a GET scenario
pub fn get(app: Router, uri: &str) -> Scenario {
    Scenario::new(app).uri(uri)
}

/// Start a POST scenario
pub fn post(app: Router, uri: &str) -> Scenario {
    Scenario::new(app).method(Method::POST).uri(uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Request, routing::get as axum_get, routing::post as axum_post};

    async fn scheme_handler(req: Request) -> String {
        let secure = req.extensions().get::<SecureTransport>().is_some();
        format!("secure={}", secure)
    }

    #[tokio::test]
    async fn test_basic_get() {
        let app = Router::new().route("/hello", axum_get(|| async { "Hello, World!" }));

        let body = get(app, "/hello").execute().await.assert_ok().body_string().await;
        assert_eq!(body, "Hello, World!");
    }

    #[tokio::test]
    async fn test_secure_marks_request() {
        let app = Router::new().route("/", axum_get(scheme_handler));

        let body = get(app.clone(), "/").secure().execute().await.body_string().await;
        assert_eq!(body, "secure=true");

        let body = get(app, "/").execute().await.body_string().await;
        assert_eq!(body, "secure=false");
    }

    #[tokio::test]
    async fn test_post_with_body() {
        let app = Router::new().route("/echo", axum_post(|body: String| async move { body }));

        let body = post(app, "/echo")
            .text_body("ping")
            .execute()
            .await
            .assert_ok()
            .body_string()
            .await;
        assert_eq!(body, "ping");
    }

    #[tokio::test]
    async fn test_header_assertions() {
        let app = Router::new().route(
            "/",
            axum_get(|| async { ([("x-custom", "value")], "ok") }),
        );

        get(app, "/")
            .execute()
            .await
            .assert_header("x-custom", "value")
            .assert_no_header("x-missing");
    }

    #[tokio::test]
    async fn test_not_found() {
        let app = Router::new();
        get(app, "/missing").execute().await.assert_not_found();
    }
}
