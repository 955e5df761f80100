use super::commit::ResponseCommit;
use super::config::{FrameOption, SecurityConfig};
use super::error::{ConfigError, SecurityHeaderError};
use super::transport::is_secure_request;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{self, HeaderMap, HeaderName, HeaderValue, Response, header};
use axum::response::IntoResponse;
use futures::future::BoxFuture;
use std::sync::Arc;
use tower::Service;

/// Deprecated CSP header understood by IE 10/11
pub const X_CONTENT_SECURITY_POLICY: HeaderName =
    HeaderName::from_static("x-content-security-policy");

/// Deprecated CSP header understood by older Safari and iOS
pub const X_WEBKIT_CSP: HeaderName = HeaderName::from_static("x-webkit-csp");

const NOSNIFF: HeaderValue = HeaderValue::from_static("nosniff");
const XSS_BLOCK: HeaderValue = HeaderValue::from_static("1; mode=block");

/// Security header values resolved once from a [`SecurityConfig`]
///
/// Holds the configuration together with every header value pre-composed,
/// so that applying headers to a response is a handful of map inserts.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    config: SecurityConfig,
    hsts_header_value: String,
    anti_click_jacking_header_value: String,
    // Each is `Some` only when its gate is enabled
    csp: Option<HeaderValue>,
    csp_report_only: Option<HeaderValue>,
    hsts: Option<HeaderValue>,
    frame_options: Option<HeaderValue>,
}

impl SecurityHeaders {
    /// Compose the header values for `config`
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the ALLOW-FROM URI is missing or
    /// malformed, or if an enabled header value contains characters that
    /// cannot appear in an HTTP header.
    pub fn new(config: &SecurityConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut hsts_header_value = format!("max-age={}", config.hsts_max_age_seconds);
        if config.hsts_include_subdomains {
            hsts_header_value.push_str(";includeSubDomains");
        }

        let mut anti_click_jacking_header_value =
            config.anti_click_jacking_option.header_token().to_string();
        if config.anti_click_jacking_option == FrameOption::AllowFrom {
            anti_click_jacking_header_value.push(' ');
            anti_click_jacking_header_value.push_str(config.allow_from_uri()?);
        }

        let csp = gated_value(config.csp_enabled, "Content-Security-Policy", &config.csp)?;
        let csp_report_only = gated_value(
            config.csp_report_only_enabled,
            "Content-Security-Policy-Report-Only",
            &config.csp_report_only,
        )?;
        let hsts = gated_value(
            config.hsts_enabled,
            "Strict-Transport-Security",
            &hsts_header_value,
        )?;
        let frame_options = gated_value(
            config.anti_click_jacking_enabled,
            "X-Frame-Options",
            &anti_click_jacking_header_value,
        )?;

        Ok(Self {
            config: config.clone(),
            hsts_header_value,
            anti_click_jacking_header_value,
            csp,
            csp_report_only,
            hsts,
            frame_options,
        })
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// `max-age=<seconds>` plus `;includeSubDomains` when configured
    pub fn hsts_header_value(&self) -> &str {
        &self.hsts_header_value
    }

    /// The X-Frame-Options token, followed by the URI for ALLOW-FROM
    pub fn anti_click_jacking_header_value(&self) -> &str {
        &self.anti_click_jacking_header_value
    }

    /// Whether `request` arrived over a secure transport
    pub fn is_secure<B>(&self, request: &http::Request<B>) -> bool {
        is_secure_request(request, self.config.trust_forwarded_proto)
    }

    /// Fail if the response for `request` has already been sent
    ///
    /// # Errors
    ///
    /// Returns [`SecurityHeaderError::AlreadyCommitted`] when the request
    /// carries a [`ResponseCommit`] that has been committed.
    pub fn check_uncommitted<B>(request: &http::Request<B>) -> Result<(), SecurityHeaderError> {
        match request.extensions().get::<ResponseCommit>() {
            Some(commit) if commit.is_committed() => Err(SecurityHeaderError::AlreadyCommitted),
            _ => Ok(()),
        }
    }

    /// Set the enabled security headers, replacing any existing values
    ///
    /// Strict-Transport-Security is only set when `secure` is true.
    pub fn apply(&self, secure: bool, headers: &mut HeaderMap) {
        if let Some(ref csp) = self.csp {
            headers.insert(header::CONTENT_SECURITY_POLICY, csp.clone());
        }

        // Report-Only follows its own flag, even with CSP disabled
        if let Some(ref report_only) = self.csp_report_only {
            headers.insert(header::CONTENT_SECURITY_POLICY_REPORT_ONLY, report_only.clone());
        }

        // The deprecated variants always carry the primary policy
        if let Some(ref csp) = self.csp {
            if self.config.x_content_security_policy_enabled {
                headers.insert(X_CONTENT_SECURITY_POLICY, csp.clone());
            }
            if self.config.x_webkit_csp_enabled {
                headers.insert(X_WEBKIT_CSP, csp.clone());
            }
        }

        // HSTS
        if secure {
            if let Some(ref hsts) = self.hsts {
                headers.insert(header::STRICT_TRANSPORT_SECURITY, hsts.clone());
            }
        }

        // X-Frame-Options
        if let Some(ref frame_options) = self.frame_options {
            headers.insert(header::X_FRAME_OPTIONS, frame_options.clone());
        }

        // X-Content-Type-Options
        if self.config.block_content_type_sniffing_enabled {
            headers.insert(header::X_CONTENT_TYPE_OPTIONS, NOSNIFF);
        }

        // X-XSS-Protection
        if self.config.xss_protection_enabled {
            headers.insert(header::X_XSS_PROTECTION, XSS_BLOCK);
        }
    }
}

fn gated_value(
    enabled: bool,
    header: &'static str,
    value: &str,
) -> Result<Option<HeaderValue>, ConfigError> {
    if !enabled {
        return Ok(None);
    }

    HeaderValue::from_str(value)
        .map(Some)
        .map_err(|_| ConfigError::InvalidHeaderValue { header })
}

/// Build a Tower layer that adds security headers to responses
///
/// # Errors
///
/// Returns a [`ConfigError`] if the header values cannot be composed;
/// see [`SecurityHeaders::new`].
pub fn build_security_headers_layer(
    config: &SecurityConfig,
) -> Result<SecurityHeadersLayer, ConfigError> {
    let headers = SecurityHeaders::new(config)?;

    tracing::debug!(
        hsts = headers.hsts_header_value(),
        frame_options = headers.anti_click_jacking_header_value(),
        "Security headers layer configured"
    );

    Ok(SecurityHeadersLayer::new(headers))
}

/// Tower layer that adds security headers
#[derive(Debug, Clone)]
pub struct SecurityHeadersLayer {
    headers: Arc<SecurityHeaders>,
}

impl SecurityHeadersLayer {
    pub fn new(headers: SecurityHeaders) -> Self {
        Self {
            headers: Arc::new(headers),
        }
    }
}

impl<S> tower::Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeadersService {
            inner,
            headers: Arc::clone(&self.headers),
        }
    }
}

/// Tower service that adds security headers
///
/// A request whose response is already committed is answered with
/// `500 Internal Server Error` and never reaches the inner service.
#[derive(Debug, Clone)]
pub struct SecurityHeadersService<S> {
    inner: S,
    headers: Arc<SecurityHeaders>,
}

impl<S> Service<Request> for SecurityHeadersService<S>
where
    S: Service<Request, Response = Response<Body>> + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        if let Err(err) = SecurityHeaders::check_uncommitted(&req) {
            tracing::error!(
                error = %err,
                method = %req.method(),
                uri = %req.uri(),
                "Security headers could not be applied; check middleware ordering"
            );
            return Box::pin(async move { Ok(err.into_response()) });
        }

        let headers = Arc::clone(&self.headers);
        let secure = headers.is_secure(&req);
        let fut = self.inner.call(req);

        Box::pin(async move {
            let mut response = fut.await?;
            headers.apply(secure, response.headers_mut());
            Ok(response)
        })
    }
}
