use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Errors raised while resolving security header configuration
///
/// All of these are startup errors: an application that gets one back
/// should refuse to start rather than serve responses with a partial set
/// of headers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown configuration option: {0}")]
    UnknownOption(String),

    #[error("invalid integer value [{value}] for option {option}")]
    InvalidInteger { option: &'static str, value: String },

    #[error("invalid anti-click-jacking option value [{0}], expected one of DENY, SAMEORIGIN, ALLOW-FROM")]
    InvalidFrameOption(String),

    #[error("invalid anti-click-jacking URI [{value}]: {reason}")]
    InvalidUri { value: String, reason: String },

    #[error("antiClickJackingUri is required when antiClickJackingOption is ALLOW-FROM")]
    MissingUri,

    #[error("value for header {header} contains characters not allowed in an HTTP header")]
    InvalidHeaderValue { header: &'static str },
}

/// Errors raised while attaching security headers to a response
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecurityHeaderError {
    /// The response head was flushed before the security headers stage ran.
    ///
    /// This means a stage that writes to the client sits outside the
    /// security headers layer.
    #[error("unable to add HTTP headers since the response is already committed on entry to the security headers layer")]
    AlreadyCommitted,
}

// Logged by the service, which knows the request
impl IntoResponse for SecurityHeaderError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response()
    }
}
