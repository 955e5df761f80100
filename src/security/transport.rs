use axum::http::{HeaderName, Request};

const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Request extension marking a request that arrived over TLS
///
/// Insert this from the acceptor or connection service that terminates TLS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecureTransport;

/// Whether the request was received over a secure transport
///
/// The URI scheme is not consulted: a plain HTTP/1.1 client may send an
/// absolute-form `https://` target. `X-Forwarded-Proto` is only consulted
/// when `trust_forwarded_proto` is set, since any client can send it.
pub(crate) fn is_secure_request<B>(request: &Request<B>, trust_forwarded_proto: bool) -> bool {
    if request.extensions().get::<SecureTransport>().is_some() {
        return true;
    }

    trust_forwarded_proto
        && request
            .headers()
            .get(X_FORWARDED_PROTO)
            .and_then(|value| value.to_str().ok())
            // Proxy chains append; the first entry is the client-facing hop
            .and_then(|value| value.split(',').next())
            .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}
