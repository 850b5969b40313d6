//! Request forwarding.
//!
//! # Responsibilities
//! - Ask the pool for one backend per inbound request
//! - Forward method, headers and body to the backend's base address
//! - Relay the backend's response, or map the failure to a status code
//!
//! # Design Decisions
//! - Exactly one attempt per request: no retries, no second backend
//! - The inbound path is not forwarded; every request targets the base address
//! - The response, body included, must arrive within the request timeout;
//!   it is buffered so a backend that stalls mid-body still fails as 502

use std::time::Instant;

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderMap, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
};
use tokio::time;

use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Body returned when the chosen backend could not be reached.
pub const BACKEND_UNAVAILABLE: &str = "backend unavailable";

/// Body returned when no backend is currently healthy.
pub const NO_HEALTHY_BACKEND: &str = "no healthy backends available";

/// Headers meaningful only for a single transport hop.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The healthy subset was empty; nothing was contacted.
    #[error("no healthy backend available")]
    NoHealthyBackend,

    /// The selected backend refused, reset or timed out.
    #[error("backend {backend} unreachable: {reason}")]
    BackendUnreachable { backend: String, reason: String },
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NoHealthyBackend => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::BackendUnreachable { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match self {
            ProxyError::NoHealthyBackend => NO_HEALTHY_BACKEND,
            ProxyError::BackendUnreachable { .. } => BACKEND_UNAVAILABLE,
        };
        (self.status(), body).into_response()
    }
}

/// Main proxy handler.
/// Selects a backend and forwards the request to it.
pub async fn proxy_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().to_string();

    let backend = match state.pool.select() {
        Some(b) => b,
        None => {
            tracing::warn!(request_id = %request_id, "No healthy backends");
            let err = ProxyError::NoHealthyBackend;
            metrics::record_request(&method, err.status().as_u16(), "none", start_time);
            return Err(err);
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        backend = %backend.address,
        "Forwarding request"
    );

    let upstream = upstream_request(request, &backend.uri);
    let outcome = time::timeout(state.request_timeout, forward(&state, upstream)).await;

    let err = match outcome {
        Ok(Ok(response)) => {
            metrics::record_request(
                &method,
                response.status().as_u16(),
                &backend.address,
                start_time,
            );
            return Ok(response);
        }
        Ok(Err(reason)) => ProxyError::BackendUnreachable {
            backend: backend.address.clone(),
            reason,
        },
        Err(_) => ProxyError::BackendUnreachable {
            backend: backend.address.clone(),
            reason: format!("no complete response within {:?}", state.request_timeout),
        },
    };

    tracing::error!(request_id = %request_id, error = %err, "Upstream error");
    metrics::record_request(&method, err.status().as_u16(), &backend.address, start_time);
    Err(err)
}

/// Rewrite an inbound request into one addressed at `target`.
///
/// Method and body are kept. `host` and hop-by-hop headers are dropped; the
/// client sets `host` from `target`.
pub(crate) fn upstream_request(request: Request<Body>, target: &Uri) -> Request<Body> {
    let (mut parts, body) = request.into_parts();

    parts.uri = target.clone();
    // backends are spoken to over HTTP/1.1 whatever the client used
    parts.version = Version::HTTP_11;
    strip_hop_by_hop(&mut parts.headers);
    parts.headers.remove(header::HOST);

    Request::from_parts(parts, body)
}

/// Send `upstream` and read the whole response.
async fn forward(state: &AppState, upstream: Request<Body>) -> Result<Response, String> {
    let response: Response<hyper::body::Incoming> = state
        .client
        .request(upstream)
        .await
        .map_err(|e| e.to_string())?;

    let (mut parts, body) = response.into_parts();
    let bytes = to_bytes(Body::new(body), usize::MAX)
        .await
        .map_err(|e| format!("reading response body: {}", e))?;

    strip_hop_by_hop(&mut parts.headers);
    Ok(Response::from_parts(parts, Body::from(bytes)))
}

/// Remove hop-by-hop headers, including any named by `Connection`.
pub(crate) fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    for name in listed {
        headers.remove(name.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Method};

    #[test]
    fn test_upstream_request_targets_base_address() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/some/path?q=1")
            .version(Version::HTTP_2)
            .header(header::HOST, "lb.example")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-custom", "kept")
            .body(Body::from("payload"))
            .unwrap();
        let target: Uri = "http://127.0.0.1:5001".parse().unwrap();

        let upstream = upstream_request(request, &target);

        assert_eq!(upstream.method(), Method::POST);
        assert_eq!(upstream.uri(), &target);
        assert_eq!(upstream.version(), Version::HTTP_11);
        assert!(upstream.headers().get(header::HOST).is_none());
        assert_eq!(upstream.headers()["x-custom"], "kept");
        assert_eq!(upstream.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, X-Trace-Hop"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert("x-trace-hop", HeaderValue::from_static("1"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("7"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers[header::CONTENT_LENGTH], "7");
    }

    #[test]
    fn test_error_statuses() {
        let unavailable = ProxyError::NoHealthyBackend.into_response();
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);

        let unreachable = ProxyError::BackendUnreachable {
            backend: "http://127.0.0.1:1".into(),
            reason: "refused".into(),
        }
        .into_response();
        assert_eq!(unreachable.status(), StatusCode::BAD_GATEWAY);
    }
}
