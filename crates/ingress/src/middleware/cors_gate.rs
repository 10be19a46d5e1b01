//! Origin gate applied as CORS decoration
//!
//! The request always reaches its handler. The gate only decides whether
//! the response carries CORS headers, so a denied browser caller cannot
//! read the answer while server-to-server callers are unaffected.

use access_gate::RequestOrigin;
use axum::{
    extract::{Request, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_HEADERS, ORIGIN, VARY,
        },
        HeaderValue, Method,
    },
    middleware::Next,
    response::Response,
};

use crate::AppState;

const ALLOWED_METHODS: &str = "GET,POST,OPTIONS";
const DEFAULT_ALLOWED_HEADERS: &str = "content-type";

pub async fn cors_gate_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let origin = req.headers().get(ORIGIN).cloned();
    let requested_headers = req.headers().get(ACCESS_CONTROL_REQUEST_HEADERS).cloned();
    let is_preflight = req.method() == Method::OPTIONS;

    let request_origin = match &origin {
        None => RequestOrigin::Absent,
        Some(value) => match value.to_str() {
            Ok(text) => RequestOrigin::Present(text),
            Err(_) => RequestOrigin::Unreadable,
        },
    };
    let decision = state.gate.evaluate(request_origin);

    let mut response = next.run(req).await;

    // without an Origin there is nothing to echo back
    let Some(origin) = origin.filter(|_| decision.is_allowed()) else {
        return response;
    };

    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.append(VARY, HeaderValue::from_static("Origin"));
    if is_preflight {
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            requested_headers.unwrap_or(HeaderValue::from_static(DEFAULT_ALLOWED_HEADERS)),
        );
    }

    response
}
