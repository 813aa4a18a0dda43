//! `X-Request-Id` middleware (§6 [AMBIENT]): every request gets a request id
//! (the client's own, if supplied, otherwise a freshly generated UUID), kept
//! on the response and available to handlers via a request extension so
//! Ingress can propagate it as a broker header. Shape grounded on
//! `middleware/csp.rs`'s `axum::middleware::from_fn`.

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request, Response},
    middleware::Next,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone)]
pub struct RequestId(pub String);

pub async fn request_id_middleware(mut req: Request<Body>, next: Next) -> Response<Body> {
    let header_name = HeaderName::from_static(REQUEST_ID_HEADER);

    let request_id = req
        .headers()
        .get(&header_name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(RequestId(request_id.clone()));

    let mut res = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        res.headers_mut().insert(header_name, value);
    }

    res
}
