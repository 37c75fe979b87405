use std::sync::Arc;

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use hark_core::HarkError;
use tracing::debug;

use super::router::{CompiledRouter, RouteError};
use super::table::RouteRequest;
use crate::codec::ApiResponse;

/// Request bodies larger than this are rejected.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Route a request through the compiled table and run its handler.
///
/// Installed as the sole axum fallback, so every request lands here.
pub async fn dispatch(State(router): State<Arc<CompiledRouter>>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();

    let matched = match router.find(&parts.method, &path) {
        Ok(matched) => matched,
        Err(err) => {
            debug!("Routing failed: {}", err);
            return route_failure(&err);
        }
    };

    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            let err = HarkError::entity_decode(format!("failed to read body: {}", e));
            return ApiResponse::error(&err).into_response();
        }
    };

    let request = RouteRequest {
        method: parts.method,
        path,
        params: matched.params,
        body,
    };
    (matched.handler)(request).await
}

fn route_failure(err: &RouteError) -> Response {
    let mut response = ApiResponse::route_error(err).into_response();
    if let RouteError::MethodNotAllowed { allowed, .. } = err {
        let allow = allowed
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        if let Ok(value) = HeaderValue::from_str(&allow) {
            response.headers_mut().insert(header::ALLOW, value);
        }
    }
    response
}
