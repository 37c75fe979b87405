//! Request and response envelopes.
//!
//! Requests nest the entity under `payload`:
//! `{"payload": {...}, "meta": {...}}`. Responses carry either
//! `{"payload": ...}` or `{"error": "...", "errorCode": N}`, never both.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use hark_core::{ErrorKind, HarkError, Validate, DEFAULT_ERROR_CODE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::routing::RouteError;

/// Outer request shape. The payload is kept opaque until the caller says
/// which entity it expects.
#[derive(Debug, Deserialize)]
struct RequestEnvelope {
    payload: Value,
    #[serde(default)]
    #[allow(dead_code)]
    meta: Option<serde_json::Map<String, Value>>,
}

/// Decode an enveloped request body into `T` and validate it.
pub fn decode<T>(body: &[u8]) -> Result<T, HarkError>
where
    T: DeserializeOwned + Validate,
{
    let envelope: RequestEnvelope =
        serde_json::from_slice(body).map_err(HarkError::entity_decode)?;
    let entity: T = serde_json::from_value(envelope.payload).map_err(HarkError::entity_decode)?;
    entity.validate()?;
    Ok(entity)
}

#[derive(Debug, Serialize)]
struct ResponseEnvelope<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(rename = "errorCode", skip_serializing_if = "Option::is_none")]
    error_code: Option<u32>,
}

/// HTTP status for each error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A ready-to-send enveloped response.
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl ApiResponse {
    /// Wrap `payload` with the given status.
    pub fn ok<T: Serialize>(status: StatusCode, payload: T) -> Self {
        Self::encode(
            status,
            &ResponseEnvelope {
                payload: Some(payload),
                error: None,
                error_code: None,
            },
        )
    }

    /// A success with no payload: `{}`.
    pub fn empty(status: StatusCode) -> Self {
        Self::encode(
            status,
            &ResponseEnvelope::<()> {
                payload: None,
                error: None,
                error_code: None,
            },
        )
    }

    pub fn error(err: &HarkError) -> Self {
        Self::failure(status_for(err.kind()), err.to_string(), err.code())
    }

    pub fn route_error(err: &RouteError) -> Self {
        let status = match err {
            RouteError::NoRoute { .. } => StatusCode::NOT_FOUND,
            RouteError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        };
        Self::failure(status, err.to_string(), None)
    }

    /// Build from a handler result: success payloads get `status`, errors
    /// get the status of their kind.
    pub fn from_result<T: Serialize>(status: StatusCode, result: Result<T, HarkError>) -> Self {
        match result {
            Ok(payload) => Self::ok(status, payload),
            Err(err) => Self::error(&err),
        }
    }

    fn failure(status: StatusCode, message: String, code: Option<u32>) -> Self {
        Self::encode(
            status,
            &ResponseEnvelope::<()> {
                payload: None,
                error: Some(message),
                error_code: Some(code.unwrap_or(DEFAULT_ERROR_CODE)),
            },
        )
    }

    fn encode<T: Serialize>(status: StatusCode, envelope: &ResponseEnvelope<T>) -> Self {
        match serde_json::to_vec(envelope) {
            Ok(body) => Self { status, body },
            Err(e) => {
                error!("Failed to encode response: {}", e);
                let err = HarkError::serialization("encoding response", e);
                let fallback = serde_json::json!({
                    "error": err.to_string(),
                    "errorCode": err.code_or_default(),
                });
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: fallback.to_string().into_bytes(),
                }
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )],
            self.body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use hark_core::Machine;
    use serde_json::json;

    fn body_json(resp: &ApiResponse) -> Value {
        serde_json::from_slice(resp.body()).unwrap()
    }

    #[test]
    fn test_decode_valid_machine() {
        let m: Machine =
            decode(br#"{"payload":{"id":"m1","name":"box1","memoryMB":512},"meta":{}}"#).unwrap();
        assert_eq!(m, Machine::new("m1", "box1", 512));
    }

    #[test]
    fn test_decode_failures_are_bad_requests() {
        let cases: &[(&str, u32)] = &[
            ("not json", 400001),
            (r#"{"meta":{}}"#, 400001),
            (r#"{"payload":[1,2]}"#, 400001),
            (r#"{"payload":{"id":"m1","name":"box1","memoryMB":-1}}"#, 400001),
            (r#"{"payload":{"id":"","name":"box1","memoryMB":1}}"#, 400002),
            (r#"{"payload":{"id":"m1","memoryMB":1}}"#, 400002),
        ];

        for (body, code) in cases {
            let err = decode::<Machine>(body.as_bytes()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BadRequest, "body {:?}", body);
            assert_eq!(err.code(), Some(*code), "body {:?}", body);
        }
    }

    #[test]
    fn test_success_envelope() {
        let resp = ApiResponse::ok(StatusCode::OK, Machine::new("m1", "box1", 512));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(&resp),
            json!({"payload": {"id": "m1", "name": "box1", "memoryMB": 512}})
        );

        let resp = ApiResponse::empty(StatusCode::CREATED);
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(body_json(&resp), json!({}));
    }

    #[test]
    fn test_error_envelope_is_exclusive() {
        let resp = ApiResponse::error(&HarkError::machine_not_found("nope"));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = body_json(&resp);
        assert_eq!(body["errorCode"], json!(404001));
        assert_eq!(body["error"], json!("Machine not found: \"nope\""));
        assert!(body.get("payload").is_none());
    }

    #[test]
    fn test_error_without_code_uses_default() {
        let resp = ApiResponse::error(&HarkError::internal("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&resp)["errorCode"], json!(DEFAULT_ERROR_CODE));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::BadRequest), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(
            status_for(ErrorKind::Internal),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_route_errors() {
        let resp = ApiResponse::route_error(&RouteError::NoRoute {
            method: Method::GET,
            path: "/nowhere".to_string(),
        });
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(&resp)["error"], json!("No handler for 'GET /nowhere'"));

        let resp = ApiResponse::route_error(&RouteError::MethodNotAllowed {
            method: Method::DELETE,
            path: "/api/machine".to_string(),
            allowed: vec![Method::GET],
        });
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_json(&resp)["errorCode"], json!(DEFAULT_ERROR_CODE));
    }
}
