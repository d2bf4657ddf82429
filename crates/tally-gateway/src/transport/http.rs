//! HTTP handlers for `/visit`.
//!
//! - `POST /visit`    : count a visit (optional `VisitRequest` JSON body)
//! - `GET /visit`     : current count
//! - `OPTIONS /visit` : CORS preflight
//!
//! Every answer carries a `VisitResponse` body, including failures.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use tally_core::protocol::VisitRequest;

use crate::app_state::AppState;
use crate::visit::{handle_visit, rejected, VisitOp, VisitOutcome};

pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";

/// Empty or whitespace-only bodies mean "default request".
pub fn parse_visit_body(body: &[u8]) -> Result<VisitRequest, String> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(VisitRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| format!("invalid visit body: {e}"))
}

pub async fn post_visit(State(app): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let outcome = match parse_visit_body(&body) {
        Ok(req) => handle_visit(&app, VisitOp::Increment, &req).await,
        Err(reason) => rejected(&app, VisitOp::Increment, &reason),
    };
    respond(&app, &headers, outcome)
}

pub async fn get_visit(State(app): State<AppState>, headers: HeaderMap) -> Response {
    let outcome = handle_visit(&app, VisitOp::Read, &VisitRequest::default()).await;
    respond(&app, &headers, outcome)
}

pub async fn preflight(State(app): State<AppState>, headers: HeaderMap) -> Response {
    let mut res = StatusCode::NO_CONTENT.into_response();
    apply_cors(&app, &headers, &mut res);
    let h = res.headers_mut();
    h.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    h.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
    res
}

fn respond(app: &AppState, headers: &HeaderMap, outcome: VisitOutcome) -> Response {
    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut res = (status, Json(outcome.response)).into_response();
    apply_cors(app, headers, &mut res);
    res
}

fn apply_cors(app: &AppState, req_headers: &HeaderMap, res: &mut Response) {
    let origin = req_headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    let Some(allow) = app.allow_origin(origin) else {
        return;
    };
    let Ok(value) = HeaderValue::from_str(&allow) else {
        return;
    };

    let h = res.headers_mut();
    if allow != "*" {
        h.insert(header::VARY, HeaderValue::from_static("Origin"));
    }
    h.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
}
