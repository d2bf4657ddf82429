//! Direct-invocation (Lambda) event handling.
//!
//! Two payload shapes are accepted:
//! - a bare `VisitRequest` (or `null`), answered with a bare `VisitResponse`
//! - an API Gateway proxy event (REST `httpMethod` or HTTP API
//!   `requestContext.http.method`), answered with a proxy response whose body
//!   is the serialized `VisitResponse`

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use tally_core::protocol::{VisitRequest, VisitResponse};

use crate::app_state::AppState;
use crate::transport::http::{parse_visit_body, ALLOW_HEADERS, ALLOW_METHODS};
use crate::visit::{handle_visit, rejected, VisitOp, VisitOutcome};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum InvocationReply {
    Direct(VisitResponse),
    Proxy(ApiGatewayResponse),
}

pub async fn handle_event(state: &AppState, event: Value) -> InvocationReply {
    match proxy_method(&event) {
        Some(method) => InvocationReply::Proxy(handle_proxy(state, &method, &event).await),
        None => InvocationReply::Direct(handle_direct(state, event).await),
    }
}

async fn handle_direct(state: &AppState, event: Value) -> VisitResponse {
    let req = if event.is_null() {
        Ok(VisitRequest::default())
    } else {
        serde_json::from_value::<VisitRequest>(event)
            .map_err(|e| format!("invalid visit payload: {e}"))
    };
    let outcome = match req {
        Ok(req) => handle_visit(state, VisitOp::Increment, &req).await,
        Err(reason) => rejected(state, VisitOp::Increment, &reason),
    };
    outcome.response
}

async fn handle_proxy(state: &AppState, method: &str, event: &Value) -> ApiGatewayResponse {
    let origin = header_value(event, "origin");
    let allow_origin = state.allow_origin(origin.as_deref());

    let outcome = match method {
        "OPTIONS" => return proxy_response(204, String::new(), allow_origin.as_deref()),
        "GET" => handle_visit(state, VisitOp::Read, &VisitRequest::default()).await,
        "POST" => {
            if event.get("isBase64Encoded").and_then(Value::as_bool).unwrap_or(false) {
                rejected(state, VisitOp::Increment, "base64-encoded bodies are not supported")
            } else {
                let body = event.get("body").and_then(Value::as_str).unwrap_or("");
                match parse_visit_body(body.as_bytes()) {
                    Ok(req) => handle_visit(state, VisitOp::Increment, &req).await,
                    Err(reason) => rejected(state, VisitOp::Increment, &reason),
                }
            }
        }
        other => {
            tracing::warn!(method = other, "unsupported method on visit endpoint");
            VisitOutcome {
                status: 405,
                response: VisitResponse::failure(),
            }
        }
    };

    let body = serde_json::to_string(&outcome.response)
        .unwrap_or_else(|_| "{\"success\":false}".to_string());
    proxy_response(outcome.status, body, allow_origin.as_deref())
}

fn proxy_response(status: u16, body: String, allow_origin: Option<&str>) -> ApiGatewayResponse {
    let mut headers = Map::new();
    headers.insert("Content-Type".into(), json!("application/json"));
    headers.insert("Access-Control-Allow-Methods".into(), json!(ALLOW_METHODS));
    headers.insert("Access-Control-Allow-Headers".into(), json!(ALLOW_HEADERS));
    if let Some(origin) = allow_origin {
        headers.insert("Access-Control-Allow-Origin".into(), json!(origin));
    }
    ApiGatewayResponse {
        status_code: status,
        headers: Value::Object(headers),
        body,
    }
}

/// HTTP method if `event` is an API Gateway proxy event.
fn proxy_method(event: &Value) -> Option<String> {
    event
        .get("httpMethod")
        .or_else(|| event.pointer("/requestContext/http/method"))
        .and_then(Value::as_str)
        .map(|m| m.to_ascii_uppercase())
}

/// Case-insensitive lookup in the event's `headers` map.
fn header_value(event: &Value, name: &str) -> Option<String> {
    event
        .get("headers")?
        .as_object()?
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .and_then(|(_, v)| v.as_str())
        .map(str::to_string)
}
