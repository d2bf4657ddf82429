//! Wire shape of visit requests and responses.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tally_core::protocol::{VisitRequest, VisitResponse, DEFAULT_PAGE};

#[test]
fn empty_request_defaults_to_home() {
    let req: VisitRequest = serde_json::from_str("{}").unwrap();
    assert_eq!(req.page, DEFAULT_PAGE);
    assert!(req.user_agent.is_none());
    assert_eq!(req, VisitRequest::default());
}

#[test]
fn request_reads_camel_case_fields() {
    let raw = r#"{"page":"about","userAgent":"test-agent","timestamp":"x"}"#;
    let req: VisitRequest = serde_json::from_str(raw).unwrap();
    assert_eq!(req.page, "about");
    assert_eq!(req.user_agent.as_deref(), Some("test-agent"));
}

#[test]
fn null_page_falls_back_to_home() {
    let req: VisitRequest = serde_json::from_str(r#"{"page":null,"userAgent":"x"}"#).unwrap();
    assert_eq!(req.page, DEFAULT_PAGE);
    assert_eq!(req.user_agent.as_deref(), Some("x"));
}

#[test]
fn success_response_shape() {
    let v = serde_json::to_value(VisitResponse::success(42)).unwrap();
    assert_eq!(v["count"], 42);
    assert_eq!(v["success"], true);
    assert!(v["timestamp"].as_str().unwrap().contains('T'));
}

#[test]
fn failure_response_zeroes_count() {
    let r = VisitResponse::failure();
    assert_eq!(r.count, 0);
    assert!(!r.success);
}
