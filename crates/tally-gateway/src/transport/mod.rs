//! Inbound adapters: axum handlers and the Lambda event handler.

pub mod http;
pub mod lambda;
