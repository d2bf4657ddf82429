//! tally gateway library entry.
//!
//! Wires config, the store backend, and the counter into the two inbound
//! adapters (axum HTTP server and Lambda direct invocation). Consumed by the
//! binaries in this crate and by integration tests.

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod store;
pub mod transport;
pub mod visit;
