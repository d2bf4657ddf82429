//! tally core: the visitor counter, its store contract, and the wire DTOs.
//!
//! This crate owns the read-modify-write protocol for keyed counters and the
//! error surface shared by the gateway and the Lambda entry point. It knows
//! nothing about HTTP or AWS; backends plug in through [`store::KvStore`].
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `CounterError`/`Result` so a bad store
//! response never takes the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod counter;
pub mod error;
pub mod memory;
pub mod protocol;
pub mod record;
pub mod retry;
pub mod store;

/// Shared result type.
pub use error::{CounterError, Result, StoreError};

pub use counter::CounterStore;
pub use record::CounterRecord;
pub use retry::RetryPolicy;
pub use store::{KvStore, PutCondition};
