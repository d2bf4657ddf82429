//! Shared error types across tally crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input (bad key, malformed body).
    BadRequest,
    /// Backing store unreachable or returned garbage.
    StoreUnavailable,
    /// Gave up after too many conflicting writers.
    Contention,
    /// Overall deadline elapsed.
    Timeout,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::StoreUnavailable => "STORE_UNAVAILABLE",
            ClientCode::Contention => "CONTENTION",
            ClientCode::Timeout => "TIMEOUT",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Errors reported by a [`crate::store::KvStore`] implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The write precondition did not hold. Expected under contention.
    #[error("conditional check failed")]
    ConditionFailed,
    /// Network, throttling, permissions, or any other backend failure.
    #[error("transport: {0}")]
    Transport(String),
    /// The stored item could not be decoded into a counter record.
    #[error("malformed item: {0}")]
    Malformed(String),
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, CounterError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("store: {0}")]
    Store(String),
    #[error("gave up after {attempts} conflicting attempts")]
    Contention { attempts: u32 },
    #[error("deadline exceeded")]
    Timeout,
    #[error("internal: {0}")]
    Internal(String),
}

impl CounterError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            CounterError::BadRequest(_) => ClientCode::BadRequest,
            CounterError::Store(_) => ClientCode::StoreUnavailable,
            CounterError::Contention { .. } => ClientCode::Contention,
            CounterError::Timeout => ClientCode::Timeout,
            CounterError::Internal(_) => ClientCode::Internal,
        }
    }
}

impl From<StoreError> for CounterError {
    /// Conditional failures are handled by the retry loop and should never reach
    /// this conversion; if one does, it is reported as contention.
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConditionFailed => CounterError::Contention { attempts: 1 },
            StoreError::Transport(msg) | StoreError::Malformed(msg) => CounterError::Store(msg),
        }
    }
}
