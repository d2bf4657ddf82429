//! Visit operations shared by the HTTP and direct-invocation paths.
//!
//! Both adapters funnel through [`handle_visit`], so logging, metrics, and the
//! error-to-response mapping are identical regardless of how a visit arrives.

use std::time::Instant;

use tally_core::error::ClientCode;
use tally_core::protocol::{VisitRequest, VisitResponse};

use crate::app_state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOp {
    /// Count a visit and return the new total.
    Increment,
    /// Return the current total without counting.
    Read,
}

impl VisitOp {
    pub fn as_str(self) -> &'static str {
        match self {
            VisitOp::Increment => "increment",
            VisitOp::Read => "read",
        }
    }
}

/// Response body plus the HTTP status it should travel with.
#[derive(Debug, Clone)]
pub struct VisitOutcome {
    pub status: u16,
    pub response: VisitResponse,
}

pub async fn handle_visit(state: &AppState, op: VisitOp, req: &VisitRequest) -> VisitOutcome {
    let key = state.counter_key();
    let started = Instant::now();

    let result = match op {
        VisitOp::Increment => {
            tracing::info!(page = %req.page, user_agent = ?req.user_agent, "processing visit");
            state.counter().increment(key).await
        }
        VisitOp::Read => state.counter().read(key).await,
    };

    let m = state.metrics();
    m.op_duration.observe(&[("op", op.as_str())], started.elapsed());

    match result {
        Ok(count) => {
            m.visits.inc(&[("op", op.as_str()), ("outcome", "ok")]);
            VisitOutcome {
                status: 200,
                response: VisitResponse::success(count),
            }
        }
        Err(e) => {
            let code = e.client_code();
            m.visits.inc(&[("op", op.as_str()), ("outcome", "error")]);
            m.counter_errors.inc(&[("op", op.as_str()), ("code", code.as_str())]);
            tracing::error!(
                op = op.as_str(),
                key,
                code = code.as_str(),
                error = %e,
                "visit failed"
            );
            VisitOutcome {
                status: status_for(code),
                response: VisitResponse::failure(),
            }
        }
    }
}

/// Response for a body that could not be parsed.
pub fn rejected(state: &AppState, op: VisitOp, reason: &str) -> VisitOutcome {
    tracing::warn!(op = op.as_str(), reason, "rejecting malformed visit request");
    let m = state.metrics();
    m.visits.inc(&[("op", op.as_str()), ("outcome", "error")]);
    m.counter_errors.inc(&[("op", op.as_str()), ("code", ClientCode::BadRequest.as_str())]);
    VisitOutcome {
        status: 400,
        response: VisitResponse::failure(),
    }
}

pub fn status_for(code: ClientCode) -> u16 {
    match code {
        ClientCode::BadRequest => 400,
        ClientCode::StoreUnavailable | ClientCode::Contention | ClientCode::Timeout => 503,
        ClientCode::Internal => 500,
    }
}
