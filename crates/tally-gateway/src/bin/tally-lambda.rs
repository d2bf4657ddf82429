//! Lambda entry point for direct invocation.
//!
//! Config comes from the environment (`VISITOR_COUNTS_TABLE`, `AWS_REGION`,
//! `COUNTER_KEY`). The store client is built once per cold start and shared
//! across invocations.

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

use tally_gateway::app_state::AppState;
use tally_gateway::config::TallyConfig;
use tally_gateway::transport::lambda::{handle_event, InvocationReply};

async fn handle_request(
    state: &AppState,
    event: LambdaEvent<Value>,
) -> Result<InvocationReply, Error> {
    tracing::debug!(request_id = %event.context.request_id, "invocation");
    Ok(handle_event(state, event.payload).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .without_time()
        .init();

    let cfg = TallyConfig::from_env()?;
    let state = AppState::connect(cfg).await?;

    lambda_runtime::run(service_fn(|event: LambdaEvent<Value>| {
        let state = state.clone();
        async move { handle_request(&state, event).await }
    }))
    .await
}
