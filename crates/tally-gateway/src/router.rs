//! Axum router wiring.

use axum::{routing::get, Router};

use crate::{app_state::AppState, ops, transport::http};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/visit",
            get(http::get_visit)
                .post(http::post_visit)
                .options(http::preflight),
        )
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
