//! Health check endpoints
//!
//! - /health, /healthz - Liveness probe (is the service running?)
//! - /ready,  /readyz  - Readiness probe (is MongoDB reachable?)

use bson::doc;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::routes::respond::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub database: bool,
}

/// Liveness probe - 200 while the process is running
pub fn health_check() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            healthy: true,
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

/// Readiness probe - 200 only when MongoDB answers a ping
pub async fn readiness_check(state: Arc<AppState>) -> Response<BoxBody> {
    let database = state
        .mongo
        .inner()
        .database(state.mongo.db_name())
        .run_command(doc! { "ping": 1 })
        .await
        .is_ok();

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    json_response(
        status,
        &ReadyResponse {
            ready: database,
            database,
        },
    )
}
