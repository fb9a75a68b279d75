use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "wellbeing-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Reports database reachability. Requests are still served from static
/// data when it is down, so the service reports "degraded" instead of failing.
pub async fn readyz(State(state): State<AppState>) -> Json<Value> {
    let database = if !state.repo.database_configured() {
        "not_configured"
    } else if state.repo.database_reachable().await {
        "ok"
    } else {
        "failed"
    };

    let status = if database == "ok" { "ready" } else { "degraded" };

    Json(json!({
        "status": status,
        "checks": { "database": database },
    }))
}
