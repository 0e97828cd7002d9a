use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::AppContext;

/// Liveness probe. Reports degraded (but still 200) when the DB is unreachable
/// so load balancers keep routing while operators get a signal.
pub async fn health(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    let db_ok = ctx.storage.count_users().await.is_ok();
    Json(json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": ctx.started_at.elapsed().as_secs(),
        "db_ok": db_ok,
        "cutoff_rows": ctx.cutoffs.len(),
    }))
}
