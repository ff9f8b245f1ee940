//! Economy routes (§6): current market conditions, the monthly governor
//! narrative, and an event-generation trigger.
//!
//! `events/generate` is deliberately an alias for a forced tick rather than
//! a standalone random draw: the Event Generator only ever runs as step 2
//! of the Tick Pipeline, consuming the single shared `RngStream` (P4) — a
//! bare "generate one event" endpoint would need its own RNG draw outside
//! that stream and break determinism.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn economy(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "market": state.pipeline.market_snapshot().await }))
}

pub async fn generate_events(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let outcome = state.clock.force_tick().await?;
    Ok(Json(json!({
        "month": outcome.month,
        "events_generated": outcome.events_generated,
    })))
}

pub async fn news(State(state): State<AppState>, Path(month): Path<u64>) -> ApiResult<Json<serde_json::Value>> {
    let snapshot = state
        .store
        .get_snapshot(month)
        .ok_or(osf_sim_core::CoreError::SnapshotNotFound(month))?;
    Ok(Json(json!({
        "month": snapshot.network_month,
        "governor_summary": snapshot.governor_summary,
    })))
}
