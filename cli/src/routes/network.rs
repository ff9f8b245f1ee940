//! Network state routes (§6): participants, properties, snapshot history,
//! event history, and a combined recent-activity feed.

use axum::extract::{Path, Query, State};
use axum::Json;
use osf_sim_core::models::EventCategory;
use osf_sim_core::store::{EventFilter, ParticipantFilter};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn state(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let month = state.store.current_month();
    let snapshot = state.store.get_snapshot(month);
    Ok(Json(json!({
        "current_month": month,
        "latest_snapshot": snapshot,
    })))
}

pub async fn properties(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "properties": state.store.list_properties() }))
}

pub async fn property(State(state): State<AppState>, Path(property_id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    let property = state.store.get_property(&property_id)?;
    Ok(Json(json!(property)))
}

pub async fn participants(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "participants": state.store.list_participants(ParticipantFilter::default()),
    }))
}

pub async fn participant(State(state): State<AppState>, Path(participant_id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    let participant = state.store.get_participant(&participant_id)?;
    let holdings = state.store.list_holdings(&participant_id);
    Ok(Json(json!({ "participant": participant, "holdings": holdings })))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub months: Option<u64>,
}

pub async fn history_snapshots(State(state): State<AppState>, Query(query): Query<HistoryQuery>) -> Json<serde_json::Value> {
    let months = query.months.unwrap_or(12).max(1);
    let current_month = state.store.current_month();
    let from_month = current_month.saturating_sub(months.saturating_sub(1)).max(1);
    Json(json!({
        "snapshots": state.store.list_snapshots(from_month, months as usize),
    }))
}

#[derive(Deserialize)]
pub struct EventsQuery {
    pub month: Option<u64>,
    #[serde(rename = "type")]
    pub category: Option<EventCategory>,
    pub limit: Option<usize>,
}

pub async fn history_events(State(state): State<AppState>, Query(query): Query<EventsQuery>) -> Json<serde_json::Value> {
    let filter = EventFilter {
        month: query.month,
        category: query.category,
    };
    let limit = query.limit.unwrap_or(50);
    Json(json!({ "events": state.store.list_events(filter, limit) }))
}

pub async fn history_metrics(State(state): State<AppState>, Query(query): Query<HistoryQuery>) -> Json<serde_json::Value> {
    let months = query.months.unwrap_or(12).max(1);
    let current_month = state.store.current_month();
    let from_month = current_month.saturating_sub(months.saturating_sub(1)).max(1);
    let snapshots = state.store.list_snapshots(from_month, months as usize);
    let aggregates: Vec<_> = snapshots
        .iter()
        .map(|snapshot| json!({ "month": snapshot.network_month, "aggregates": snapshot.aggregates }))
        .collect();
    Json(json!({ "metrics": aggregates }))
}

pub async fn feed(State(state): State<AppState>, Query(query): Query<EventsQuery>) -> Json<serde_json::Value> {
    let filter = EventFilter {
        month: None,
        category: query.category,
    };
    let limit = query.limit.unwrap_or(20);
    let events = state.store.list_events(filter, limit);
    Json(json!({ "feed": events }))
}
