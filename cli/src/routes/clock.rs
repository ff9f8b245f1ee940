//! Clock routes (§6): status, presets, pending-action management, the
//! start/stop/pause/resume/force-tick controls, and the SSE event stream.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::stream::{self, Stream};
use osf_sim_core::{ActionPayload, ClockMode, ClockPreset, NetworkClock};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::to_value(state.clock.get_state().await).unwrap())
}

pub async fn presets() -> Json<serde_json::Value> {
    let all = [
        ClockPreset::Test,
        ClockPreset::DemoFast,
        ClockPreset::Demo,
        ClockPreset::Casual,
        ClockPreset::Slow,
        ClockPreset::Realtime,
        ClockPreset::Daily,
    ];
    let entries: Vec<_> = all
        .iter()
        .map(|preset| {
            let (interval_seconds, warning_seconds) = preset.config();
            json!({
                "preset": preset,
                "interval_seconds": interval_seconds,
                "warning_seconds": warning_seconds,
            })
        })
        .collect();
    Json(json!({ "presets": entries }))
}

pub async fn pending_actions(State(state): State<AppState>) -> Json<serde_json::Value> {
    let next_month = state.store.current_month() + 1;
    Json(json!({ "pending_actions": state.store.list_pending_actions(next_month) }))
}

#[derive(Deserialize)]
pub struct SetPresetBody {
    pub preset: ClockPreset,
}

pub async fn set_preset(State(state): State<AppState>, Json(body): Json<SetPresetBody>) -> impl IntoResponse {
    state.clock.set_preset(body.preset).await;
    Json(json!({ "ok": true }))
}

#[derive(Deserialize)]
pub struct SetIntervalBody {
    pub interval_seconds: u64,
}

pub async fn set_interval(State(state): State<AppState>, Json(body): Json<SetIntervalBody>) -> ApiResult<Json<serde_json::Value>> {
    state.clock.set_interval(body.interval_seconds).await?;
    Ok(Json(json!({ "ok": true })))
}

#[derive(Deserialize)]
pub struct SetModeBody {
    pub mode: ClockMode,
}

pub async fn set_mode(State(state): State<AppState>, Json(body): Json<SetModeBody>) -> impl IntoResponse {
    state.clock.set_mode(body.mode).await;
    Json(json!({ "ok": true }))
}

pub async fn start(State(state): State<AppState>) -> impl IntoResponse {
    state.clock.start().await;
    Json(json!({ "ok": true }))
}

pub async fn stop(State(state): State<AppState>) -> impl IntoResponse {
    state.clock.stop().await;
    Json(json!({ "ok": true }))
}

pub async fn pause(State(state): State<AppState>) -> impl IntoResponse {
    state.clock.pause().await;
    Json(json!({ "ok": true }))
}

pub async fn resume(State(state): State<AppState>) -> impl IntoResponse {
    state.clock.resume().await;
    Json(json!({ "ok": true }))
}

pub async fn force_tick(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let outcome = state.clock.force_tick().await?;
    Ok(Json(json!({
        "month": outcome.month,
        "actions_processed": outcome.actions_processed,
        "events_generated": outcome.events_generated,
        "narrative": outcome.narrative,
        "checksum": outcome.checksum,
    })))
}

#[derive(Deserialize)]
pub struct QueueActionBody {
    pub participant_id: String,
    pub action_id: String,
    pub priority: u8,
    #[serde(flatten)]
    pub payload: ActionPayload,
}

pub async fn queue_action(State(state): State<AppState>, Json(body): Json<QueueActionBody>) -> ApiResult<Json<serde_json::Value>> {
    state
        .clock
        .queue_action(&body.participant_id, body.payload, body.priority, body.action_id)?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn remove_action(State(state): State<AppState>, Path(action_id): Path<String>) -> impl IntoResponse {
    let removed = state.clock.remove_action(&action_id);
    Json(json!({ "removed": removed }))
}

pub async fn clear_actions(State(state): State<AppState>) -> impl IntoResponse {
    let count = state.clock.clear_actions();
    Json(json!({ "cleared": count }))
}

struct SubscriptionGuard {
    subscription: osf_sim_core::Subscription,
    clock: NetworkClock,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.clock.unsubscribe(self.subscription.id());
    }
}

/// `GET stream` (§6): one SSE connection per subscriber, backed by the
/// Subscription Bus's bounded per-subscriber mailbox.
pub async fn stream(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.clock.subscribe();
    let guard = SubscriptionGuard {
        subscription,
        clock: state.clock.clone(),
    };

    let events = stream::unfold(guard, |guard| async move {
        let event = guard.subscription.recv().await;
        let sse_event = Event::default().event(event.event_name.clone()).json_data(event.payload).unwrap_or_else(|_| Event::default());
        Some((Ok(sse_event), guard))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
