//! C6 — Network Clock.
//!
//! Drives the monthly tick on a wall-clock interval. Owns no domain state
//! itself — it only decides *when* the Tick Pipeline runs and broadcasts
//! the clock's own lifecycle events (`tick_warning`, `clock_sync`,
//! `processing_started`, `month_completed`, `processing_failed`) on the
//! Subscription Bus (§4.6).
//!
//! Grounded in `original_source/backend/src/services/network_clock.py`'s
//! `NetworkClock`: the preset table, the `is_processing` guard, the
//! warn-once-per-cycle behavior, and the periodic `clock_sync` broadcast
//! are all carried over verbatim in shape, realized here with
//! `tokio::sync::Mutex` + a background `tokio::spawn` loop instead of
//! `asyncio.Lock` + an `asyncio` task.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::bus::SubscriptionBus;
use crate::error::{CoreError, CoreResult};
use crate::models::{ActionPayload, PendingAction};
use crate::orchestrator::{TickOutcome, TickPipeline};
use crate::store::StateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockMode {
    Auto,
    Manual,
    Paused,
}

/// Named interval presets, matching the original service's literal
/// `PRESET_CONFIG` table exactly (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockPreset {
    Test,
    DemoFast,
    Demo,
    Casual,
    Slow,
    Realtime,
    Daily,
}

impl ClockPreset {
    /// `(interval_seconds, warning_seconds)` for this preset.
    pub fn config(self) -> (u64, u64) {
        match self {
            ClockPreset::Test => (30, 10),
            ClockPreset::DemoFast => (120, 30),
            ClockPreset::Demo => (300, 60),
            ClockPreset::Casual => (900, 120),
            ClockPreset::Slow => (1_800, 300),
            ClockPreset::Realtime => (3_600, 600),
            ClockPreset::Daily => (86_400, 3_600),
        }
    }
}

pub const MIN_INTERVAL_SECONDS: u64 = 10;
pub const MAX_INTERVAL_SECONDS: u64 = 86_400;

#[derive(Debug, Clone, Serialize)]
pub struct ClockState {
    pub current_month: u64,
    pub mode: ClockMode,
    pub preset: ClockPreset,
    pub interval_seconds: u64,
    pub warning_seconds: u64,
    pub seconds_until_tick: u64,
    pub is_processing: bool,
    pub pending_action_count: usize,
}

struct Inner {
    mode: ClockMode,
    preset: ClockPreset,
    interval_seconds: u64,
    warning_seconds: u64,
    last_tick_epoch_seconds: u64,
    is_processing: bool,
    warned_this_cycle: bool,
}

impl Inner {
    fn from_preset(preset: ClockPreset) -> Self {
        let (interval_seconds, warning_seconds) = preset.config();
        Self {
            mode: ClockMode::Auto,
            preset,
            interval_seconds,
            warning_seconds,
            last_tick_epoch_seconds: now_seconds(),
            is_processing: false,
            warned_this_cycle: false,
        }
    }

    fn seconds_until_tick(&self) -> u64 {
        let elapsed = now_seconds().saturating_sub(self.last_tick_epoch_seconds);
        self.interval_seconds.saturating_sub(elapsed)
    }
}

fn now_seconds() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Drives the Tick Pipeline on a timer (§4.6). Cloneable handle: the
/// background loop and every `cli` route share the same `Arc<Mutex<..>>`
/// state and the same bus.
#[derive(Clone)]
pub struct NetworkClock {
    store: Arc<dyn StateStore>,
    pipeline: Arc<TickPipeline>,
    bus: Arc<SubscriptionBus>,
    inner: Arc<Mutex<Inner>>,
    task: Arc<Mutex<Option<(JoinHandle<()>, watch::Sender<bool>)>>>,
}

impl NetworkClock {
    pub fn new(store: Arc<dyn StateStore>, pipeline: Arc<TickPipeline>, bus: Arc<SubscriptionBus>, preset: ClockPreset) -> Self {
        Self {
            store,
            pipeline,
            bus,
            inner: Arc::new(Mutex::new(Inner::from_preset(preset))),
            task: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawn the background tick loop if it isn't already running (`start`
    /// in the original service is idempotent). Mirrors `_tick_loop` being
    /// a single long-lived task rather than one per call.
    pub async fn start(&self) {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return;
        }
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let clock = self.clone();
        let handle = tokio::spawn(async move {
            let mut sync_tick = tokio::time::interval(Duration::from_secs(1));
            loop {
                tokio::select! {
                    _ = sync_tick.tick() => {
                        clock.tick_loop_step().await;
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });
        *task = Some((handle, shutdown_tx));
        drop(task);
        self.bus.publish("clock_started", serde_json::json!({}));
    }

    /// One second-granularity iteration of the loop body described in
    /// `_tick_loop` (paused/manual -> no-op; warn once when within the
    /// warning window; fire a tick when the interval elapses; otherwise
    /// periodically broadcast `clock_sync`).
    async fn tick_loop_step(&self) {
        let mut should_tick = false;
        let mut should_warn = false;
        let mut sync_payload: Option<serde_json::Value> = None;

        {
            let mut state = self.inner.lock().await;
            if matches!(state.mode, ClockMode::Paused | ClockMode::Manual) {
                return;
            }
            let seconds_left = state.seconds_until_tick();
            if seconds_left == 0 && !state.is_processing {
                should_tick = true;
            } else if seconds_left <= state.warning_seconds && !state.warned_this_cycle {
                state.warned_this_cycle = true;
                should_warn = true;
            }
            if !should_tick {
                sync_payload = Some(serde_json::json!({
                    "seconds_until_tick": seconds_left,
                    "current_month": self.store.current_month(),
                }));
            }
        }

        if should_warn {
            self.bus.publish("tick_warning", serde_json::json!({ "current_month": self.store.current_month() }));
        }
        if let Some(payload) = sync_payload {
            self.bus.publish("clock_sync", payload);
        }
        if should_tick {
            self.process_tick().await;
        }
    }

    /// Run the Tick Pipeline under the `is_processing` guard, broadcasting
    /// lifecycle events the way `_process_tick` does (§4.6, §4.7).
    async fn process_tick(&self) {
        {
            let mut state = self.inner.lock().await;
            if state.is_processing {
                warn!("tick requested while a previous tick is still processing; ignoring");
                return;
            }
            state.is_processing = true;
            state.warned_this_cycle = false;
        }

        self.bus.publish("processing_started", serde_json::json!({ "month": self.store.current_month() }));

        let outcome = self.pipeline.run_tick().await;

        match &outcome {
            Ok(result) => {
                info!(month = result.month, "month completed");
                self.bus.publish("month_completed", tick_outcome_payload(result));
            }
            Err(err) => {
                error!(error = %err, "tick processing failed");
                self.bus.publish("processing_failed", serde_json::json!({ "error": err.to_string() }));
            }
        }

        let mut state = self.inner.lock().await;
        state.is_processing = false;
        state.last_tick_epoch_seconds = now_seconds();
    }

    /// Bypass the timer and run a tick immediately, regardless of mode
    /// (`force_tick` in the original service).
    pub async fn force_tick(&self) -> CoreResult<TickOutcome> {
        self.process_tick().await;
        self.pipeline
            .last_outcome()
            .await
            .ok_or_else(|| CoreError::Fatal("tick produced no outcome".to_string()))
    }

    pub async fn set_preset(&self, preset: ClockPreset) {
        let mut state = self.inner.lock().await;
        let (interval_seconds, warning_seconds) = preset.config();
        state.preset = preset;
        state.interval_seconds = interval_seconds;
        state.warning_seconds = warning_seconds;
        state.last_tick_epoch_seconds = now_seconds();
        state.warned_this_cycle = false;
        drop(state);
        self.bus.publish("config_changed", serde_json::json!({ "preset": preset }));
    }

    pub async fn set_interval(&self, interval_seconds: u64) -> CoreResult<()> {
        if !(MIN_INTERVAL_SECONDS..=MAX_INTERVAL_SECONDS).contains(&interval_seconds) {
            return Err(CoreError::InvalidParams(format!(
                "interval_seconds must be between {MIN_INTERVAL_SECONDS} and {MAX_INTERVAL_SECONDS}"
            )));
        }
        let mut state = self.inner.lock().await;
        state.interval_seconds = interval_seconds;
        state.last_tick_epoch_seconds = now_seconds();
        state.warned_this_cycle = false;
        drop(state);
        self.bus.publish("config_changed", serde_json::json!({ "interval_seconds": interval_seconds }));
        Ok(())
    }

    pub async fn set_mode(&self, mode: ClockMode) {
        let mut state = self.inner.lock().await;
        state.mode = mode;
        drop(state);
        self.bus.publish("mode_changed", serde_json::json!({ "mode": mode }));
    }

    /// Halt the background tick loop entirely (`stop` in the original
    /// service cancels its `asyncio` task). A later `start()` spawns a
    /// fresh one.
    pub async fn stop(&self) {
        let mut task = self.task.lock().await;
        if let Some((handle, shutdown_tx)) = task.take() {
            let _ = shutdown_tx.send(true);
            handle.abort();
        }
        self.bus.publish("clock_stopped", serde_json::json!({}));
    }

    pub async fn pause(&self) {
        self.set_mode(ClockMode::Paused).await;
        self.bus.publish("clock_paused", serde_json::json!({}));
    }

    pub async fn resume(&self) {
        self.set_mode(ClockMode::Auto).await;
        let mut state = self.inner.lock().await;
        state.last_tick_epoch_seconds = now_seconds();
        drop(state);
        self.bus.publish("clock_resumed", serde_json::json!({}));
    }

    /// Queue an action for next month's tick (§4.6, delegating storage to
    /// the `StateStore` rather than keeping its own copy as the legacy
    /// service did).
    pub fn queue_action(&self, participant_id: &str, payload: ActionPayload, priority: u8, action_id: String) -> CoreResult<()> {
        let next_month = self.store.current_month() + 1;
        let action = PendingAction::new(action_id, participant_id.to_string(), payload, priority, next_month, now_seconds());
        self.store.queue_action(action)
    }

    pub fn remove_action(&self, action_id: &str) -> bool {
        self.store.remove_action(action_id)
    }

    pub fn clear_actions(&self) -> usize {
        self.store.clear_actions()
    }

    pub async fn get_state(&self) -> ClockState {
        let state = self.inner.lock().await;
        let pending_action_count = self.store.list_pending_actions(self.store.current_month() + 1).len();
        ClockState {
            current_month: self.store.current_month(),
            mode: state.mode,
            preset: state.preset,
            interval_seconds: state.interval_seconds,
            warning_seconds: state.warning_seconds,
            seconds_until_tick: state.seconds_until_tick(),
            is_processing: state.is_processing,
            pending_action_count,
        }
    }

    pub fn subscribe(&self) -> crate::bus::Subscription {
        self.bus.subscribe()
    }

    pub fn unsubscribe(&self, id: u64) {
        self.bus.unsubscribe(id);
    }
}

fn tick_outcome_payload(outcome: &TickOutcome) -> serde_json::Value {
    serde_json::json!({
        "month": outcome.month,
        "actions_processed": outcome.actions_processed,
        "events_generated": outcome.events_generated,
        "narrative": outcome.narrative,
        "checksum": outcome.checksum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_config_matches_literal_table() {
        assert_eq!(ClockPreset::Test.config(), (30, 10));
        assert_eq!(ClockPreset::DemoFast.config(), (120, 30));
        assert_eq!(ClockPreset::Demo.config(), (300, 60));
        assert_eq!(ClockPreset::Casual.config(), (900, 120));
        assert_eq!(ClockPreset::Slow.config(), (1_800, 300));
        assert_eq!(ClockPreset::Realtime.config(), (3_600, 600));
        assert_eq!(ClockPreset::Daily.config(), (86_400, 3_600));
    }
}
