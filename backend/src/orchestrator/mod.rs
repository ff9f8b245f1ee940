//! C7 — Tick Pipeline.
//!
//! The single entry point that advances the network by one month.
//! Ordered, all-or-nothing in spirit (§5: every step below mutates
//! through the Action Processor or the Store's own validate-then-mutate
//! methods, never a raw field write, so a failure partway through never
//! leaves two entities disagreeing about the month).
//!
//! Step order is the teacher's `Orchestrator::tick` shape
//! (`backend/src/orchestrator/engine.rs`: advance queues, settle, apply
//! costs, snapshot) generalized from RTGS settlement phases to this
//! domain's phases: advance market, generate events, drain pending
//! actions, run NPCs, aggregate, narrate, snapshot, broadcast.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::actions::{ActionProcessor, TickContext};
use crate::bus::SubscriptionBus;
use crate::error::{CoreError, CoreResult};
use crate::eventgen::EventGenerator;
use crate::llm::{summarize_with_fallback, NarrativeBridge, NarrativeRequest, NullBridge};
use crate::market::MarketModel;
use crate::models::{ActionResult, SnapshotAggregates};
use crate::npc::NpcEngine;
use crate::rng::RngStream;
use crate::store::{ParticipantFilter, StateStore};

/// Summary of one completed tick, broadcast on the bus and returned to
/// whoever forced the tick (§4.7, §4.6).
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub month: u64,
    pub actions_processed: u64,
    pub events_generated: u64,
    pub narrative: String,
    pub checksum: String,
}

/// Ties together every other component for the duration of one tick.
/// Owns the process-local simulation state that has no place in the
/// `StateStore` (the RNG stream and the in-flight `MarketModel`) — these
/// are mechanism, not persisted domain entities, mirroring the teacher's
/// `Orchestrator` owning its own `RngManager` rather than storing it as
/// an `Agent` field.
pub struct TickPipeline {
    store: Arc<dyn StateStore>,
    bus: Arc<SubscriptionBus>,
    market: Mutex<MarketModel>,
    rng: Mutex<RngStream>,
    event_generator: EventGenerator,
    npc_engine: NpcEngine,
    processor: ActionProcessor,
    narrative_bridge: Box<dyn NarrativeBridge>,
    narrative_timeout: std::time::Duration,
    last_outcome: Mutex<Option<TickOutcome>>,
}

impl TickPipeline {
    pub fn new(store: Arc<dyn StateStore>, bus: Arc<SubscriptionBus>, seed: u64) -> Self {
        Self::with_bridge(store, bus, seed, Box::new(NullBridge))
    }

    pub fn with_bridge(
        store: Arc<dyn StateStore>,
        bus: Arc<SubscriptionBus>,
        seed: u64,
        narrative_bridge: Box<dyn NarrativeBridge>,
    ) -> Self {
        let processor = ActionProcessor::new(store.clone());
        Self {
            store,
            bus,
            market: Mutex::new(MarketModel::new()),
            rng: Mutex::new(RngStream::new(seed)),
            event_generator: EventGenerator::new(),
            npc_engine: NpcEngine::new(),
            processor,
            narrative_bridge,
            narrative_timeout: std::time::Duration::from_millis(2_000),
            last_outcome: Mutex::new(None),
        }
    }

    /// Run exactly one tick (§4.7). Coarse-grained mutual exclusion: only
    /// one tick runs at a time per pipeline instance, enforced by holding
    /// the `market`/`rng` locks for the whole call rather than a separate
    /// flag, so a second concurrent caller simply waits rather than racing
    /// partial state (§5 concurrency model — the clock's own
    /// `is_processing` guard additionally short-circuits the common case
    /// before it ever reaches here).
    ///
    /// Atomicity (§4.7 failure policy, P7): a `StateStore` checkpoint is
    /// taken before any write this tick performs, alongside a plain-value
    /// backup of the in-process market/RNG state. Any failure anywhere in
    /// the body below — draining actions, running NPCs, narrating,
    /// snapshotting — restores all three and returns the error with
    /// `current_month` and every store entity exactly as they were,
    /// including pending actions the tick had already drained back to
    /// `pending`.
    #[instrument(skip(self))]
    pub async fn run_tick(&self) -> CoreResult<TickOutcome> {
        let started = Instant::now();
        let mut market = self.market.lock().await;
        let mut rng = self.rng.lock().await;
        let next_month = self.store.current_month() + 1;

        let checkpoint = self.store.checkpoint();
        let market_backup = *market;
        let rng_backup = rng.clone();

        match self.run_tick_body(&mut market, &mut rng, next_month, started).await {
            Ok(outcome) => {
                info!(
                    month = outcome.month,
                    actions = outcome.actions_processed,
                    events = outcome.events_generated,
                    "tick committed"
                );

                // Broadcast the per-month feed event for subscribers
                // tracking the network narrative, independent of the
                // clock's own lifecycle broadcasts.
                self.bus.publish(
                    "network_event",
                    serde_json::json!({ "month": outcome.month, "narrative": outcome.narrative }),
                );

                *self.last_outcome.lock().await = Some(outcome.clone());
                Ok(outcome)
            }
            Err(err) => {
                self.store.restore(checkpoint);
                *market = market_backup;
                *rng = rng_backup;
                Err(err)
            }
        }
    }

    /// The actual step sequence (§4.7 steps 1-8), isolated into its own
    /// method so `run_tick` can bracket it with a single checkpoint/restore
    /// pair rather than threading rollback logic through every step.
    async fn run_tick_body(
        &self,
        market: &mut MarketModel,
        rng: &mut RngStream,
        next_month: u64,
        started: Instant,
    ) -> CoreResult<TickOutcome> {
        let mut ctx = TickContext::new(next_month);
        let mut tick_results: Vec<ActionResult> = Vec::new();

        // Step 1: advance the macro cycle.
        market.update_cycle(rng);

        // Step 2: generate this month's events, folding impacts back into
        // the market as they fire.
        let generated = self.event_generator.generate_for_tick(next_month, market, rng);
        for event in &generated.events {
            self.store.create_event(event.clone())?;
        }

        // Step 3: apply appreciation to every property before trading.
        let appreciation_rate = market.appreciation_rate(rng);
        for property in self.store.list_properties() {
            let id = property.id().to_string();
            self.store
                .with_property_mut(&id, Box::new(move |p| p.apply_appreciation(appreciation_rate, next_month)))?;
        }

        // Step 4: drain human-submitted pending actions in priority order.
        let pending = self.store.list_pending_actions(next_month);
        for action in pending {
            let result = self
                .processor
                .execute(action.id(), action.participant_id(), action.payload(), &mut ctx);
            self.store.complete_action(action.id(), result.clone(), next_month)?;
            tick_results.push(result);
        }

        // Step 5: run every NPC brain once, through the same Action
        // Processor humans use.
        let npc_results = self
            .npc_engine
            .process_tick(&*self.store, &self.processor, &*market, next_month, rng, &mut ctx);
        tick_results.extend(npc_results);

        // Step 6: narrate, with a hard-bounded external call that always
        // degrades to the deterministic fallback.
        let recent_titles: Vec<String> = generated.events.iter().map(|e| e.title.clone()).collect();
        let narrative = summarize_with_fallback(
            self.narrative_bridge.as_ref(),
            NarrativeRequest {
                month: next_month,
                recent_events: recent_titles,
                market_summary: format!("{:?}", market.market_condition()),
            },
            generated.fallback_summary.clone(),
            self.narrative_timeout,
        )
        .await;

        // Step 7: aggregate and commit the snapshot.
        let actions_processed = tick_results.len() as u64;
        let aggregates = self.aggregate(actions_processed, &tick_results);
        let snapshot = crate::models::NetworkSnapshot::new(
            next_month,
            aggregates,
            narrative.clone(),
            started.elapsed().as_millis() as u64,
        )
        .with_state_blob(serde_json::json!({
            "market": market.current(),
            "month": next_month,
        }));
        let checksum = snapshot.checksum().map_err(|e| CoreError::Fatal(e.to_string()))?;
        self.store.create_snapshot(snapshot)?;

        // Step 8: only once the snapshot is durably committed does the
        // month pointer advance (§5, P7) — a failure up to and including
        // the snapshot write leaves `current_month` untouched, and the
        // caller's checkpoint restore undoes everything written above.
        self.store.set_current_month(next_month);

        Ok(TickOutcome {
            month: next_month,
            actions_processed,
            events_generated: generated.events.len() as u64,
            narrative,
            checksum,
        })
    }

    /// Throughput counters are per-snapshot, not lifetime totals (§3): only
    /// the buy/sell volume, rent, and dividends that moved *this tick* —
    /// drawn from the `ActionResult`s this tick's actions/NPCs produced —
    /// count toward `tokens_traded`/`rent_collected`/`dividends_paid`.
    fn aggregate(&self, actions_processed: u64, tick_results: &[ActionResult]) -> SnapshotAggregates {
        let participants = self.store.list_participants(ParticipantFilter::default());
        let properties = self.store.list_properties();

        let property_count = properties.len() as u64;
        let total_valuation: i64 = properties.iter().map(|p| p.current_valuation()).sum();
        let avg_token_price = if properties.is_empty() {
            0.0
        } else {
            properties.iter().map(|p| p.token_price()).sum::<f64>() / properties.len() as f64
        };
        let avg_yield = if properties.is_empty() {
            0.0
        } else {
            properties
                .iter()
                .map(|p| {
                    let denom = (p.token_price() * p.total_tokens()).max(1.0);
                    (p.weekly_rent() as f64 * 52.0) / denom
                })
                .sum::<f64>()
                / properties.len() as f64
        };

        let tokens_traded: f64 = tick_results
            .iter()
            .filter(|r| r.success && matches!(r.action_type.as_str(), "buy_tokens" | "sell_tokens"))
            .filter_map(|r| r.data.as_ref()?.get("tokens")?.as_f64())
            .sum();
        let rent_collected: i64 = tick_results
            .iter()
            .filter(|r| r.success)
            .filter_map(|r| match r.action_type.as_str() {
                "pay_rent" => r.data.as_ref()?.get("amount")?.as_i64(),
                "collect_rent" => r.data.as_ref()?.get("monthly_rent")?.as_i64(),
                _ => None,
            })
            .sum();
        let dividends_paid: i64 = tick_results
            .iter()
            .filter(|r| r.success && r.action_type == "collect_rent")
            .filter_map(|r| r.data.as_ref()?.get("dividend_pool")?.as_i64())
            .sum();

        SnapshotAggregates {
            participant_count: participants.len() as u64,
            property_count,
            total_valuation,
            avg_token_price,
            avg_yield,
            actions_processed,
            tokens_traded,
            dividends_paid,
            rent_collected,
        }
    }

    pub async fn last_outcome(&self) -> Option<TickOutcome> {
        self.last_outcome.lock().await.clone()
    }

    pub async fn market_snapshot(&self) -> crate::models::MarketState {
        self.market.lock().await.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn a_tick_advances_the_month_and_commits_a_snapshot() {
        let store = Arc::new(InMemoryStore::new());
        let bus = Arc::new(SubscriptionBus::default());
        let pipeline = TickPipeline::new(store.clone(), bus, 42);
        let outcome = pipeline.run_tick().await.unwrap();
        assert_eq!(outcome.month, 1);
        assert_eq!(store.current_month(), 1);
        assert!(store.get_snapshot(1).is_some());
    }

    #[tokio::test]
    async fn repeated_ticks_are_deterministic_for_a_fixed_seed() {
        let store_a = Arc::new(InMemoryStore::new());
        let store_b = Arc::new(InMemoryStore::new());
        let bus_a = Arc::new(SubscriptionBus::default());
        let bus_b = Arc::new(SubscriptionBus::default());
        let pipeline_a = TickPipeline::new(store_a.clone(), bus_a, 7);
        let pipeline_b = TickPipeline::new(store_b.clone(), bus_b, 7);

        let mut checksum_a = String::new();
        let mut checksum_b = String::new();
        for _ in 0..6 {
            checksum_a = pipeline_a.run_tick().await.unwrap().checksum;
            checksum_b = pipeline_b.run_tick().await.unwrap().checksum;
        }
        assert_eq!(checksum_a, checksum_b);
    }
}
