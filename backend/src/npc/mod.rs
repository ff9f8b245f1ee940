//! C4 — NPC Engine.
//!
//! Owns a fixed catalogue of goal-driven agents (`profiles`). Every tick,
//! each NPC may submit at most one intent, routed through the same Action
//! Processor humans use — NPCs never bypass validation (§4.4).
//!
//! Shaped after the teacher's `CashManagerPolicy` trait
//! (`backend/src/policy/mod.rs`): one trait (`NpcBrain`), one `decide`
//! method, role dispatch through a small factory match, analogous to
//! `PolicyConfig`'s `Fifo | Deadline | LiquidityAware | ...` construction.

mod profiles;

use crate::actions::{ActionProcessor, TickContext};
use crate::market::MarketModel;
use crate::models::{ActionPayload, ActionResult, Participant, ParticipantRole, PropertyState};
use crate::rng::RngStream;
use crate::store::StateStore;

pub use profiles::{catalogue, NpcProfile};

/// A single action an NPC brain wants to take this tick.
pub struct ActionIntent {
    pub payload: ActionPayload,
    pub priority: u8,
}

/// Everything a brain needs to decide, bundled so `decide` stays a single
/// borrow rather than a long parameter list.
pub struct NpcContext<'a> {
    pub month: u64,
    pub participant: &'a Participant,
    pub properties: &'a [PropertyState],
    pub holdings: &'a [(String, crate::models::Holding)],
    pub market: &'a MarketModel,
}

pub trait NpcBrain {
    fn decide(&self, ctx: &NpcContext, rng: &mut RngStream) -> Option<ActionIntent>;
}

struct MarketMakerBrain;
struct DeveloperBrain;
struct RenterBrain;
struct InvestorBrain;
struct PassiveBrain;

/// Small scan over properties picking the best-scoring one for a given
/// personality, per §4.4's listed factors (yield vs target, price
/// deviation from par, contrarian boost in a declining market). Kept to a
/// handful of terms rather than the source's full weighting table.
fn evaluate_market<'a>(
    properties: &'a [PropertyState],
    personality: &crate::models::Personality,
    declining: bool,
) -> Option<&'a PropertyState> {
    properties
        .iter()
        .filter(|p| p.tokens_available() > 0.0)
        .map(|p| {
            let annual_yield = (p.weekly_rent() as f64 * 52.0) / (p.token_price() * p.total_tokens()).max(1.0);
            let target_yield = 0.03 + personality.risk_tolerance * 0.07;
            let mut score = 50.0 + (annual_yield - target_yield) * 200.0;
            score -= (1.0 - p.token_price()).abs() * 20.0;
            if declining && personality.contrarian > 0.5 {
                score += 15.0;
            }
            (p, score)
        })
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(p, _)| p)
}

/// `urgency_bonus = sum(0.2 * priority / 10)` over uncompleted goals whose
/// deadline is within 3 months (§4.4 step 1).
fn urgency_bonus(participant: &Participant, month: u64) -> f64 {
    participant
        .goals()
        .iter()
        .filter(|g| g.is_urgent(month, 3))
        .map(|g| 0.2 * g.priority as f64 / 10.0)
        .sum()
}

/// No history is kept between ticks, so "investor-credit momentum" is
/// derived from the current consumer confidence reading rather than a
/// trend: centered at 50, scaled to roughly [-1, 1].
fn investor_credit_momentum(market: &MarketModel) -> f64 {
    (market.current().consumer_confidence - 50.0) / 50.0
}

fn should_act(participant: &Participant, month: u64, market: &MarketModel, rng: &mut RngStream) -> bool {
    let personality = match participant.personality() {
        Some(p) => p,
        None => return false,
    };
    let mut probability = (personality.activity_level + urgency_bonus(participant, month)).clamp(0.0, 1.0);
    if participant.role() == ParticipantRole::Investor && investor_credit_momentum(market) > 0.15 {
        probability = (probability * 1.2).min(1.0);
    }
    rng.chance(probability)
}

impl NpcBrain for MarketMakerBrain {
    /// Alternates small buy/sell around the 1.0 par band, keyed off month
    /// parity so the alternation is deterministic without per-NPC memory.
    fn decide(&self, ctx: &NpcContext, _rng: &mut RngStream) -> Option<ActionIntent> {
        let property = ctx.properties.iter().find(|p| p.tokens_available() > 0.0)?;
        let band = property.token_price() * 0.02;
        if ctx.month % 2 == 0 {
            Some(ActionIntent {
                payload: ActionPayload::BuyTokens {
                    property_id: property.id().to_string(),
                    token_amount: 100.0,
                    max_price: property.token_price() + band,
                },
                priority: 6,
            })
        } else {
            let held = ctx.holdings.iter().find(|(pid, _)| pid == property.id())?;
            if held.1.token_amount() < 100.0 {
                return None;
            }
            Some(ActionIntent {
                payload: ActionPayload::SellTokens {
                    property_id: property.id().to_string(),
                    token_amount: 100.0,
                    min_price: property.token_price() - band,
                },
                priority: 6,
            })
        }
    }
}

impl NpcBrain for DeveloperBrain {
    /// Emits a listing-proposal service request every third month.
    fn decide(&self, ctx: &NpcContext, _rng: &mut RngStream) -> Option<ActionIntent> {
        if ctx.month % 3 != 0 {
            return None;
        }
        let property = ctx.properties.first()?;
        Some(ActionIntent {
            payload: ActionPayload::RequestService {
                property_id: property.id().to_string(),
                service_type: "listing_proposal".to_string(),
                description: "Quarterly listing review proposed by network developer".to_string(),
            },
            priority: 3,
        })
    }
}

impl NpcBrain for RenterBrain {
    /// Occasionally invests a small fraction of savings; otherwise passive.
    fn decide(&self, ctx: &NpcContext, rng: &mut RngStream) -> Option<ActionIntent> {
        let personality = ctx.participant.personality()?;
        if !rng.chance(personality.activity_level * 0.3) {
            return None;
        }
        let property = evaluate_market(ctx.properties, personality, false)?;
        let budget = (ctx.participant.balance() as f64 * 0.10).max(0.0);
        if budget <= 0.0 || property.token_price() <= 0.0 {
            return None;
        }
        let token_amount = (budget / (property.token_price() * 100.0)).floor();
        if token_amount < 1.0 {
            return None;
        }
        Some(ActionIntent {
            payload: ActionPayload::BuyTokens {
                property_id: property.id().to_string(),
                token_amount,
                max_price: property.token_price() * 1.05,
            },
            priority: 2,
        })
    }
}

impl NpcBrain for InvestorBrain {
    /// Consults the top unsatisfied goal: accumulate -> buy, income -> buy
    /// the highest-yielding property, divest -> sell an existing holding.
    fn decide(&self, ctx: &NpcContext, _rng: &mut RngStream) -> Option<ActionIntent> {
        let personality = ctx.participant.personality()?;
        let goal = ctx.participant.top_unsatisfied_goal()?;
        let declining = matches!(
            ctx.market.market_condition(),
            crate::models::MarketCondition::Declining | crate::models::MarketCondition::Bust
        );

        match goal.goal_type {
            crate::models::GoalType::Accumulate | crate::models::GoalType::Income => {
                let property = evaluate_market(ctx.properties, personality, declining)?;
                let budget = (ctx.participant.balance() as f64 * 0.20).max(0.0);
                let token_amount = (budget / (property.token_price() * 100.0)).floor();
                if token_amount < 1.0 {
                    return None;
                }
                Some(ActionIntent {
                    payload: ActionPayload::BuyTokens {
                        property_id: property.id().to_string(),
                        token_amount,
                        max_price: property.token_price() * 1.03,
                    },
                    priority: 5,
                })
            }
            crate::models::GoalType::Divest => {
                let (property_id, holding) = ctx.holdings.first()?;
                let sell_amount = (holding.token_amount() * 0.5).max(1.0).min(holding.token_amount());
                let property = ctx.properties.iter().find(|p| p.id() == property_id)?;
                Some(ActionIntent {
                    payload: ActionPayload::SellTokens {
                        property_id: property_id.clone(),
                        token_amount: sell_amount,
                        min_price: property.token_price() * 0.95,
                    },
                    priority: 5,
                })
            }
            crate::models::GoalType::Stabilize => None,
        }
    }
}

impl NpcBrain for PassiveBrain {
    fn decide(&self, _ctx: &NpcContext, _rng: &mut RngStream) -> Option<ActionIntent> {
        None
    }
}

fn brain_for(role: ParticipantRole) -> Box<dyn NpcBrain> {
    match role {
        ParticipantRole::MarketMaker => Box::new(MarketMakerBrain),
        ParticipantRole::Developer => Box::new(DeveloperBrain),
        ParticipantRole::Renter => Box::new(RenterBrain),
        ParticipantRole::Investor => Box::new(InvestorBrain),
        ParticipantRole::Homeowner | ParticipantRole::Service | ParticipantRole::Foundation => {
            Box::new(PassiveBrain)
        }
    }
}

pub struct NpcEngine;

impl Default for NpcEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NpcEngine {
    pub fn new() -> Self {
        Self
    }

    /// Idempotent-on-display-name seeding: creates a participant for every
    /// catalogue profile not already present in the store.
    pub fn ensure_seeded(&self, store: &dyn StateStore) {
        for profile in catalogue() {
            if store.get_participant(profile.id).is_ok() {
                continue;
            }
            let participant = Participant::new_npc(
                profile.id.to_string(),
                profile.display_name.to_string(),
                profile.role,
                profile.starting_balance,
                (profile.personality)(),
                (profile.goals)(),
            );
            let _ = store.create_participant(participant);
        }
    }

    /// Run every NPC's brain once and submit the resulting intents through
    /// the Action Processor under the tick context (§4.4 step 4). A
    /// failing NPC action is recorded in the results but never aborts the
    /// rest of the roster.
    pub fn process_tick(
        &self,
        store: &dyn StateStore,
        processor: &ActionProcessor,
        market: &MarketModel,
        month: u64,
        rng: &mut RngStream,
        tick_ctx: &mut TickContext,
    ) -> Vec<ActionResult> {
        self.ensure_seeded(store);
        let properties = store.list_properties();
        let mut results = Vec::new();

        for profile in catalogue() {
            let participant = match store.get_participant(profile.id) {
                Ok(p) => p,
                Err(_) => continue,
            };
            if !should_act(&participant, month, market, rng) {
                continue;
            }

            let holdings = store.list_holdings(profile.id);
            let ctx = NpcContext {
                month,
                participant: &participant,
                properties: &properties,
                holdings: &holdings,
                market,
            };
            let brain = brain_for(profile.role);
            if let Some(intent) = brain.decide(&ctx, rng) {
                let action_id = format!("npc-{}-{}", profile.id, month);
                let result = processor.execute(&action_id, profile.id, &intent.payload, tick_ctx);
                results.push(result);
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use std::sync::Arc;

    #[test]
    fn ensure_seeded_is_idempotent() {
        let store = InMemoryStore::new();
        let engine = NpcEngine::new();
        engine.ensure_seeded(&store);
        let first_count = store.list_participants(Default::default()).len();
        engine.ensure_seeded(&store);
        let second_count = store.list_participants(Default::default()).len();
        assert_eq!(first_count, second_count);
        assert_eq!(first_count, catalogue().len());
    }

    #[test]
    fn process_tick_never_panics_on_empty_properties() {
        let store = Arc::new(InMemoryStore::new());
        let processor = ActionProcessor::new(store.clone());
        let engine = NpcEngine::new();
        let market = MarketModel::new();
        let mut rng = RngStream::new(5);
        let mut ctx = TickContext::new(1);
        let results = engine.process_tick(&*store, &processor, &market, 1, &mut rng, &mut ctx);
        assert!(results.iter().all(|r| !r.action_type.is_empty()));
    }
}
