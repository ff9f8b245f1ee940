//! C5 — Action Processor.
//!
//! The only component that mutates committed state. Every call here is a
//! single "load, validate, mutate" sequence against the `StateStore`,
//! grounded directly in the teacher's `settlement::rtgs::try_settle`
//! shape: preconditions are checked in full before any mutation, so a
//! rejected action leaves the store untouched.

use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::models::{ActionPayload, ActionResult, EventCategory, EventSeverity, NetworkEvent, ParticipantRole, VoteChoice};
use crate::store::StateStore;

/// Context threaded through every action executed during a tick: the
/// current month and a monotonically increasing event ordinal so emitted
/// `NetworkEvent`s keep the "created_at strictly increasing" guarantee
/// (§5).
#[derive(Debug, Clone, Copy)]
pub struct TickContext {
    pub month: u64,
    pub event_ordinal: u64,
}

impl TickContext {
    pub fn new(month: u64) -> Self {
        Self {
            month,
            event_ordinal: 0,
        }
    }

    fn next_ordinal(&mut self) -> u64 {
        let current = self.event_ordinal;
        self.event_ordinal += 1;
        current
    }
}

pub struct ActionProcessor {
    store: Arc<dyn StateStore>,
}

impl ActionProcessor {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Execute a single action immediately and transactionally. Re-entrant:
    /// safe to call concurrently for unrelated participants because the
    /// store locks per-entity rows internally (§4.5).
    pub fn execute(
        &self,
        action_id: &str,
        participant_id: &str,
        payload: &ActionPayload,
        ctx: &mut TickContext,
    ) -> ActionResult {
        let action_type = payload.action_type();
        let outcome = self.dispatch(participant_id, payload, ctx);
        match outcome {
            Ok((message, data)) => ActionResult::ok(action_id, action_type, message, data),
            Err(err) => ActionResult::failure(action_id, action_type, err.to_string(), err.error_code()),
        }
    }

    fn dispatch(
        &self,
        participant_id: &str,
        payload: &ActionPayload,
        ctx: &mut TickContext,
    ) -> CoreResult<(String, serde_json::Value)> {
        match payload {
            ActionPayload::BuyTokens {
                property_id,
                token_amount,
                max_price,
            } => self.buy_tokens(participant_id, property_id, *token_amount, *max_price),
            ActionPayload::SellTokens {
                property_id,
                token_amount,
                min_price,
            } => self.sell_tokens(participant_id, property_id, *token_amount, *min_price),
            ActionPayload::PayRent { property_id, weeks } => {
                self.pay_rent(participant_id, property_id, *weeks)
            }
            ActionPayload::CollectRent { property_id } => {
                self.collect_rent(participant_id, property_id, ctx)
            }
            ActionPayload::Vote {
                proposal_id,
                choice,
            } => self.vote(participant_id, proposal_id, *choice),
            ActionPayload::RequestService {
                property_id,
                service_type,
                description,
            } => self.request_service(participant_id, property_id, service_type, description, ctx),
            ActionPayload::CompleteService {
                request_id,
                amount,
                notes,
            } => self.complete_service(participant_id, request_id, *amount, notes, ctx),
        }
    }

    fn buy_tokens(
        &self,
        participant_id: &str,
        property_id: &str,
        token_amount: f64,
        max_price: f64,
    ) -> CoreResult<(String, serde_json::Value)> {
        if token_amount <= 0.0 {
            return Err(CoreError::InvalidParams("token_amount must be positive".into()));
        }

        let property = self.store.get_property(property_id)?;
        if property.tokens_available() < token_amount {
            return Err(CoreError::InsufficientTokens {
                requested: token_amount,
                available: property.tokens_available(),
            });
        }
        let price = property.token_price();
        if price > max_price {
            return Err(CoreError::PriceTooHigh { price, max_price });
        }

        let total_cost = (token_amount * price * 100.0).round() as i64; // price is per-token in major units

        // Check-then-debit happens inside the store's lock (not via a
        // separate `get_participant` read beforehand) so two concurrent
        // buys against the same participant can't both pass an
        // affordability check before either one debits (§4.5 re-entrancy).
        self.store.with_participant_mut(participant_id, Box::new(move |p| {
            p.debit(total_cost)?;
            p.record_investment(total_cost);
            Ok(())
        }))?;
        self.store.upsert_holding(participant_id, property_id, token_amount, price)?;
        self.store.with_property_mut(property_id, Box::new(move |p| {
            p.sell_tokens(token_amount, None);
        }))?;

        Ok((
            format!("bought {} tokens for {}", token_amount, total_cost),
            serde_json::json!({
                "property_id": property_id,
                "tokens": token_amount,
                "price_per_token": price,
                "total_cost": total_cost,
            }),
        ))
    }

    fn sell_tokens(
        &self,
        participant_id: &str,
        property_id: &str,
        token_amount: f64,
        min_price: f64,
    ) -> CoreResult<(String, serde_json::Value)> {
        if token_amount <= 0.0 {
            return Err(CoreError::InvalidParams("token_amount must be positive".into()));
        }
        let holding = self
            .store
            .holding(participant_id, property_id)
            .ok_or(CoreError::InsufficientTokens {
                requested: token_amount,
                available: 0.0,
            })?;
        if holding.token_amount() < token_amount {
            return Err(CoreError::InsufficientTokens {
                requested: token_amount,
                available: holding.token_amount(),
            });
        }
        let property = self.store.get_property(property_id)?;
        let price = property.token_price();
        if price < min_price {
            return Err(CoreError::PriceTooLow { price, min_price });
        }

        let proceeds = (token_amount * price * 100.0).round() as i64;
        self.store.remove_holding(participant_id, property_id, token_amount)?;
        self.store.with_participant_mut(participant_id, Box::new(move |p| {
            p.credit(proceeds);
            Ok(())
        }))?;
        self.store.with_property_mut(property_id, Box::new(move |p| {
            p.return_tokens(token_amount);
        }))?;

        Ok((
            format!("sold {} tokens for {}", token_amount, proceeds),
            serde_json::json!({
                "property_id": property_id,
                "tokens": token_amount,
                "price_per_token": price,
                "proceeds": proceeds,
            }),
        ))
    }

    fn pay_rent(
        &self,
        participant_id: &str,
        property_id: &str,
        weeks: u32,
    ) -> CoreResult<(String, serde_json::Value)> {
        if weeks == 0 {
            return Err(CoreError::InvalidParams("weeks must be >= 1".into()));
        }
        let property = self.store.get_property(property_id)?;
        if property.tenant_id() != Some(participant_id) {
            return Err(CoreError::NotTenant(participant_id.to_string()));
        }
        let amount = property.weekly_rent() * weeks as i64;

        // Same atomic check-then-debit as `buy_tokens` — no separate
        // balance read before the lock.
        self.store.with_participant_mut(participant_id, Box::new(move |p| {
            p.debit(amount)?;
            Ok(())
        }))?;
        self.store.with_property_mut(property_id, Box::new(move |p| {
            p.record_rent(amount);
        }))?;

        Ok((
            format!("paid {} weeks rent ({})", weeks, amount),
            serde_json::json!({ "property_id": property_id, "amount": amount }),
        ))
    }

    /// `collect_rent`: monthly rent = weekly_rent * 4.33; dividend pool =
    /// 0.80 * monthly_rent (§4.5, Glossary "Dividend pool").
    fn collect_rent(
        &self,
        _participant_id: &str,
        property_id: &str,
        ctx: &mut TickContext,
    ) -> CoreResult<(String, serde_json::Value)> {
        let property = self.store.get_property(property_id)?;
        if !property.is_tenanted(ctx.month) {
            return Err(CoreError::NotTenanted);
        }
        let monthly_rent = (property.weekly_rent() as f64 * 4.33).round() as i64;
        let dividend_pool = (monthly_rent as f64 * 0.80).round() as i64;

        self.store.with_property_mut(property_id, Box::new(move |p| {
            p.record_rent(monthly_rent);
            p.record_dividend(dividend_pool);
        }))?;

        self.store.create_event(
            NetworkEvent::new(
                ctx.month,
                ctx.next_ordinal(),
                EventCategory::Dividend,
                EventSeverity::Info,
                "Dividend distributed",
                format!("Property {} distributed a dividend of {}", property_id, dividend_pool),
            )
            .with_property(property_id),
        )?;

        Ok((
            format!("collected rent {} dividend {}", monthly_rent, dividend_pool),
            serde_json::json!({
                "property_id": property_id,
                "monthly_rent": monthly_rent,
                "dividend_pool": dividend_pool,
            }),
        ))
    }

    fn vote(
        &self,
        participant_id: &str,
        proposal_id: &str,
        choice: VoteChoice,
    ) -> CoreResult<(String, serde_json::Value)> {
        let holdings = self.store.list_holdings(participant_id);
        let voting_power: f64 = holdings.iter().map(|(_, h)| h.token_amount()).sum();
        if voting_power <= 0.0 {
            return Err(CoreError::NoVotingPower(participant_id.to_string()));
        }

        Ok((
            format!("vote recorded for proposal {}", proposal_id),
            serde_json::json!({
                "proposal_id": proposal_id,
                "choice": format!("{:?}", choice),
                "voting_power": voting_power,
            }),
        ))
    }

    fn request_service(
        &self,
        participant_id: &str,
        property_id: &str,
        service_type: &str,
        description: &str,
        ctx: &mut TickContext,
    ) -> CoreResult<(String, serde_json::Value)> {
        self.store.get_property(property_id)?;
        self.store.create_event(
            NetworkEvent::new(
                ctx.month,
                ctx.next_ordinal(),
                EventCategory::Property,
                EventSeverity::Info,
                "Service requested",
                format!("{}: {}", service_type, description),
            )
            .with_property(property_id)
            .with_participant(participant_id),
        )?;
        Ok((
            "service request recorded".to_string(),
            serde_json::json!({ "property_id": property_id, "service_type": service_type }),
        ))
    }

    fn complete_service(
        &self,
        participant_id: &str,
        request_id: &str,
        amount: i64,
        notes: &str,
        ctx: &mut TickContext,
    ) -> CoreResult<(String, serde_json::Value)> {
        let participant = self.store.get_participant(participant_id)?;
        if participant.role() != ParticipantRole::Service {
            return Err(CoreError::NotServiceProvider(participant_id.to_string()));
        }
        if amount <= 0 {
            return Err(CoreError::InvalidParams("amount must be positive".into()));
        }
        self.store.with_participant_mut(participant_id, Box::new(move |p| {
            p.credit(amount);
            Ok(())
        }))?;
        self.store.create_event(
            NetworkEvent::new(
                ctx.month,
                ctx.next_ordinal(),
                EventCategory::Property,
                EventSeverity::Info,
                "Service completed",
                notes.to_string(),
            )
            .with_participant(participant_id),
        )?;
        Ok((
            format!("service request {} completed", request_id),
            serde_json::json!({ "request_id": request_id, "amount": amount }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Participant, PropertyState};
    use crate::store::InMemoryStore;

    fn setup() -> (Arc<InMemoryStore>, ActionProcessor) {
        let store = Arc::new(InMemoryStore::new());
        let processor = ActionProcessor::new(store.clone());
        (store, processor)
    }

    #[test]
    fn buy_with_insufficient_balance_leaves_state_unchanged() {
        let (store, processor) = setup();
        store
            .create_participant(Participant::new_human(
                "p1".into(),
                "Alice".into(),
                ParticipantRole::Investor,
                500_00,
                "user-1".into(),
            ))
            .unwrap();
        store
            .create_or_update_property_state(PropertyState::new("prop1".into(), 10_000.0, 1.0, 1_000_000_00))
            .unwrap();

        let mut ctx = TickContext::new(1);
        let result = processor.execute(
            "a1",
            "p1",
            &ActionPayload::BuyTokens {
                property_id: "prop1".into(),
                token_amount: 1000.0,
                max_price: 2.0,
            },
            &mut ctx,
        );

        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some("INSUFFICIENT_BALANCE"));
        assert_eq!(store.get_participant("p1").unwrap().balance(), 500_00);
        assert_eq!(store.get_property("prop1").unwrap().tokens_available(), 10_000.0);
    }

    #[test]
    fn valid_buy_then_sell_moves_balances_and_holdings() {
        let (store, processor) = setup();
        store
            .create_participant(Participant::new_human(
                "p1".into(),
                "Alice".into(),
                ParticipantRole::Investor,
                100_000_00,
                "user-1".into(),
            ))
            .unwrap();
        store
            .create_or_update_property_state(PropertyState::new("prop1".into(), 20_000.0, 1.0, 1_000_000_00))
            .unwrap();

        let mut ctx = TickContext::new(1);
        let buy = processor.execute(
            "a1",
            "p1",
            &ActionPayload::BuyTokens {
                property_id: "prop1".into(),
                token_amount: 10_000.0,
                max_price: 1.0,
            },
            &mut ctx,
        );
        assert!(buy.success, "{:?}", buy);
        assert_eq!(store.get_participant("p1").unwrap().balance(), 90_000_00);
        assert_eq!(store.holding("p1", "prop1").unwrap().token_amount(), 10_000.0);
        assert_eq!(store.get_property("prop1").unwrap().tokens_available(), 10_000.0);

        let sell = processor.execute(
            "a2",
            "p1",
            &ActionPayload::SellTokens {
                property_id: "prop1".into(),
                token_amount: 5_000.0,
                min_price: 0.90,
            },
            &mut ctx,
        );
        assert!(sell.success, "{:?}", sell);
        assert_eq!(store.get_participant("p1").unwrap().balance(), 95_000_00);
        assert_eq!(store.holding("p1", "prop1").unwrap().token_amount(), 5_000.0);
        assert_eq!(store.get_property("prop1").unwrap().tokens_available(), 15_000.0);
    }

    #[test]
    fn collect_rent_dividend_math() {
        let (store, processor) = setup();
        store
            .create_participant(Participant::new_human(
                "tenant".into(),
                "Bob".into(),
                ParticipantRole::Renter,
                10_000_00,
                "user-2".into(),
            ))
            .unwrap();
        let mut property = PropertyState::new("prop1".into(), 1_000.0, 1.0, 500_000_00);
        property.set_tenant("tenant".into(), 650_00, 0, 12);
        store.create_or_update_property_state(property).unwrap();

        let mut ctx = TickContext::new(5);
        let result = processor.execute(
            "a1",
            "tenant",
            &ActionPayload::CollectRent {
                property_id: "prop1".into(),
            },
            &mut ctx,
        );
        assert!(result.success, "{:?}", result);
        let data = result.data.unwrap();
        assert_eq!(data["monthly_rent"], 281_450);
        assert_eq!(store.get_property("prop1").unwrap().cumulative_rent(), 281_450);
        assert_eq!(store.get_property("prop1").unwrap().cumulative_dividends(), 225_160);
    }
}
