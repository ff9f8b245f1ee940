//! In-memory `StateStore` implementation.
//!
//! `BTreeMap` is used throughout (not `HashMap`) specifically so that
//! iteration order is deterministic, exactly the reason the teacher's
//! `models::state::SimulationState` keeps `agents`/`transactions` as
//! `BTreeMap<String, _>` rather than a hash map — this crate's snapshot
//! checksums (P4) depend on it the same way.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{BalanceOp, EventFilter, ParticipantFilter, StateStore, StoreCheckpoint};
use crate::error::CoreError;
use crate::error::CoreResult;
use crate::models::{
    ActionResult, Holding, NetworkEvent, NetworkSnapshot, Participant, PendingAction, PropertyState,
};

#[derive(Default, Clone)]
struct StoreData {
    participants: BTreeMap<String, Participant>,
    holdings: BTreeMap<(String, String), Holding>,
    properties: BTreeMap<String, PropertyState>,
    pending_actions: BTreeMap<String, PendingAction>,
    snapshots: BTreeMap<u64, NetworkSnapshot>,
    events: Vec<NetworkEvent>,
    current_month: u64,
}

pub struct InMemoryStore {
    data: Mutex<StoreData>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(StoreData::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreData> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StateStore for InMemoryStore {
    fn create_participant(&self, participant: Participant) -> CoreResult<()> {
        let mut data = self.lock();
        data.participants.insert(participant.id().to_string(), participant);
        Ok(())
    }

    fn get_participant(&self, id: &str) -> CoreResult<Participant> {
        self.lock()
            .participants
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::ParticipantNotFound(id.to_string()))
    }

    fn get_participant_by_external_user(&self, external_user_id: &str) -> Option<Participant> {
        self.lock()
            .participants
            .values()
            .find(|p| p.external_user_id() == Some(external_user_id))
            .cloned()
    }

    fn list_participants(&self, filter: ParticipantFilter) -> Vec<Participant> {
        self.lock()
            .participants
            .values()
            .filter(|p| filter.kind.map(|k| p.kind() == k).unwrap_or(true))
            .filter(|p| filter.role.map(|r| p.role() == r).unwrap_or(true))
            .cloned()
            .collect()
    }

    fn adjust_balance(&self, id: &str, delta: i64, op: BalanceOp) -> CoreResult<i64> {
        let mut data = self.lock();
        let participant = data
            .participants
            .get_mut(id)
            .ok_or_else(|| CoreError::ParticipantNotFound(id.to_string()))?;

        match op {
            BalanceOp::Add => participant.credit(delta),
            BalanceOp::Sub => participant.debit(delta)?,
            BalanceOp::Set => {
                // `Participant` exposes only debit/credit at the spec boundary;
                // `set` is realized as the equivalent net delta.
                let current = participant.balance();
                if delta >= current {
                    participant.credit(delta - current);
                } else {
                    participant.debit(current - delta)?;
                }
            }
        }
        Ok(participant.balance())
    }

    fn with_participant_mut(&self, id: &str, f: Box<dyn FnOnce(&mut Participant) -> CoreResult<()> + Send>) -> CoreResult<()> {
        let mut data = self.lock();
        let participant = data
            .participants
            .get_mut(id)
            .ok_or_else(|| CoreError::ParticipantNotFound(id.to_string()))?;
        f(participant)
    }

    fn upsert_holding(&self, participant_id: &str, property_id: &str, delta_tokens: f64, price: f64) -> CoreResult<()> {
        let mut data = self.lock();
        let key = (participant_id.to_string(), property_id.to_string());
        match data.holdings.get_mut(&key) {
            Some(holding) => holding.accumulate(delta_tokens, price),
            None => {
                data.holdings.insert(key, Holding::new(delta_tokens, price));
            }
        }
        Ok(())
    }

    fn remove_holding(&self, participant_id: &str, property_id: &str, delta_tokens: f64) -> CoreResult<()> {
        let mut data = self.lock();
        let key = (participant_id.to_string(), property_id.to_string());
        let empty = match data.holdings.get_mut(&key) {
            Some(holding) => holding.reduce(delta_tokens),
            None => {
                return Err(CoreError::InsufficientTokens {
                    requested: delta_tokens,
                    available: 0.0,
                })
            }
        };
        if empty {
            data.holdings.remove(&key);
        }
        Ok(())
    }

    fn list_holdings(&self, participant_id: &str) -> Vec<(String, Holding)> {
        self.lock()
            .holdings
            .iter()
            .filter(|((pid, _), _)| pid == participant_id)
            .map(|((_, prop_id), holding)| (prop_id.clone(), *holding))
            .collect()
    }

    fn holding(&self, participant_id: &str, property_id: &str) -> Option<Holding> {
        self.lock()
            .holdings
            .get(&(participant_id.to_string(), property_id.to_string()))
            .copied()
    }

    fn create_or_update_property_state(&self, property: PropertyState) -> CoreResult<()> {
        let mut data = self.lock();
        data.properties.insert(property.id().to_string(), property);
        Ok(())
    }

    fn get_property(&self, id: &str) -> CoreResult<PropertyState> {
        self.lock()
            .properties
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::PropertyNotFound(id.to_string()))
    }

    fn list_properties(&self) -> Vec<PropertyState> {
        self.lock().properties.values().cloned().collect()
    }

    fn with_property_mut(&self, id: &str, f: Box<dyn FnOnce(&mut PropertyState) + Send>) -> CoreResult<()> {
        let mut data = self.lock();
        let property = data
            .properties
            .get_mut(id)
            .ok_or_else(|| CoreError::PropertyNotFound(id.to_string()))?;
        f(property);
        Ok(())
    }

    fn queue_action(&self, action: PendingAction) -> CoreResult<()> {
        let mut data = self.lock();
        data.pending_actions.insert(action.id().to_string(), action);
        Ok(())
    }

    fn list_pending_actions(&self, month: u64) -> Vec<PendingAction> {
        let mut actions: Vec<PendingAction> = self
            .lock()
            .pending_actions
            .values()
            .filter(|a| a.queued_for_month() == month && !a.is_terminal())
            .cloned()
            .collect();
        actions.sort_by_key(|a| a.ordering_key());
        actions
    }

    fn get_action(&self, id: &str) -> CoreResult<PendingAction> {
        self.lock()
            .pending_actions
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::ActionNotFound(id.to_string()))
    }

    fn complete_action(&self, id: &str, result: ActionResult, processed_at: u64) -> CoreResult<()> {
        let mut data = self.lock();
        let action = data
            .pending_actions
            .get_mut(id)
            .ok_or_else(|| CoreError::ActionNotFound(id.to_string()))?;
        if action.is_terminal() {
            return Err(CoreError::AlreadyProcessed(id.to_string()));
        }
        action.complete(result, processed_at);
        Ok(())
    }

    fn remove_action(&self, id: &str) -> bool {
        self.lock().pending_actions.remove(id).is_some()
    }

    fn clear_actions(&self) -> usize {
        let mut data = self.lock();
        let count = data.pending_actions.len();
        data.pending_actions.clear();
        count
    }

    fn create_snapshot(&self, snapshot: NetworkSnapshot) -> CoreResult<()> {
        let mut data = self.lock();
        if data.snapshots.contains_key(&snapshot.network_month) {
            return Err(CoreError::SnapshotAlreadyExists(snapshot.network_month));
        }
        data.snapshots.insert(snapshot.network_month, snapshot);
        Ok(())
    }

    fn get_snapshot(&self, month: u64) -> Option<NetworkSnapshot> {
        self.lock().snapshots.get(&month).cloned()
    }

    fn get_latest_snapshot(&self) -> Option<NetworkSnapshot> {
        self.lock().snapshots.values().next_back().cloned()
    }

    fn list_snapshots(&self, from_month: u64, limit: usize) -> Vec<NetworkSnapshot> {
        self.lock()
            .snapshots
            .range(from_month..)
            .take(limit)
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn create_event(&self, event: NetworkEvent) -> CoreResult<()> {
        let mut data = self.lock();
        data.events.push(event);
        Ok(())
    }

    fn list_events(&self, filter: EventFilter, limit: usize) -> Vec<NetworkEvent> {
        self.lock()
            .events
            .iter()
            .filter(|e| filter.month.map(|m| e.month == m).unwrap_or(true))
            .filter(|e| filter.category.map(|c| e.category == c).unwrap_or(true))
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    fn current_month(&self) -> u64 {
        self.lock().current_month
    }

    fn set_current_month(&self, month: u64) {
        self.lock().current_month = month;
    }

    fn checkpoint(&self) -> StoreCheckpoint {
        StoreCheckpoint(Box::new(self.lock().clone()))
    }

    fn restore(&self, checkpoint: StoreCheckpoint) {
        if let Ok(data) = checkpoint.0.downcast::<StoreData>() {
            *self.lock() = *data;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParticipantRole};

    #[test]
    fn snapshot_is_exactly_once() {
        let store = InMemoryStore::new();
        let snap = NetworkSnapshot::new(1, Default::default(), "hello", 5);
        store.create_snapshot(snap.clone()).unwrap();
        let err = store.create_snapshot(snap).unwrap_err();
        assert_eq!(err.error_code(), "CONFLICT");
    }

    #[test]
    fn adjust_balance_sub_rejects_negative() {
        let store = InMemoryStore::new();
        store
            .create_participant(Participant::new_human(
                "p1".into(),
                "Alice".into(),
                ParticipantRole::Investor,
                100,
                "user-1".into(),
            ))
            .unwrap();
        let err = store.adjust_balance("p1", 1000, BalanceOp::Sub).unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_BALANCE");
    }

    #[test]
    fn holdings_are_removed_when_emptied() {
        let store = InMemoryStore::new();
        store.upsert_holding("p1", "prop1", 100.0, 1.0).unwrap();
        store.remove_holding("p1", "prop1", 100.0).unwrap();
        assert!(store.holding("p1", "prop1").is_none());
    }

    #[test]
    fn restore_undoes_every_write_made_after_checkpoint() {
        let store = InMemoryStore::new();
        store
            .create_participant(Participant::new_human(
                "p1".into(),
                "Alice".into(),
                ParticipantRole::Investor,
                1_000_00,
                "user-1".into(),
            ))
            .unwrap();
        let checkpoint = store.checkpoint();

        store.adjust_balance("p1", 500_00, BalanceOp::Sub).unwrap();
        store.upsert_holding("p1", "prop1", 10.0, 1.0).unwrap();
        store
            .queue_action(PendingAction::new(
                "a1".into(),
                "p1".into(),
                crate::models::ActionPayload::CollectRent {
                    property_id: "prop1".into(),
                },
                5,
                1,
                0,
            ))
            .unwrap();
        store
            .complete_action(
                "a1",
                ActionResult::ok("a1", "collect_rent", "done", serde_json::json!({})),
                1,
            )
            .unwrap();

        store.restore(checkpoint);

        assert_eq!(store.get_participant("p1").unwrap().balance(), 1_000_00);
        assert!(store.holding("p1", "prop1").is_none());
        assert!(store.get_action("a1").is_err(), "action queued after the checkpoint should not survive restore");
    }

    #[test]
    fn pending_actions_listed_in_priority_order() {
        let store = InMemoryStore::new();
        let low = PendingAction::new(
            "low".into(),
            "p1".into(),
            crate::models::ActionPayload::CollectRent {
                property_id: "x".into(),
            },
            1,
            5,
            0,
        );
        let high = PendingAction::new(
            "high".into(),
            "p1".into(),
            crate::models::ActionPayload::CollectRent {
                property_id: "x".into(),
            },
            9,
            5,
            1,
        );
        store.queue_action(low).unwrap();
        store.queue_action(high).unwrap();
        let ordered = store.list_pending_actions(5);
        assert_eq!(ordered[0].id(), "high");
        assert_eq!(ordered[1].id(), "low");
    }
}
