//! C1 — State Store.
//!
//! The sole owner and mutator of persisted entities (§3, Ownership
//! semantics). Every other component receives immutable read snapshots or
//! scoped transactional handles.
//!
//! Per-method atomicity is realized the way the teacher's
//! `settlement::rtgs::try_settle` realizes it: every mutating method
//! validates all of its preconditions before performing any mutation, so a
//! single call either applies in full or leaves the store untouched. The
//! Tick Pipeline additionally needs *tick-wide* atomicity (§4.7, P7) across
//! many such calls — events, property appreciation, and action completions
//! all land before the snapshot commits — so the store also exposes a
//! coarse `checkpoint`/`restore` pair the pipeline brackets a whole tick
//! with, rather than a generic per-call transaction log.

mod memory;

use crate::error::CoreResult;
use crate::models::{
    ActionResult, EventCategory, Holding, NetworkEvent, NetworkSnapshot, Participant,
    ParticipantKind, ParticipantRole, PendingAction, PropertyState,
};
use serde::Serialize;

pub use memory::InMemoryStore;

/// Opaque capture of the store's entire mutable state, produced by
/// `checkpoint()` and consumed by `restore()`. Callers never inspect it —
/// it exists only so the Tick Pipeline can revert every write made during a
/// failed tick (§4.7 step 2-8 failure policy, P7), including already-drained
/// pending actions, which go back to `pending` simply because `restore`
/// puts the whole map back the way it was.
pub struct StoreCheckpoint(Box<dyn std::any::Any + Send>);

#[derive(Debug, Clone, Copy, Default)]
pub struct ParticipantFilter {
    pub kind: Option<ParticipantKind>,
    pub role: Option<ParticipantRole>,
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub month: Option<u64>,
    pub category: Option<EventCategory>,
}

#[derive(Debug, Clone, Copy)]
pub enum BalanceOp {
    Add,
    Sub,
    Set,
}

/// The full operation surface named in spec §4.1. A single in-memory
/// implementation (`InMemoryStore`) backs this trait; the trait boundary
/// exists so the Tick Pipeline and Action Processor depend on behavior,
/// not storage, the way the teacher's settlement functions depend on
/// `&mut Agent`/`&mut SimulationState` rather than a concrete database
/// handle.
pub trait StateStore: Send + Sync {
    fn create_participant(&self, participant: Participant) -> CoreResult<()>;
    fn get_participant(&self, id: &str) -> CoreResult<Participant>;
    fn get_participant_by_external_user(&self, external_user_id: &str) -> Option<Participant>;
    fn list_participants(&self, filter: ParticipantFilter) -> Vec<Participant>;
    fn adjust_balance(&self, id: &str, delta: i64, op: BalanceOp) -> CoreResult<i64>;
    /// Run `f` against the live, locked participant row and propagate
    /// whatever it returns. Callers that need "check a precondition, then
    /// mutate" (e.g. debit-if-affordable) must do both inside `f` — the
    /// check and the mutation then share the same lock acquisition, so two
    /// concurrent callers can never both pass the check before either
    /// mutates (§4.5 re-entrancy guarantee).
    fn with_participant_mut(&self, id: &str, f: Box<dyn FnOnce(&mut Participant) -> CoreResult<()> + Send>) -> CoreResult<()>;

    fn upsert_holding(&self, participant_id: &str, property_id: &str, delta_tokens: f64, price: f64) -> CoreResult<()>;
    fn remove_holding(&self, participant_id: &str, property_id: &str, delta_tokens: f64) -> CoreResult<()>;
    fn list_holdings(&self, participant_id: &str) -> Vec<(String, Holding)>;
    fn holding(&self, participant_id: &str, property_id: &str) -> Option<Holding>;

    fn create_or_update_property_state(&self, property: PropertyState) -> CoreResult<()>;
    fn get_property(&self, id: &str) -> CoreResult<PropertyState>;
    fn list_properties(&self) -> Vec<PropertyState>;
    fn with_property_mut(&self, id: &str, f: Box<dyn FnOnce(&mut PropertyState) + Send>) -> CoreResult<()>;

    fn queue_action(&self, action: PendingAction) -> CoreResult<()>;
    fn list_pending_actions(&self, month: u64) -> Vec<PendingAction>;
    fn get_action(&self, id: &str) -> CoreResult<PendingAction>;
    fn complete_action(&self, id: &str, result: ActionResult, processed_at: u64) -> CoreResult<()>;
    fn remove_action(&self, id: &str) -> bool;
    fn clear_actions(&self) -> usize;

    fn create_snapshot(&self, snapshot: NetworkSnapshot) -> CoreResult<()>;
    fn get_snapshot(&self, month: u64) -> Option<NetworkSnapshot>;
    fn get_latest_snapshot(&self) -> Option<NetworkSnapshot>;
    fn list_snapshots(&self, from_month: u64, limit: usize) -> Vec<NetworkSnapshot>;

    fn create_event(&self, event: NetworkEvent) -> CoreResult<()>;
    fn list_events(&self, filter: EventFilter, limit: usize) -> Vec<NetworkEvent>;

    fn current_month(&self) -> u64;
    fn set_current_month(&self, month: u64);

    /// Capture the entire store for later `restore` (§4.7, P7).
    fn checkpoint(&self) -> StoreCheckpoint;
    /// Replace the store's current state with a previously captured
    /// checkpoint, discarding every write made since.
    fn restore(&self, checkpoint: StoreCheckpoint);
}

/// Canonicalize an arbitrary `Serialize` value (recursively sorting every
/// JSON object's keys into a `BTreeMap`) and SHA256-hash the resulting
/// bytes, exactly as the teacher's
/// `orchestrator::checkpoint::compute_config_hash` does, so hashing is
/// independent of any `HashMap` iteration order.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    use sha2::{Digest, Sha256};

    let value = serde_json::to_value(value)?;
    let canonical = canonicalize(&value);
    let bytes = serde_json::to_vec(&canonical)?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: std::collections::BTreeMap<String, serde_json::Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect();
            serde_json::to_value(sorted).expect("BTreeMap<String, Value> always serializes")
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_hash_is_order_independent() {
        let a = serde_json::json!({"b": 1, "a": 2});
        let b = serde_json::json!({"a": 2, "b": 1});
        assert_eq!(canonical_hash(&a).unwrap(), canonical_hash(&b).unwrap());
    }
}
