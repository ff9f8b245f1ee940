//! Full-pipeline integration tests (§8): month monotonicity, idempotent
//! action completion, priority ordering through a real tick, and tick
//! atomicity when the store faults during the commit step.

use std::sync::Arc;

use osf_sim_core::store::{BalanceOp, EventFilter, ParticipantFilter};
use osf_sim_core::{
    ActionPayload, CoreError, CoreResult, InMemoryStore, PendingAction, StateStore,
    SubscriptionBus, TickPipeline,
};
use osf_sim_core::models::{
    ActionResult, Holding, NetworkEvent, NetworkSnapshot, Participant, ParticipantRole,
    PropertyState,
};

fn new_investor(store: &InMemoryStore, id: &str, balance: i64) {
    store
        .create_participant(Participant::new_human(
            id.to_string(),
            id.to_string(),
            ParticipantRole::Investor,
            balance,
            format!("{id}-ext"),
        ))
        .unwrap();
}

#[tokio::test]
async fn network_month_is_dense_and_monotonic_across_several_ticks() {
    let store = Arc::new(InMemoryStore::new());
    let bus = Arc::new(SubscriptionBus::default());
    let pipeline = TickPipeline::new(store.clone(), bus, 11);

    for expected_month in 1..=5u64 {
        let outcome = pipeline.run_tick().await.unwrap();
        assert_eq!(outcome.month, expected_month);
        assert!(store.get_snapshot(expected_month).is_some());
    }

    let snapshots = store.list_snapshots(1, 10);
    let months: Vec<u64> = snapshots.iter().map(|s| s.network_month).collect();
    assert_eq!(months, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn completing_the_same_pending_action_twice_returns_already_processed() {
    let store = InMemoryStore::new();
    new_investor(&store, "p1", 10_000_00);
    store
        .queue_action(PendingAction::new(
            "a1".into(),
            "p1".into(),
            ActionPayload::CollectRent {
                property_id: "prop1".into(),
            },
            5,
            1,
            0,
        ))
        .unwrap();

    let result = ActionResult::ok("a1", "collect_rent", "done", serde_json::json!({}));
    store.complete_action("a1", result.clone(), 1).unwrap();

    let second = store.complete_action("a1", result, 1);
    assert!(matches!(second, Err(CoreError::AlreadyProcessed(id)) if id == "a1"));
}

#[tokio::test]
async fn priority_ordering_fills_the_higher_priority_action_first() {
    let store = Arc::new(InMemoryStore::new());
    let bus = Arc::new(SubscriptionBus::default());
    new_investor(&store, "buyer-a", 1_000_000_00);
    new_investor(&store, "buyer-b", 1_000_000_00);
    store
        .create_or_update_property_state(PropertyState::new("prop1".into(), 8_000.0, 1.0, 8_000_00))
        .unwrap();

    // Both at priority 10; A queued first (queued_at=0), B second (queued_at=1) —
    // `ordering_key` breaks priority ties by earliest `queued_at` (§4.5).
    store
        .queue_action(PendingAction::new(
            "action-a".into(),
            "buyer-a".into(),
            ActionPayload::BuyTokens {
                property_id: "prop1".into(),
                token_amount: 6_000.0,
                max_price: 1.5,
            },
            10,
            1,
            0,
        ))
        .unwrap();
    store
        .queue_action(PendingAction::new(
            "action-b".into(),
            "buyer-b".into(),
            ActionPayload::BuyTokens {
                property_id: "prop1".into(),
                token_amount: 5_000.0,
                max_price: 1.5,
            },
            10,
            1,
            1,
        ))
        .unwrap();

    let pipeline = TickPipeline::new(store.clone(), bus, 3);
    pipeline.run_tick().await.unwrap();

    let action_a = store.get_action("action-a").unwrap();
    let action_b = store.get_action("action-b").unwrap();
    assert!(action_a.result().unwrap().success);
    assert!(!action_b.result().unwrap().success);
    assert_eq!(action_b.result().unwrap().error_code.as_deref(), Some("INSUFFICIENT_TOKENS"));
}

/// Delegates every `StateStore` method to an inner `InMemoryStore` except
/// `create_snapshot`, which always fails — used to induce a store fault at
/// the tick's commit step (scenario 4, P7).
struct FaultingStore {
    inner: InMemoryStore,
}

impl StateStore for FaultingStore {
    fn create_participant(&self, participant: Participant) -> CoreResult<()> {
        self.inner.create_participant(participant)
    }
    fn get_participant(&self, id: &str) -> CoreResult<Participant> {
        self.inner.get_participant(id)
    }
    fn get_participant_by_external_user(&self, external_user_id: &str) -> Option<Participant> {
        self.inner.get_participant_by_external_user(external_user_id)
    }
    fn list_participants(&self, filter: ParticipantFilter) -> Vec<Participant> {
        self.inner.list_participants(filter)
    }
    fn adjust_balance(&self, id: &str, delta: i64, op: BalanceOp) -> CoreResult<i64> {
        self.inner.adjust_balance(id, delta, op)
    }
    fn with_participant_mut(&self, id: &str, f: Box<dyn FnOnce(&mut Participant) -> CoreResult<()> + Send>) -> CoreResult<()> {
        self.inner.with_participant_mut(id, f)
    }
    fn upsert_holding(&self, participant_id: &str, property_id: &str, delta_tokens: f64, price: f64) -> CoreResult<()> {
        self.inner.upsert_holding(participant_id, property_id, delta_tokens, price)
    }
    fn remove_holding(&self, participant_id: &str, property_id: &str, delta_tokens: f64) -> CoreResult<()> {
        self.inner.remove_holding(participant_id, property_id, delta_tokens)
    }
    fn list_holdings(&self, participant_id: &str) -> Vec<(String, Holding)> {
        self.inner.list_holdings(participant_id)
    }
    fn holding(&self, participant_id: &str, property_id: &str) -> Option<Holding> {
        self.inner.holding(participant_id, property_id)
    }
    fn create_or_update_property_state(&self, property: PropertyState) -> CoreResult<()> {
        self.inner.create_or_update_property_state(property)
    }
    fn get_property(&self, id: &str) -> CoreResult<PropertyState> {
        self.inner.get_property(id)
    }
    fn list_properties(&self) -> Vec<PropertyState> {
        self.inner.list_properties()
    }
    fn with_property_mut(&self, id: &str, f: Box<dyn FnOnce(&mut PropertyState) + Send>) -> CoreResult<()> {
        self.inner.with_property_mut(id, f)
    }
    fn queue_action(&self, action: PendingAction) -> CoreResult<()> {
        self.inner.queue_action(action)
    }
    fn list_pending_actions(&self, month: u64) -> Vec<PendingAction> {
        self.inner.list_pending_actions(month)
    }
    fn get_action(&self, id: &str) -> CoreResult<PendingAction> {
        self.inner.get_action(id)
    }
    fn complete_action(&self, id: &str, result: ActionResult, processed_at: u64) -> CoreResult<()> {
        self.inner.complete_action(id, result, processed_at)
    }
    fn remove_action(&self, id: &str) -> bool {
        self.inner.remove_action(id)
    }
    fn clear_actions(&self) -> usize {
        self.inner.clear_actions()
    }
    fn create_snapshot(&self, _snapshot: NetworkSnapshot) -> CoreResult<()> {
        Err(CoreError::StoreTransient("induced fault: snapshot write failed".into()))
    }
    fn get_snapshot(&self, month: u64) -> Option<NetworkSnapshot> {
        self.inner.get_snapshot(month)
    }
    fn get_latest_snapshot(&self) -> Option<NetworkSnapshot> {
        self.inner.get_latest_snapshot()
    }
    fn list_snapshots(&self, from_month: u64, limit: usize) -> Vec<NetworkSnapshot> {
        self.inner.list_snapshots(from_month, limit)
    }
    fn create_event(&self, event: NetworkEvent) -> CoreResult<()> {
        self.inner.create_event(event)
    }
    fn list_events(&self, filter: EventFilter, limit: usize) -> Vec<NetworkEvent> {
        self.inner.list_events(filter, limit)
    }
    fn current_month(&self) -> u64 {
        self.inner.current_month()
    }
    fn set_current_month(&self, month: u64) {
        self.inner.set_current_month(month)
    }
    fn checkpoint(&self) -> osf_sim_core::store::StoreCheckpoint {
        self.inner.checkpoint()
    }
    fn restore(&self, checkpoint: osf_sim_core::store::StoreCheckpoint) {
        self.inner.restore(checkpoint)
    }
}

/// Scenario 4 / P7: a fault at snapshot-commit time must leave `current_month`
/// unchanged, persist no snapshot row, and requeue every action the tick
/// drained back to `pending` — including one that would otherwise have
/// *succeeded*, not merely one that was already doomed to fail on its own.
#[tokio::test]
async fn a_store_fault_at_snapshot_commit_rolls_back_a_genuinely_successful_action() {
    let faulting = Arc::new(FaultingStore {
        inner: InMemoryStore::new(),
    });
    let store: Arc<dyn StateStore> = faulting.clone();
    new_investor(&faulting.inner, "p1", 1_000_00);
    faulting
        .inner
        .create_or_update_property_state(PropertyState::new("prop1".into(), 10_000.0, 1.0, 1_000_000_00))
        .unwrap();
    store
        .queue_action(PendingAction::new(
            "a1".into(),
            "p1".into(),
            ActionPayload::BuyTokens {
                property_id: "prop1".into(),
                token_amount: 100.0,
                max_price: 2.0,
            },
            5,
            1,
            0,
        ))
        .unwrap();

    let bus = Arc::new(SubscriptionBus::default());
    let pipeline = TickPipeline::new(store.clone(), bus, 5);

    let result = pipeline.run_tick().await;
    assert!(result.is_err());

    // The month/snapshot pair never commits.
    assert_eq!(store.current_month(), 0);
    assert!(store.get_snapshot(1).is_none());

    // The buy would have succeeded — and did execute during the tick — but
    // every trace of it is gone after the fault: the action is pending
    // again, the balance/holding/tokens_available writes are undone.
    let action = store.get_action("a1").unwrap();
    assert_eq!(action.status(), osf_sim_core::ActionStatus::Pending);
    assert_eq!(store.get_participant("p1").unwrap().balance(), 1_000_00);
    assert!(store.holding("p1", "prop1").is_none());
    assert_eq!(store.get_property("prop1").unwrap().tokens_available(), 10_000.0);
}
