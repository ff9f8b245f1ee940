//! Universal invariant property tests (§8: P1, P2), driven by `proptest`
//! over arbitrary seeded sequences of buy/sell intents queued for a single
//! tick.

use std::sync::Arc;

use osf_sim_core::{ActionPayload, InMemoryStore, PendingAction, StateStore, SubscriptionBus, TickPipeline};
use osf_sim_core::models::{Participant, ParticipantRole, PropertyState};
use proptest::prelude::*;

const STARTING_BALANCE: i64 = 5_000_000_00;
const TOTAL_TOKENS: f64 = 100_000.0;

fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    for id in ["p1", "p2", "p3"] {
        store
            .create_participant(Participant::new_human(
                id.to_string(),
                id.to_string(),
                ParticipantRole::Investor,
                STARTING_BALANCE,
                format!("{id}-ext"),
            ))
            .unwrap();
    }
    store
        .create_or_update_property_state(PropertyState::new(
            "prop1".into(),
            TOTAL_TOKENS,
            1.0,
            100_000_00,
        ))
        .unwrap();
    store
}

#[derive(Debug, Clone)]
enum Intent {
    Buy { participant: usize, amount: f64 },
    Sell { participant: usize, amount: f64 },
}

fn intent_strategy() -> impl Strategy<Value = Intent> {
    prop_oneof![
        (0usize..3, 1.0f64..2_000.0).prop_map(|(p, amount)| Intent::Buy { participant: p, amount: amount.floor() }),
        (0usize..3, 1.0f64..2_000.0).prop_map(|(p, amount)| Intent::Sell { participant: p, amount: amount.floor() }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    /// P1: after a tick, every participant's balance is non-negative,
    /// regardless of how many (possibly-rejected) buy/sell intents were
    /// queued against them.
    #[test]
    fn balances_never_go_negative(seed in any::<u64>(), intents in prop::collection::vec(intent_strategy(), 0..12)) {
        let store = seeded_store();
        queue_intents(&store, &intents);

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let bus = Arc::new(SubscriptionBus::default());
            let pipeline = TickPipeline::new(store.clone(), bus, seed);
            pipeline.run_tick().await.unwrap();
        });

        for id in ["p1", "p2", "p3"] {
            let balance = store.get_participant(id).unwrap().balance();
            prop_assert!(balance >= 0, "participant {id} went negative: {balance}");
        }
    }

    /// P2: the sum of every holding's token amount for a property always
    /// equals `total_tokens - tokens_available`.
    #[test]
    fn token_supply_is_conserved(seed in any::<u64>(), intents in prop::collection::vec(intent_strategy(), 0..12)) {
        let store = seeded_store();
        queue_intents(&store, &intents);

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let bus = Arc::new(SubscriptionBus::default());
            let pipeline = TickPipeline::new(store.clone(), bus, seed);
            pipeline.run_tick().await.unwrap();
        });

        let property = store.get_property("prop1").unwrap();
        let held: f64 = ["p1", "p2", "p3"]
            .iter()
            .filter_map(|id| store.holding(id, "prop1"))
            .map(|h| h.token_amount())
            .sum();
        let expected = property.total_tokens() - property.tokens_available();
        prop_assert!((held - expected).abs() < 1e-6, "held={held} expected={expected}");
    }
}

fn queue_intents(store: &InMemoryStore, intents: &[Intent]) {
    for (index, intent) in intents.iter().enumerate() {
        let action_id = format!("action-{index}");
        let (participant, payload) = match intent {
            Intent::Buy { participant, amount } => (
                participant,
                ActionPayload::BuyTokens {
                    property_id: "prop1".into(),
                    token_amount: *amount,
                    max_price: 10.0,
                },
            ),
            Intent::Sell { participant, amount } => (
                participant,
                ActionPayload::SellTokens {
                    property_id: "prop1".into(),
                    token_amount: *amount,
                    min_price: 0.0,
                },
            ),
        };
        let participant_id = ["p1", "p2", "p3"][*participant % 3];
        let _ = store.queue_action(PendingAction::new(
            action_id,
            participant_id.to_string(),
            payload,
            5,
            1,
            index as u64,
        ));
    }
}
