//! Fixed NPC catalogue (§4.4: "Owns a fixed catalogue of NPC profiles").
//!
//! Grounded in `original_source/backend/src/services/npc_system.py`'s
//! hardcoded roster of named agents, generalized to this crate's
//! `Personality`/`Goal` shape.

use crate::models::{Goal, GoalType, ParticipantRole, Personality};

/// One entry of the fixed NPC roster. `id` doubles as the participant's
/// store key once seeded, so it must be stable across runs.
pub struct NpcProfile {
    pub id: &'static str,
    pub display_name: &'static str,
    pub role: ParticipantRole,
    pub starting_balance: i64,
    pub personality: fn() -> Personality,
    pub goals: fn() -> Vec<Goal>,
}

pub fn catalogue() -> &'static [NpcProfile] {
    &CATALOGUE
}

static CATALOGUE: [NpcProfile; 6] = [
    NpcProfile {
        id: "npc-steady-sam",
        display_name: "Steady Sam",
        role: ParticipantRole::Investor,
        starting_balance: 250_000_00,
        personality: || Personality::new(0.3, 0.4, 0.8, 0.1, 0.7),
        goals: || {
            vec![Goal::new(GoalType::Income, 5_000_00.0, 6).with_deadline(24)]
        },
    },
    NpcProfile {
        id: "npc-flip-fiona",
        display_name: "Flip Fiona",
        role: ParticipantRole::Investor,
        starting_balance: 180_000_00,
        personality: || Personality::new(0.8, 0.7, 0.2, 0.6, 0.2),
        goals: || {
            vec![
                Goal::new(GoalType::Accumulate, 50_000_00.0, 8).with_deadline(12),
                Goal::new(GoalType::Divest, 20_000_00.0, 4),
            ]
        },
    },
    NpcProfile {
        id: "npc-rent-rita",
        display_name: "Rent Rita",
        role: ParticipantRole::Renter,
        starting_balance: 40_000_00,
        personality: || Personality::new(0.2, 0.2, 0.9, 0.1, 0.8),
        goals: || vec![Goal::new(GoalType::Stabilize, 1.0, 3)],
    },
    NpcProfile {
        id: "npc-max-marketmaker",
        display_name: "Max the Market Maker",
        role: ParticipantRole::MarketMaker,
        starting_balance: 500_000_00,
        personality: || Personality::new(0.5, 0.9, 0.5, 0.0, 0.5),
        goals: || vec![Goal::new(GoalType::Stabilize, 1.0, 10)],
    },
    NpcProfile {
        id: "npc-dana-developer",
        display_name: "Dana the Developer",
        role: ParticipantRole::Developer,
        starting_balance: 120_000_00,
        personality: || Personality::new(0.6, 0.5, 0.4, 0.3, 0.4),
        goals: || vec![Goal::new(GoalType::Accumulate, 30_000_00.0, 5)],
    },
    NpcProfile {
        id: "npc-faithful-foundation",
        display_name: "The Foundation",
        role: ParticipantRole::Foundation,
        starting_balance: 1_000_000_00,
        personality: || Personality::new(0.1, 0.1, 1.0, 0.0, 1.0),
        goals: || vec![Goal::new(GoalType::Stabilize, 1.0, 10)],
    },
];
