//! Network simulation core — a deterministic, monthly-tick engine for a
//! property-tokenization network.
//!
//! # Architecture
//!
//! - **store**: sole owner of persisted entities (C1)
//! - **market**: deterministic macro-economic cycle (C2)
//! - **eventgen**: per-tick event generation from templates (C3)
//! - **npc**: goal-driven non-human participants (C4)
//! - **actions**: the only component that mutates committed state (C5)
//! - **clock**: wall-clock-driven tick scheduling (C6)
//! - **orchestrator**: the tick pipeline tying the above together (C7)
//! - **bus**: per-subscriber bounded-mailbox event fan-out (C8)
//! - **llm**: optional external narrative bridge, always falls back (C9)
//! - **rng**: single deterministic PRNG stream, threaded per tick
//! - **config**: layered settings (defaults -> file -> environment)
//!
//! # Critical invariants
//!
//! 1. Money is always `i64` minor units (cents); token quantities and
//!    ratios are `f64`.
//! 2. All randomness flows through one `RngStream` per tick — no
//!    component creates its own source of entropy.
//! 3. The `StateStore` is the only mutable source of truth; every other
//!    component reads snapshots or acts through the Action Processor.

pub mod actions;
pub mod bus;
pub mod clock;
pub mod config;
pub mod error;
pub mod eventgen;
pub mod llm;
pub mod market;
pub mod models;
pub mod npc;
pub mod orchestrator;
pub mod rng;
pub mod store;

pub use actions::{ActionProcessor, TickContext};
pub use bus::{BusEvent, Subscription, SubscriptionBus};
pub use clock::{ClockMode, ClockPreset, ClockState, NetworkClock};
pub use config::Settings;
pub use error::{CoreError, CoreResult, StatusHint};
pub use eventgen::{EventGenerator, GeneratedEvents};
pub use llm::{BridgeError, HttpBridge, NarrativeBridge, NarrativeRequest, NullBridge};
pub use market::MarketModel;
pub use models::{ActionPayload, ActionResult, ActionStatus, PendingAction, VoteChoice};
pub use npc::NpcEngine;
pub use orchestrator::{TickOutcome, TickPipeline};
pub use rng::RngStream;
pub use store::{InMemoryStore, StateStore};
