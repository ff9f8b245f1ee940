//! Domain models for the property-tokenization simulator.

pub mod event;
pub mod holding;
pub mod market;
pub mod participant;
pub mod pending_action;
pub mod property;
pub mod snapshot;

pub use event::{EventCategory, EventLog, EventSeverity, NetworkEvent};
pub use holding::Holding;
pub use market::{MarketCondition, MarketPhase, MarketState};
pub use participant::{Goal, GoalType, Participant, ParticipantKind, ParticipantRole, Personality};
pub use pending_action::{ActionPayload, ActionResult, ActionStatus, PendingAction, VoteChoice};
pub use property::{PropertyState, PropertyStatus};
pub use snapshot::{NetworkSnapshot, SnapshotAggregates};
