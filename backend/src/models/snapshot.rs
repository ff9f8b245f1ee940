//! Network snapshot model: the immutable committed record of one month.
//!
//! Key: `network_month`, unique and dense monotonically increasing from 0
//! or 1 (P3). Snapshots never change once committed.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotAggregates {
    pub participant_count: u64,
    pub property_count: u64,
    pub total_valuation: i64,
    pub avg_token_price: f64,
    pub avg_yield: f64,
    pub actions_processed: u64,
    pub tokens_traded: f64,
    pub dividends_paid: i64,
    pub rent_collected: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub network_month: u64,
    pub aggregates: SnapshotAggregates,
    /// Full serialized state blob, for deterministic-replay checksumming
    /// (P4) — a canonical JSON encoding, hashed the way the teacher's
    /// `orchestrator::checkpoint::compute_config_hash` canonicalizes
    /// arbitrary `Serialize` values before hashing.
    pub state_blob: Option<serde_json::Value>,
    pub governor_summary: String,
    pub processing_time_ms: u64,
}

impl NetworkSnapshot {
    pub fn new(
        network_month: u64,
        aggregates: SnapshotAggregates,
        governor_summary: impl Into<String>,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            network_month,
            aggregates,
            state_blob: None,
            governor_summary: governor_summary.into(),
            processing_time_ms,
        }
    }

    pub fn with_state_blob(mut self, blob: serde_json::Value) -> Self {
        self.state_blob = Some(blob);
        self
    }

    /// Deterministic checksum over the snapshot's canonical JSON
    /// representation, used for the golden-fixture replay test (P4,
    /// scenario 5). Grounded in the teacher's
    /// `orchestrator::checkpoint::compute_config_hash`: serialize to
    /// `serde_json::Value`, recursively re-sort every object's keys into a
    /// `BTreeMap`, serialize again, then SHA256 the bytes.
    pub fn checksum(&self) -> Result<String, serde_json::Error> {
        crate::store::canonical_hash(self)
    }
}
