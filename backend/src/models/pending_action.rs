//! Pending action model.
//!
//! Action payloads are a tagged variant per `action_type` (Design Note,
//! §9: "dynamic dicts as action payloads -> tagged variant"), rather than
//! a generic `serde_json::Value` bag, following the teacher's preference
//! for typed enums over stringly-typed dispatch (`TransactionStatus`,
//! `PolicyConfig` in `orchestrator::engine`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteChoice {
    For,
    Against,
    Abstain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action_type", rename_all = "snake_case")]
pub enum ActionPayload {
    BuyTokens {
        property_id: String,
        token_amount: f64,
        max_price: f64,
    },
    SellTokens {
        property_id: String,
        token_amount: f64,
        min_price: f64,
    },
    PayRent {
        property_id: String,
        weeks: u32,
    },
    CollectRent {
        property_id: String,
    },
    Vote {
        proposal_id: String,
        choice: VoteChoice,
    },
    RequestService {
        property_id: String,
        service_type: String,
        description: String,
    },
    CompleteService {
        request_id: String,
        amount: i64,
        notes: String,
    },
}

impl ActionPayload {
    pub fn action_type(&self) -> &'static str {
        match self {
            ActionPayload::BuyTokens { .. } => "buy_tokens",
            ActionPayload::SellTokens { .. } => "sell_tokens",
            ActionPayload::PayRent { .. } => "pay_rent",
            ActionPayload::CollectRent { .. } => "collect_rent",
            ActionPayload::Vote { .. } => "vote",
            ActionPayload::RequestService { .. } => "request_service",
            ActionPayload::CompleteService { .. } => "complete_service",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Result returned by the Action Processor. Never thrown across its
/// boundary — both humans and NPCs consume this same shape (§4.5, §7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub action_id: String,
    pub action_type: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub error_code: Option<String>,
}

impl ActionResult {
    pub fn ok(action_id: impl Into<String>, action_type: &str, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            success: true,
            action_id: action_id.into(),
            action_type: action_type.to_string(),
            message: message.into(),
            data: Some(data),
            error_code: None,
        }
    }

    pub fn failure(
        action_id: impl Into<String>,
        action_type: &str,
        message: impl Into<String>,
        error_code: &str,
    ) -> Self {
        Self {
            success: false,
            action_id: action_id.into(),
            action_type: action_type.to_string(),
            message: message.into(),
            data: None,
            error_code: Some(error_code.to_string()),
        }
    }
}

/// A queued intent awaiting the next tick (or immediate processing).
///
/// Lifecycle: created `Pending` -> selected by the pipeline -> `Processing`
/// -> terminal (`Completed`/`Failed`). Terminal actions are immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    id: String,
    participant_id: String,
    payload: ActionPayload,
    priority: u8,
    status: ActionStatus,
    queued_for_month: u64,
    queued_at: u64,
    result: Option<ActionResult>,
    processed_at: Option<u64>,
}

impl PendingAction {
    pub fn new(
        id: String,
        participant_id: String,
        payload: ActionPayload,
        priority: u8,
        queued_for_month: u64,
        queued_at: u64,
    ) -> Self {
        Self {
            id,
            participant_id,
            payload,
            priority: priority.clamp(0, 10),
            status: ActionStatus::Pending,
            queued_for_month,
            queued_at,
            result: None,
            processed_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn payload(&self) -> &ActionPayload {
        &self.payload
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn status(&self) -> ActionStatus {
        self.status
    }

    pub fn queued_for_month(&self) -> u64 {
        self.queued_for_month
    }

    pub fn queued_at(&self) -> u64 {
        self.queued_at
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, ActionStatus::Completed | ActionStatus::Failed)
    }

    pub fn mark_processing(&mut self) {
        self.status = ActionStatus::Processing;
    }

    /// Finalize the action with its result. No-op beyond the first call:
    /// actions are immutable once terminal (P6, idempotence).
    pub fn complete(&mut self, result: ActionResult, processed_at: u64) {
        if self.is_terminal() {
            return;
        }
        self.status = if result.success {
            ActionStatus::Completed
        } else {
            ActionStatus::Failed
        };
        self.result = Some(result);
        self.processed_at = Some(processed_at);
    }

    pub fn result(&self) -> Option<&ActionResult> {
        self.result.as_ref()
    }

    pub fn processed_at(&self) -> Option<u64> {
        self.processed_at
    }

    /// Sort key for pipeline admission: `(priority desc, queued_at asc)`.
    pub fn ordering_key(&self) -> (std::cmp::Reverse<u8>, u64) {
        (std::cmp::Reverse(self.priority), self.queued_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_is_terminal_and_idempotent() {
        let mut action = PendingAction::new(
            "a1".into(),
            "p1".into(),
            ActionPayload::CollectRent {
                property_id: "prop-1".into(),
            },
            5,
            3,
            0,
        );
        action.complete(
            ActionResult::ok("a1", "collect_rent", "done", serde_json::json!({})),
            3,
        );
        assert!(action.is_terminal());
        let first_processed_at = action.processed_at();

        // A second completion attempt must not change terminal state.
        action.complete(
            ActionResult::failure("a1", "collect_rent", "should not apply", "X"),
            99,
        );
        assert_eq!(action.processed_at(), first_processed_at);
        assert_eq!(action.status(), ActionStatus::Completed);
    }

    #[test]
    fn ordering_key_sorts_priority_desc_then_queued_at_asc() {
        let a = PendingAction::new(
            "a".into(),
            "p".into(),
            ActionPayload::CollectRent {
                property_id: "x".into(),
            },
            10,
            1,
            0,
        );
        let b = PendingAction::new(
            "b".into(),
            "p".into(),
            ActionPayload::CollectRent {
                property_id: "x".into(),
            },
            10,
            1,
            5,
        );
        let mut actions = vec![b.clone(), a.clone()];
        actions.sort_by_key(|x| x.ordering_key());
        assert_eq!(actions[0].id(), "a");
        assert_eq!(actions[1].id(), "b");
    }
}
