//! Participant model
//!
//! A participant is either a human (linked to exactly one external user)
//! or an NPC (driven by the NPC Engine). Both flow through the same
//! Action Processor.
//!
//! CRITICAL: balance is i64 minor units (cents); it must never go negative
//! after a committed transition.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantKind {
    Human,
    Npc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantRole {
    Investor,
    Renter,
    Homeowner,
    Service,
    Foundation,
    MarketMaker,
    Developer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalType {
    Accumulate,
    Income,
    Divest,
    Stabilize,
}

/// A participant's personality vector, each component in `[0, 1]`.
///
/// NPC-only: human participants carry `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub risk_tolerance: f64,
    pub activity_level: f64,
    pub patience: f64,
    pub contrarian: f64,
    pub loyalty: f64,
}

impl Personality {
    pub fn new(
        risk_tolerance: f64,
        activity_level: f64,
        patience: f64,
        contrarian: f64,
        loyalty: f64,
    ) -> Self {
        let clamp = |v: f64| v.clamp(0.0, 1.0);
        Self {
            risk_tolerance: clamp(risk_tolerance),
            activity_level: clamp(activity_level),
            patience: clamp(patience),
            contrarian: clamp(contrarian),
            loyalty: clamp(loyalty),
        }
    }
}

/// A participant's goal, evaluated each tick in priority order.
///
/// `completed` is monotonic: once `true` it is never reset to `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub goal_type: GoalType,
    pub target_value: f64,
    pub priority: u8,
    pub deadline_month: Option<u64>,
    pub progress: f64,
    pub completed: bool,
}

impl Goal {
    pub fn new(goal_type: GoalType, target_value: f64, priority: u8) -> Self {
        Self {
            goal_type,
            target_value,
            priority: priority.clamp(1, 10),
            deadline_month: None,
            progress: 0.0,
            completed: false,
        }
    }

    pub fn with_deadline(mut self, month: u64) -> Self {
        self.deadline_month = Some(month);
        self
    }

    /// Update progress towards the goal. Once `progress >= target_value`,
    /// `completed` latches to `true` and never un-sets.
    pub fn record_progress(&mut self, progress: f64) {
        self.progress = progress;
        if self.progress >= self.target_value {
            self.completed = true;
        }
    }

    /// `true` if the goal's deadline is at most `within` months away.
    pub fn is_urgent(&self, current_month: u64, within: u64) -> bool {
        match self.deadline_month {
            Some(deadline) if !self.completed => deadline.saturating_sub(current_month) <= within,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    id: String,
    display_name: String,
    kind: ParticipantKind,
    role: ParticipantRole,
    balance: i64,
    total_invested: i64,
    total_dividends: i64,
    personality: Option<Personality>,
    external_user_id: Option<String>,
    goals: Vec<Goal>,
}

impl Participant {
    pub fn new_human(
        id: String,
        display_name: String,
        role: ParticipantRole,
        balance: i64,
        external_user_id: String,
    ) -> Self {
        assert!(balance >= 0, "initial balance must be non-negative");
        Self {
            id,
            display_name,
            kind: ParticipantKind::Human,
            role,
            balance,
            total_invested: 0,
            total_dividends: 0,
            personality: None,
            external_user_id: Some(external_user_id),
            goals: Vec::new(),
        }
    }

    pub fn new_npc(
        id: String,
        display_name: String,
        role: ParticipantRole,
        balance: i64,
        personality: Personality,
        goals: Vec<Goal>,
    ) -> Self {
        assert!(balance >= 0, "initial balance must be non-negative");
        Self {
            id,
            display_name,
            kind: ParticipantKind::Npc,
            role,
            balance,
            total_invested: 0,
            total_dividends: 0,
            personality: Some(personality),
            external_user_id: None,
            goals,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn kind(&self) -> ParticipantKind {
        self.kind
    }

    pub fn role(&self) -> ParticipantRole {
        self.role
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn total_invested(&self) -> i64 {
        self.total_invested
    }

    pub fn total_dividends(&self) -> i64 {
        self.total_dividends
    }

    pub fn personality(&self) -> Option<&Personality> {
        self.personality.as_ref()
    }

    pub fn external_user_id(&self) -> Option<&str> {
        self.external_user_id.as_deref()
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn goals_mut(&mut self) -> &mut [Goal] {
        &mut self.goals
    }

    /// Top-priority uncompleted goal, if any.
    pub fn top_unsatisfied_goal(&self) -> Option<&Goal> {
        self.goals
            .iter()
            .filter(|g| !g.completed)
            .max_by_key(|g| g.priority)
    }

    /// Debit the participant's balance. Fails rather than going negative.
    pub fn debit(&mut self, amount: i64) -> Result<(), crate::error::CoreError> {
        assert!(amount > 0, "debit amount must be positive");
        if self.balance < amount {
            return Err(crate::error::CoreError::InsufficientBalance {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    pub fn credit(&mut self, amount: i64) {
        assert!(amount > 0, "credit amount must be positive");
        self.balance += amount;
    }

    pub fn record_investment(&mut self, amount: i64) {
        self.total_invested += amount;
    }

    pub fn record_dividend(&mut self, amount: i64) {
        self.total_dividends += amount;
        self.balance += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_below_zero_fails() {
        let mut p = Participant::new_human(
            "p1".into(),
            "Alice".into(),
            ParticipantRole::Investor,
            500_00,
            "user-1".into(),
        );
        let err = p.debit(1000_00).unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_BALANCE");
        assert_eq!(p.balance(), 500_00);
    }

    #[test]
    fn goal_completion_is_monotonic() {
        let mut goal = Goal::new(GoalType::Accumulate, 100.0, 5);
        goal.record_progress(150.0);
        assert!(goal.completed);
        goal.record_progress(10.0);
        assert!(goal.completed, "completed must never un-set");
    }

    #[test]
    fn urgent_goal_detection() {
        let goal = Goal::new(GoalType::Income, 10.0, 3).with_deadline(10);
        assert!(goal.is_urgent(8, 3));
        assert!(!goal.is_urgent(5, 3));
    }
}
