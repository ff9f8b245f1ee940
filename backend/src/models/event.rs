//! Network event model.
//!
//! Append-only per month; `created_at` is strictly increasing within a
//! month (§5, ordering guarantees).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventCategory {
    IronOre,
    Population,
    MarketRate,
    Property,
    Economic,
    Governance,
    Dividend,
    Clock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Info,
    Notable,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEvent {
    pub month: u64,
    pub created_at: u64,
    pub category: EventCategory,
    pub severity: EventSeverity,
    pub title: String,
    pub description: String,
    pub property_id: Option<String>,
    pub participant_id: Option<String>,
    pub payload: serde_json::Value,
}

impl NetworkEvent {
    pub fn new(
        month: u64,
        created_at: u64,
        category: EventCategory,
        severity: EventSeverity,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            month,
            created_at,
            category,
            severity,
            title: title.into(),
            description: description.into(),
            property_id: None,
            participant_id: None,
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_property(mut self, property_id: impl Into<String>) -> Self {
        self.property_id = Some(property_id.into());
        self
    }

    pub fn with_participant(mut self, participant_id: impl Into<String>) -> Self {
        self.participant_id = Some(participant_id.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Append-only per-month event journal, mirroring the teacher's
/// `models::event::EventLog` query surface (`events_at_tick`,
/// `events_for_agent`, ...) generalized to months/participants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<NetworkEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: NetworkEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[NetworkEvent] {
        &self.events
    }

    pub fn events_for_month(&self, month: u64) -> Vec<&NetworkEvent> {
        self.events.iter().filter(|e| e.month == month).collect()
    }

    pub fn events_of_category(&self, category: EventCategory) -> Vec<&NetworkEvent> {
        self.events.iter().filter(|e| e.category == category).collect()
    }

    pub fn events_for_participant(&self, participant_id: &str) -> Vec<&NetworkEvent> {
        self.events
            .iter()
            .filter(|e| e.participant_id.as_deref() == Some(participant_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_for_month_filters_correctly() {
        let mut log = EventLog::new();
        log.log(NetworkEvent::new(
            1,
            0,
            EventCategory::Dividend,
            EventSeverity::Info,
            "t",
            "d",
        ));
        log.log(NetworkEvent::new(
            2,
            1,
            EventCategory::Dividend,
            EventSeverity::Info,
            "t2",
            "d2",
        ));
        assert_eq!(log.events_for_month(1).len(), 1);
        assert_eq!(log.events_for_month(2).len(), 1);
    }
}
