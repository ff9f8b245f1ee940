//! Static event template catalogue, grouped by family (§4.3).
//!
//! Mirrors the teacher's preference for fixed, compile-time reference
//! data (`orchestrator::engine::CostRates::default()`'s literal rates)
//! over runtime-configured tables.

use crate::market::ImpactBag;
use crate::models::{EventCategory, EventSeverity, MarketPhase};

pub struct EventTemplate {
    pub title: &'static str,
    pub description: &'static str,
    pub category: EventCategory,
    pub severity: EventSeverity,
    pub base_probability: f64,
    pub preferred_phase: Option<MarketPhase>,
    pub impact: ImpactBag,
}

pub static TEMPLATES: &[EventTemplate] = &[
    EventTemplate {
        title: "Iron ore prices surge",
        description: "Global demand for iron ore pushed prices higher this month.",
        category: EventCategory::IronOre,
        severity: EventSeverity::Notable,
        base_probability: 0.12,
        preferred_phase: Some(MarketPhase::Expansion),
        impact: ImpactBag {
            iron_ore_price_delta: 6.0,
            confidence_delta: 1.0,
            housing_index_delta: 0.0,
            vacancy_delta: 0.0,
            iron_ore_price_set: None,
        },
    },
    EventTemplate {
        title: "Iron ore prices slump",
        description: "A softening export market dragged iron ore prices down.",
        category: EventCategory::IronOre,
        severity: EventSeverity::Warning,
        base_probability: 0.10,
        preferred_phase: Some(MarketPhase::Contraction),
        impact: ImpactBag {
            iron_ore_price_delta: -5.0,
            confidence_delta: -1.0,
            housing_index_delta: 0.0,
            vacancy_delta: 0.0,
            iron_ore_price_set: None,
        },
    },
    EventTemplate {
        title: "Population growth accelerates",
        description: "Net migration into the network's service area rose this month.",
        category: EventCategory::Population,
        severity: EventSeverity::Notable,
        base_probability: 0.08,
        preferred_phase: Some(MarketPhase::Expansion),
        impact: ImpactBag {
            iron_ore_price_delta: 0.0,
            confidence_delta: 0.5,
            housing_index_delta: 0.5,
            vacancy_delta: -0.2,
            iron_ore_price_set: None,
        },
    },
    EventTemplate {
        title: "Central bank holds rates",
        description: "The central bank left the benchmark interest rate unchanged.",
        category: EventCategory::MarketRate,
        severity: EventSeverity::Info,
        base_probability: 0.20,
        preferred_phase: None,
        impact: ImpactBag::default(),
    },
    EventTemplate {
        title: "Vacancy rate eases",
        description: "Listings moved faster than usual this month, tightening vacancy.",
        category: EventCategory::Property,
        severity: EventSeverity::Info,
        base_probability: 0.15,
        preferred_phase: Some(MarketPhase::Recovery),
        impact: ImpactBag {
            iron_ore_price_delta: 0.0,
            confidence_delta: 0.0,
            housing_index_delta: 0.3,
            vacancy_delta: -0.4,
            iron_ore_price_set: None,
        },
    },
    EventTemplate {
        title: "Maintenance backlog reported",
        description: "Several properties flagged deferred maintenance this month.",
        category: EventCategory::Property,
        severity: EventSeverity::Warning,
        base_probability: 0.07,
        preferred_phase: Some(MarketPhase::Trough),
        impact: ImpactBag {
            iron_ore_price_delta: 0.0,
            confidence_delta: -0.3,
            housing_index_delta: -0.2,
            vacancy_delta: 0.2,
            iron_ore_price_set: None,
        },
    },
    EventTemplate {
        title: "Consumer sentiment ticks up",
        description: "A broad consumer survey recorded improved sentiment.",
        category: EventCategory::Economic,
        severity: EventSeverity::Info,
        base_probability: 0.18,
        preferred_phase: Some(MarketPhase::Recovery),
        impact: ImpactBag {
            iron_ore_price_delta: 0.0,
            confidence_delta: 2.0,
            housing_index_delta: 0.0,
            vacancy_delta: 0.0,
            iron_ore_price_set: None,
        },
    },
    EventTemplate {
        title: "Network governance review",
        description: "The foundation published its quarterly governance review.",
        category: EventCategory::Governance,
        severity: EventSeverity::Info,
        base_probability: 0.30,
        preferred_phase: None,
        impact: ImpactBag::default(),
    },
];
