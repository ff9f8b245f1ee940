//! C3 — Event Generator.
//!
//! Produces a bounded set of `NetworkEvent`s per tick from templates x
//! market state, plus a pure-function narrative fallback for the
//! governor summary (the External LLM Bridge, C9, may replace it).

mod templates;

use crate::eventgen::templates::{EventTemplate, TEMPLATES};
use crate::market::MarketModel;
use crate::models::{EventCategory, MarketPhase, NetworkEvent};
use crate::rng::RngStream;

pub struct GeneratedEvents {
    pub events: Vec<NetworkEvent>,
    pub fallback_summary: String,
}

pub struct EventGenerator;

impl Default for EventGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl EventGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate this tick's events, applying fired templates' impact bags
    /// back into the market model as they fire (§4.3).
    ///
    /// Constraints enforced here, per spec: at most one iron-ore event, at
    /// most one market-rate event, at most two property events per month;
    /// governance events only when `month % 3 == 0`.
    pub fn generate_for_tick(
        &self,
        month: u64,
        market: &mut MarketModel,
        rng: &mut RngStream,
    ) -> GeneratedEvents {
        let modifiers = market.event_probability_modifiers();
        let phase = market.current().phase;

        let mut events = Vec::new();
        let mut iron_ore_fired = 0u8;
        let mut market_rate_fired = 0u8;
        let mut property_fired = 0u8;
        let mut created_at = 0u64;

        for template in TEMPLATES.iter() {
            if template.category == EventCategory::Governance && month % 3 != 0 {
                continue;
            }
            match template.category {
                EventCategory::IronOre if iron_ore_fired >= 1 => continue,
                EventCategory::MarketRate if market_rate_fired >= 1 => continue,
                EventCategory::Property if property_fired >= 2 => continue,
                _ => {}
            }

            let phase_bias = phase_bias(template, phase);
            let market_modifier = category_modifier(template.category, modifiers);
            let probability = template.base_probability * phase_bias * market_modifier;

            if rng.chance(probability) {
                let event = build_event(template, month, created_at);
                created_at += 1;
                market.apply_impact(template.impact);

                match template.category {
                    EventCategory::IronOre => iron_ore_fired += 1,
                    EventCategory::MarketRate => market_rate_fired += 1,
                    EventCategory::Property => property_fired += 1,
                    _ => {}
                }
                events.push(event);
            }
        }

        let fallback_summary = fallback_narrative(month, events.len());
        GeneratedEvents {
            events,
            fallback_summary,
        }
    }
}

fn phase_bias(template: &EventTemplate, phase: MarketPhase) -> f64 {
    match template.preferred_phase {
        Some(preferred) if preferred == phase => 1.5,
        Some(_) => 0.5,
        None => 1.0,
    }
}

fn category_modifier(
    category: EventCategory,
    modifiers: crate::market::EventProbabilityModifiers,
) -> f64 {
    match category {
        EventCategory::IronOre => modifiers.iron_ore,
        EventCategory::Population => modifiers.population,
        EventCategory::MarketRate => modifiers.market_rate,
        EventCategory::Property => modifiers.property,
        EventCategory::Economic => modifiers.economic,
        EventCategory::Governance | EventCategory::Dividend | EventCategory::Clock => 1.0,
    }
}

fn build_event(template: &EventTemplate, month: u64, created_at: u64) -> NetworkEvent {
    NetworkEvent::new(
        month,
        created_at,
        template.category,
        template.severity,
        template.title,
        template.description,
    )
}

/// Deterministic fallback narrative, used whenever the External LLM
/// Bridge (C9) is unavailable or times out (§4.9).
pub fn fallback_narrative(month: u64, notable_event_count: usize) -> String {
    format!(
        "Month {} saw {} notable events in the network.",
        month, notable_event_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn governance_events_only_fire_on_multiples_of_three() {
        let mut market = MarketModel::new();
        let generator = EventGenerator::new();
        let mut rng = RngStream::new(1);
        let generated = generator.generate_for_tick(4, &mut market, &mut rng);
        assert!(generated
            .events
            .iter()
            .all(|e| e.category != EventCategory::Governance));
    }

    #[test]
    fn at_most_one_iron_ore_event_per_month() {
        let mut market = MarketModel::new();
        let generator = EventGenerator::new();
        let mut rng = RngStream::new(7);
        let generated = generator.generate_for_tick(6, &mut market, &mut rng);
        let iron_ore_count = generated
            .events
            .iter()
            .filter(|e| e.category == EventCategory::IronOre)
            .count();
        assert!(iron_ore_count <= 1);
    }

    #[test]
    fn fallback_narrative_is_pure_and_deterministic() {
        assert_eq!(
            fallback_narrative(3, 5),
            "Month 3 saw 5 notable events in the network."
        );
    }
}
