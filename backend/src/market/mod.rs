//! C2 — Market Model.
//!
//! Owns the deterministic macro-economic cycle. All randomness here comes
//! from the single `RngStream` threaded in by the Tick Pipeline for the
//! current tick (§5, determinism mode) — this module never creates its
//! own RNG.

use crate::models::{MarketCondition, MarketPhase, MarketState};
use crate::rng::RngStream;

/// Numeric modifiers handed to the Event Generator (C3), derived from the
/// current market condition.
#[derive(Debug, Clone, Copy)]
pub struct EventProbabilityModifiers {
    pub iron_ore: f64,
    pub population: f64,
    pub market_rate: f64,
    pub property: f64,
    pub economic: f64,
}

/// Numeric modifiers handed to the NPC Engine (C4) for activity
/// calibration.
#[derive(Debug, Clone, Copy)]
pub struct NpcCalibration {
    pub activity_multiplier: f64,
    pub risk_appetite_shift: f64,
}

/// A bag of indicator deltas an event can apply back to the market
/// (§4.3: "apply its impact bag to C2").
#[derive(Debug, Clone, Copy, Default)]
pub struct ImpactBag {
    pub iron_ore_price_delta: f64,
    pub confidence_delta: f64,
    pub housing_index_delta: f64,
    pub vacancy_delta: f64,
    pub iron_ore_price_set: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct MarketModel {
    state: MarketState,
}

impl Default for MarketModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketModel {
    pub fn new() -> Self {
        Self {
            state: MarketState::baseline(),
        }
    }

    pub fn current(&self) -> MarketState {
        self.state
    }

    pub fn market_condition(&self) -> MarketCondition {
        self.state.market_condition()
    }

    /// Advance the macro cycle by one tick. Called once per tick, before
    /// event generation (§4.7 step 4).
    ///
    /// Grounded in §4.2's literal algorithm: `months_in_phase` increments;
    /// a uniform draw decides whether the fixed cycle advances with
    /// probability `min(0.3, months_in_phase * 0.02)`; deterministic
    /// indicator deltas are applied per transition.
    pub fn update_cycle(&mut self, rng: &mut RngStream) -> Option<(MarketPhase, MarketPhase)> {
        self.state.months_in_phase += 1;
        let transition_probability = (self.state.months_in_phase as f64 * 0.02).min(0.3);

        if rng.chance(transition_probability) {
            let from = self.state.phase;
            let to = from.next();
            self.state.phase = to;
            self.state.months_in_phase = 0;

            match to {
                MarketPhase::Contraction => {
                    self.state.consumer_confidence -= 8.0;
                    self.state.housing_index -= 3.0;
                }
                MarketPhase::Recovery => {
                    self.state.consumer_confidence += 6.0;
                }
                MarketPhase::Expansion => {
                    self.state.housing_index += 2.0;
                    self.state.consumer_confidence += 4.0;
                }
                MarketPhase::Peak | MarketPhase::Trough => {}
            }
            self.state.clamp_indicators();
            return Some((from, to));
        }
        None
    }

    pub fn apply_impact(&mut self, impact: ImpactBag) {
        if let Some(set_price) = impact.iron_ore_price_set {
            self.state.iron_ore_price = set_price;
        } else {
            self.state.iron_ore_price += impact.iron_ore_price_delta;
        }
        self.state.consumer_confidence += impact.confidence_delta;
        self.state.housing_index += impact.housing_index_delta;
        self.state.vacancy_rate += impact.vacancy_delta;
        self.state.clamp_indicators();
    }

    /// Sample a monthly appreciation rate from condition-specific bounds
    /// (§4.2: "boom 0.008..0.020 monthly, bust -0.025..-0.010").
    pub fn appreciation_rate(&self, rng: &mut RngStream) -> f64 {
        let (low, high) = match self.market_condition() {
            MarketCondition::Boom => (0.008, 0.020),
            MarketCondition::Stable => (0.002, 0.010),
            MarketCondition::Stagnant => (-0.004, 0.004),
            MarketCondition::Declining => (-0.015, -0.002),
            MarketCondition::Bust => (-0.025, -0.010),
        };
        rng.uniform_range_f64(low, high)
    }

    pub fn event_probability_modifiers(&self) -> EventProbabilityModifiers {
        let bias = match self.market_condition() {
            MarketCondition::Boom => 1.3,
            MarketCondition::Stable => 1.0,
            MarketCondition::Stagnant => 0.9,
            MarketCondition::Declining => 0.8,
            MarketCondition::Bust => 0.6,
        };
        EventProbabilityModifiers {
            iron_ore: bias,
            population: bias,
            market_rate: bias,
            property: bias,
            economic: bias,
        }
    }

    pub fn npc_calibration(&self) -> NpcCalibration {
        match self.market_condition() {
            MarketCondition::Boom => NpcCalibration {
                activity_multiplier: 1.2,
                risk_appetite_shift: 0.1,
            },
            MarketCondition::Bust => NpcCalibration {
                activity_multiplier: 0.7,
                risk_appetite_shift: -0.15,
            },
            _ => NpcCalibration {
                activity_multiplier: 1.0,
                risk_appetite_shift: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_cycle_is_deterministic_given_seed() {
        let mut a = MarketModel::new();
        let mut b = MarketModel::new();
        let mut rng_a = RngStream::new(42);
        let mut rng_b = RngStream::new(42);

        for _ in 0..24 {
            a.update_cycle(&mut rng_a);
            b.update_cycle(&mut rng_b);
        }
        assert_eq!(a.current().phase, b.current().phase);
    }

    #[test]
    fn appreciation_rate_respects_condition_bounds() {
        let market = MarketModel::new();
        let mut rng = RngStream::new(1);
        for _ in 0..100 {
            let rate = market.appreciation_rate(&mut rng);
            assert!((-0.03..0.03).contains(&rate));
        }
    }
}
