//! Holding model: a participant's token position in a single property.
//!
//! Invariants: `token_amount > 0` (empty holdings are removed by the
//! owning store rather than represented as zero); `avg_purchase_price` is
//! the quantity-weighted mean price across accumulations.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    token_amount: f64,
    avg_purchase_price: f64,
}

impl Holding {
    pub fn new(token_amount: f64, purchase_price: f64) -> Self {
        assert!(token_amount > 0.0, "holding token_amount must be positive");
        Self {
            token_amount,
            avg_purchase_price: purchase_price,
        }
    }

    pub fn token_amount(&self) -> f64 {
        self.token_amount
    }

    pub fn avg_purchase_price(&self) -> f64 {
        self.avg_purchase_price
    }

    /// Merge an additional purchase into this holding, updating the
    /// quantity-weighted average purchase price.
    pub fn accumulate(&mut self, additional_tokens: f64, price: f64) {
        assert!(additional_tokens > 0.0);
        let total_cost = self.token_amount * self.avg_purchase_price + additional_tokens * price;
        self.token_amount += additional_tokens;
        self.avg_purchase_price = total_cost / self.token_amount;
    }

    /// Reduce the holding. Returns `true` if the holding is now empty and
    /// should be removed by the caller.
    pub fn reduce(&mut self, tokens: f64) -> bool {
        assert!(tokens > 0.0 && tokens <= self.token_amount + f64::EPSILON);
        self.token_amount = (self.token_amount - tokens).max(0.0);
        self.token_amount <= f64::EPSILON
    }

    pub fn ownership_percent(&self, total_tokens: f64) -> f64 {
        if total_tokens <= 0.0 {
            0.0
        } else {
            self.token_amount / total_tokens
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_updates_weighted_average() {
        let mut h = Holding::new(100.0, 1.0);
        h.accumulate(100.0, 2.0);
        assert_eq!(h.token_amount(), 200.0);
        assert_eq!(h.avg_purchase_price(), 1.5);
    }

    #[test]
    fn reduce_to_zero_signals_removal() {
        let mut h = Holding::new(50.0, 1.0);
        assert!(h.reduce(50.0));
    }
}
