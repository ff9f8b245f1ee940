//! Property state model.
//!
//! Invariants: `tokens_available` in `[0, total_tokens]`;
//! `network_ownership == (total_tokens - tokens_available) / total_tokens`;
//! `tenanted <=> tenant set and lease_end_month >= current_month`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyStatus {
    Draft,
    Available,
    Tenanted,
    Sold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyState {
    id: String,
    status: PropertyStatus,
    total_tokens: f64,
    tokens_available: f64,
    token_price: f64,
    tenant_id: Option<String>,
    weekly_rent: i64,
    lease_start_month: Option<u64>,
    lease_end_month: Option<u64>,
    cumulative_rent: i64,
    cumulative_dividends: i64,
    maintenance_reserve: i64,
    current_valuation: i64,
    last_valuation_month: u64,
}

impl PropertyState {
    pub fn new(id: String, total_tokens: f64, token_price: f64, current_valuation: i64) -> Self {
        assert!(total_tokens > 0.0);
        assert!(token_price > 0.0);
        Self {
            id,
            status: PropertyStatus::Draft,
            total_tokens,
            tokens_available: total_tokens,
            token_price,
            tenant_id: None,
            weekly_rent: 0,
            lease_start_month: None,
            lease_end_month: None,
            cumulative_rent: 0,
            cumulative_dividends: 0,
            maintenance_reserve: 0,
            current_valuation,
            last_valuation_month: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> PropertyStatus {
        self.status
    }

    pub fn total_tokens(&self) -> f64 {
        self.total_tokens
    }

    pub fn tokens_available(&self) -> f64 {
        self.tokens_available
    }

    pub fn token_price(&self) -> f64 {
        self.token_price
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn weekly_rent(&self) -> i64 {
        self.weekly_rent
    }

    pub fn cumulative_rent(&self) -> i64 {
        self.cumulative_rent
    }

    pub fn cumulative_dividends(&self) -> i64 {
        self.cumulative_dividends
    }

    pub fn current_valuation(&self) -> i64 {
        self.current_valuation
    }

    /// Fraction of total tokens already sold: `(total - available) / total`.
    pub fn network_ownership(&self) -> f64 {
        (self.total_tokens - self.tokens_available) / self.total_tokens
    }

    pub fn is_tenanted(&self, current_month: u64) -> bool {
        self.tenant_id.is_some()
            && self
                .lease_end_month
                .map(|end| end >= current_month)
                .unwrap_or(false)
    }

    /// Sell `amount` tokens out of the available pool, optionally
    /// re-pricing the property.
    pub fn sell_tokens(&mut self, amount: f64, new_price: Option<f64>) {
        assert!(amount > 0.0 && amount <= self.tokens_available + f64::EPSILON);
        self.tokens_available = (self.tokens_available - amount).max(0.0);
        if let Some(price) = new_price {
            self.token_price = price;
        }
        if self.status == PropertyStatus::Draft {
            self.status = PropertyStatus::Available;
        }
    }

    /// Return `amount` tokens to the available pool (a sell-back by a
    /// participant).
    pub fn return_tokens(&mut self, amount: f64) {
        assert!(amount > 0.0);
        self.tokens_available = (self.tokens_available + amount).min(self.total_tokens);
    }

    pub fn set_tenant(&mut self, tenant_id: String, weekly_rent: i64, start: u64, end: u64) {
        assert!(end > start);
        self.tenant_id = Some(tenant_id);
        self.weekly_rent = weekly_rent;
        self.lease_start_month = Some(start);
        self.lease_end_month = Some(end);
        self.status = PropertyStatus::Tenanted;
    }

    pub fn clear_tenant(&mut self) {
        self.tenant_id = None;
        self.weekly_rent = 0;
        self.lease_start_month = None;
        self.lease_end_month = None;
        if self.status == PropertyStatus::Tenanted {
            self.status = PropertyStatus::Available;
        }
    }

    pub fn record_rent(&mut self, amount: i64) {
        assert!(amount >= 0);
        self.cumulative_rent += amount;
    }

    pub fn record_dividend(&mut self, amount: i64) {
        assert!(amount >= 0);
        self.cumulative_dividends += amount;
    }

    /// Apply a per-tick appreciation rate to the current valuation.
    pub fn apply_appreciation(&mut self, rate: f64, month: u64) {
        let delta = (self.current_valuation as f64 * rate).round() as i64;
        self.current_valuation += delta;
        self.last_valuation_month = month;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_ownership_is_exact_ratio() {
        let mut prop = PropertyState::new("p1".into(), 10_000.0, 1.0, 1_000_000_00);
        prop.sell_tokens(2_500.0, None);
        assert_eq!(prop.network_ownership(), 0.25);
    }

    #[test]
    fn tenanted_requires_active_lease() {
        let mut prop = PropertyState::new("p1".into(), 10_000.0, 1.0, 1_000_000_00);
        prop.set_tenant("participant-1".into(), 650_00, 0, 12);
        assert!(prop.is_tenanted(10));
        assert!(!prop.is_tenanted(13));
    }
}
