use uuid::Uuid;

use crate::models::PricingSnapshot;

#[derive(Debug, Clone)]
pub struct SeatPrice {
    pub seat_id: Uuid,
    pub price: i64,
}

#[derive(Debug, Clone)]
pub struct PricedConcession {
    pub code: String,
    pub unit_price: i64,
    pub quantity: i32,
}

/// Everything the pricing engine needs; assembled by the session manager
/// inside the same transaction that validates the items.
#[derive(Debug, Clone, Default)]
pub struct PricingInput {
    pub seats: Vec<SeatPrice>,
    pub concessions: Vec<PricedConcession>,
    /// Voucher discount, whole percent. Zero when no voucher is applied.
    pub percent_off: i32,
}

/// Deterministic price computation. Same input, same snapshot — the
/// finalizer's amount cross-check depends on it.
pub trait PricingEngine: Send + Sync {
    fn concession_price(&self, code: &str) -> Option<i64>;
    fn compute(&self, input: &PricingInput) -> PricingSnapshot;
}

const CONCESSIONS: &[(&str, i64)] = &[
    ("COMBO_SWEET", 79_000),
    ("COMBO_FAMILY", 129_000),
    ("POPCORN_L", 55_000),
    ("SODA_M", 25_000),
];

#[derive(Debug, Clone)]
pub struct StandardPricing {
    /// Platform commission in basis points of the discounted total.
    pub commission_rate_bps: i64,
}

impl Default for StandardPricing {
    fn default() -> Self {
        Self {
            commission_rate_bps: 500,
        }
    }
}

impl PricingEngine for StandardPricing {
    fn concession_price(&self, code: &str) -> Option<i64> {
        CONCESSIONS
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, price)| *price)
    }

    fn compute(&self, input: &PricingInput) -> PricingSnapshot {
        let seats: i64 = input.seats.iter().map(|s| s.price).sum();
        let concessions: i64 = input
            .concessions
            .iter()
            .map(|c| c.unit_price * i64::from(c.quantity))
            .sum();
        let subtotal = seats + concessions;
        let discount = subtotal * i64::from(input.percent_off) / 100;
        let total = subtotal - discount;
        let commission = total * self.commission_rate_bps / 10_000;

        PricingSnapshot {
            subtotal,
            discount,
            total,
            commission,
        }
    }
}
