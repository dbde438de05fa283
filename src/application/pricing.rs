use bigdecimal::{BigDecimal, RoundingMode};
use serde::Serialize;

use super::cart_engine::subtotal_of;
use crate::domain::cart::CartItem;
use crate::domain::catalog::MembershipTier;

/// Minor currency unit scale used when amounts leave the calculator.
pub const CURRENCY_SCALE: i64 = 2;

pub fn round_currency(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(CURRENCY_SCALE, RoundingMode::HalfUp)
}

pub fn discount_rate(tier: Option<MembershipTier>) -> BigDecimal {
    match tier {
        Some(MembershipTier::Platinum) => BigDecimal::new(15.into(), 2),
        Some(MembershipTier::Gold) => BigDecimal::new(10.into(), 2),
        Some(MembershipTier::Silver) => BigDecimal::new(5.into(), 2),
        None => BigDecimal::from(0),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBreakdown {
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub tax: BigDecimal,
    pub shipping: BigDecimal,
    pub total: BigDecimal,
}

impl PriceBreakdown {
    /// Display/persist view, rounded to cents.
    pub fn rounded(&self) -> PriceBreakdown {
        PriceBreakdown {
            subtotal: round_currency(&self.subtotal),
            discount: round_currency(&self.discount),
            tax: round_currency(&self.tax),
            shipping: round_currency(&self.shipping),
            total: round_currency(&self.total),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricingPolicy {
    pub tax_rate: BigDecimal,
    pub flat_shipping_fee: BigDecimal,
    /// Subtotals strictly above this ship free.
    pub free_shipping_threshold: BigDecimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: BigDecimal::new(6.into(), 2),
            flat_shipping_fee: BigDecimal::from(25),
            free_shipping_threshold: BigDecimal::from(200),
        }
    }
}

impl PricingPolicy {
    /// Full-precision totals; nothing is rounded here.
    pub fn price(&self, subtotal: BigDecimal, tier: Option<MembershipTier>) -> PriceBreakdown {
        let discount = &subtotal * discount_rate(tier);
        let tax = (&subtotal - &discount) * &self.tax_rate;
        let shipping = if subtotal > self.free_shipping_threshold {
            BigDecimal::from(0)
        } else {
            self.flat_shipping_fee.clone()
        };
        let total = &subtotal - &discount + &tax + &shipping;

        PriceBreakdown {
            subtotal,
            discount,
            tax,
            shipping,
            total,
        }
    }

    pub fn calculate(&self, items: &[CartItem], tier: Option<MembershipTier>) -> PriceBreakdown {
        self.price(subtotal_of(items), tier)
    }
}

pub fn calculate_totals(items: &[CartItem], tier: Option<MembershipTier>) -> PriceBreakdown {
    PricingPolicy::default().calculate(items, tier)
}
