//! Shipping and tax rules applied at checkout

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Charges added on top of the item subtotal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Charges {
    pub shipping_cost: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
}

/// Full price breakdown for a subtotal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub subtotal: Decimal,
    #[serde(flatten)]
    pub charges: Charges,
    pub total_amount: Decimal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PricingPolicy {
    pub free_shipping_threshold: Decimal,
    pub flat_shipping_rate: Decimal,
    pub tax_rate: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Decimal::new(100, 0),
            flat_shipping_rate: Decimal::new(999, 2),
            tax_rate: Decimal::new(8, 2),
        }
    }
}

impl PricingPolicy {
    pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= self.free_shipping_threshold { Decimal::ZERO } else { self.flat_shipping_rate }
    }

    /// Tax on goods plus shipping, rounded half away from zero to cents.
    pub fn tax_for(&self, subtotal: Decimal, shipping: Decimal) -> Decimal {
        ((subtotal + shipping) * self.tax_rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn quote(&self, subtotal: Decimal) -> Quote {
        let shipping_cost = self.shipping_for(subtotal);
        let tax = self.tax_for(subtotal, shipping_cost);
        let charges = Charges { shipping_cost, tax, discount: Decimal::ZERO };
        Quote { subtotal, charges, total_amount: subtotal + shipping_cost + tax - charges.discount }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(cents: i64) -> Decimal { Decimal::new(cents, 2) }

    #[test]
    fn test_free_shipping_boundary() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.shipping_for(d(9999)), d(999));
        assert_eq!(policy.shipping_for(d(10000)), Decimal::ZERO);
    }

    #[test]
    fn test_quote_over_threshold() {
        let quote = PricingPolicy::default().quote(d(12000));
        assert_eq!(quote.charges.shipping_cost, Decimal::ZERO);
        assert_eq!(quote.charges.tax, d(960));
        assert_eq!(quote.total_amount, d(12960));
    }

    #[test]
    fn test_quote_under_threshold() {
        let quote = PricingPolicy::default().quote(d(2000));
        assert_eq!(quote.charges.shipping_cost, d(999));
        assert_eq!(quote.charges.tax, d(240));
        assert_eq!(quote.total_amount, d(3239));
    }

    #[test]
    fn test_tax_rounds_half_up() {
        let policy = PricingPolicy { tax_rate: Decimal::new(5, 2), ..PricingPolicy::default() };
        // 10.10 * 0.05 = 0.505
        assert_eq!(policy.tax_for(d(1010), Decimal::ZERO), d(51));
    }
}
