//! Pricing
//!
//! Authoritative order totals, computed from the order's own line items
//! rather than trusting a discount sent by the client.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::{
    cart::{Cart, CartError},
    discounts::{DiscountResult, calculate, round_currency},
    promotions::PromoCodeDescriptor,
};

/// Errors that can occur while pricing an order.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Errors bubbled up from the cart subtotal.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// The amounts to persist on an order record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderPricing {
    /// The promo code applied, if it gave any discount.
    pub promo_code: Option<String>,

    /// Rate of the applied promo code, zero when none applied.
    pub discount_percent: Decimal,

    /// Sum of the priced lines.
    pub subtotal: Decimal,

    /// Discount from the promo code.
    pub discount: Decimal,

    /// Amount payable: subtotal less discount, never below zero.
    pub total: Decimal,

    /// Lines that received a discount.
    pub eligible_items: Vec<String>,

    /// Cart positions of the lines that received a discount.
    pub eligible_lines: Vec<usize>,
}

impl OrderPricing {
    /// Whether the line at `idx` in the cart received a discount.
    pub fn is_line_eligible(&self, idx: usize) -> bool {
        self.eligible_lines.contains(&idx)
    }

    /// Whether a promo code contributed to this order.
    pub fn has_promotion(&self) -> bool {
        self.promo_code.is_some()
    }
}

/// Price an order, optionally with a validated promo code and its descriptor.
///
/// A code that yields no discount on this cart is not recorded on the result.
///
/// # Errors
///
/// Returns [`PricingError::Cart`] if the cart subtotal overflows.
pub fn price_order(
    cart: &Cart,
    applied: Option<(&str, &PromoCodeDescriptor)>,
) -> Result<OrderPricing, PricingError> {
    let subtotal = round_currency(cart.subtotal()?);

    let DiscountResult {
        discount,
        eligible_items,
        eligible_lines,
    } = calculate(cart.items(), applied.map(|(_, promo)| promo));

    let (promo_code, discount_percent) = match applied {
        Some((code, promo)) if discount > Decimal::ZERO => {
            (Some(code.trim().to_string()), promo.discount_percent)
        }
        _ => (None, Decimal::ZERO),
    };

    let total = round_currency((subtotal - discount).max(Decimal::ZERO));

    info!(
        %subtotal,
        %discount,
        %total,
        promo_code = promo_code.as_deref(),
        "priced order"
    );

    Ok(OrderPricing {
        promo_code,
        discount_percent,
        subtotal,
        discount,
        total,
        eligible_items,
        eligible_lines,
    })
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{cart::CartLineItem, promotions::ApplicableProduct};

    use super::*;

    fn cart() -> Cart {
        Cart::with_items(vec![
            CartLineItem::new("A", Decimal::ONE_HUNDRED, 2),
            CartLineItem::new("B", Decimal::new(50, 0), 1),
        ])
    }

    #[test]
    fn price_without_promo() -> TestResult {
        let pricing = price_order(&cart(), None)?;

        assert_eq!(pricing.subtotal, Decimal::new(250, 0));
        assert_eq!(pricing.discount, Decimal::ZERO);
        assert_eq!(pricing.total, Decimal::new(250, 0));
        assert!(!pricing.has_promotion());

        Ok(())
    }

    #[test]
    fn price_with_applied_promo() -> TestResult {
        let promo = PromoCodeDescriptor::restricted(
            Decimal::new(20, 0),
            [ApplicableProduct::capped("A", Decimal::new(25, 0))],
        );

        let pricing = price_order(&cart(), Some((" SAVE20 ", &promo)))?;

        assert_eq!(pricing.promo_code.as_deref(), Some("SAVE20"));
        assert_eq!(pricing.discount_percent, Decimal::new(20, 0));
        assert_eq!(pricing.discount, Decimal::new(25, 0));
        assert_eq!(pricing.total, Decimal::new(225, 0));
        assert_eq!(pricing.eligible_items, ["A"]);
        assert_eq!(pricing.eligible_lines, [0]);
        assert!(!pricing.is_line_eligible(1));

        Ok(())
    }

    #[test]
    fn promo_that_does_not_apply_is_not_recorded() -> TestResult {
        let promo =
            PromoCodeDescriptor::restricted(Decimal::TEN, [ApplicableProduct::uncapped("Z")]);

        let pricing = price_order(&cart(), Some(("ZONLY", &promo)))?;

        assert_eq!(pricing.promo_code, None);
        assert_eq!(pricing.discount_percent, Decimal::ZERO);
        assert_eq!(pricing.total, pricing.subtotal);

        Ok(())
    }

    #[test]
    fn total_never_negative() -> TestResult {
        let promo = PromoCodeDescriptor::unrestricted(Decimal::new(150, 0));

        let pricing = price_order(&cart(), Some(("DOUBLE", &promo)))?;

        assert_eq!(pricing.discount, Decimal::new(375, 0));
        assert_eq!(pricing.total, Decimal::ZERO);

        Ok(())
    }
}
