//! Discounts
//!
//! Promo-code discount calculation over a cart snapshot. The calculation is
//! pure: the same cart and promo always produce the same [`DiscountResult`].

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use serde::Serialize;
use thiserror::Error;
use tracing::{Span, debug, warn};

use crate::{
    cart::CartLineItem,
    promotions::{ApplicableProduct, PromoCodeDescriptor},
};

/// Errors converting discount amounts into money.
#[derive(Debug, Error, PartialEq)]
pub enum DiscountError {
    /// Amount could not be represented in the currency's minor units.
    #[error("amount {0} cannot be represented in minor units")]
    AmountConversion(Decimal),
}

/// Outcome of applying a promo to a cart.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiscountResult {
    /// Total discount, non-negative, at two decimal places.
    pub discount: Decimal,

    /// Identifiers of the lines that received a non-zero discount, in cart
    /// order. A product appears once per line it was on.
    pub eligible_items: Vec<String>,

    /// Cart positions of the lines that received a discount, parallel to
    /// `eligible_items`.
    pub eligible_lines: Vec<usize>,
}

impl DiscountResult {
    /// No discount, nothing eligible.
    pub fn zero() -> Self {
        Self {
            discount: round_currency(Decimal::ZERO),
            eligible_items: Vec::new(),
            eligible_lines: Vec::new(),
        }
    }

    /// Whether the promo produced any discount on this cart.
    ///
    /// `false` means the code does not apply to the cart, which callers
    /// report differently from a discount being applied.
    pub fn is_applied(&self) -> bool {
        self.discount > Decimal::ZERO
    }

    /// Whether the line at `idx` in the cart received a discount.
    pub fn is_line_eligible(&self, idx: usize) -> bool {
        self.eligible_lines.contains(&idx)
    }

    /// Discount as money in `currency`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::AmountConversion`] if the discount does not fit in minor units.
    pub fn to_money(
        &self,
        currency: &'static Currency,
    ) -> Result<Money<'static, Currency>, DiscountError> {
        money_from_amount(self.discount, currency)
    }
}

/// Calculate the discount `promo` gives on `items`.
///
/// A missing promo, or one with a zero rate, short-circuits to
/// [`DiscountResult::zero`]. Otherwise each line with a non-zero price and
/// quantity and a non-empty identifier is considered in order. When the promo
/// lists applicable products, lines for other products are ignored. A line's
/// discount is its subtotal times the rate, capped by the first matching
/// entry's `max_discount_amount`. Only lines whose discount ends up strictly
/// positive count towards the total and the eligible items, so a zero cap or a
/// negative price or quantity leaves a line ineligible.
///
/// The total is clamped at zero and rounded half away from zero to two
/// decimal places.
#[tracing::instrument(
    name = "discounts.calculate",
    skip_all,
    fields(
        items = items.len(),
        restricted = tracing::field::Empty,
        discount = tracing::field::Empty
    )
)]
pub fn calculate(items: &[CartLineItem], promo: Option<&PromoCodeDescriptor>) -> DiscountResult {
    let Some(promo) = promo.filter(|promo| !promo.discount_percent.is_zero()) else {
        return DiscountResult::zero();
    };

    let span = Span::current();
    let restricted = promo.is_restricted();
    let applicable = promo.applicable_index();

    span.record("restricted", restricted);

    let mut total = Decimal::ZERO;
    let mut eligible_items = Vec::new();
    let mut eligible_lines = Vec::new();

    for (idx, item) in items.iter().enumerate() {
        if !item.is_priced() {
            debug!(line = idx, "skipping line with zero price or quantity");

            continue;
        }

        let product_id = item.product_id().trim();

        if product_id.is_empty() {
            debug!(line = idx, "skipping line with empty product identifier");

            continue;
        }

        let entry = applicable.get(product_id).copied();

        if restricted && entry.is_none() {
            debug!(line = idx, product_id, "product not covered by promotion");

            continue;
        }

        let cap = entry.and_then(ApplicableProduct::cap);

        let Some(line_discount) = line_discount(item, promo.discount_percent, cap) else {
            warn!(line = idx, product_id, "line discount overflowed; skipping");

            continue;
        };

        if line_discount <= Decimal::ZERO {
            continue;
        }

        let Some(next) = total.checked_add(line_discount) else {
            warn!(line = idx, product_id, "discount total overflowed; skipping");

            continue;
        };

        total = next;
        eligible_items.push(product_id.to_string());
        eligible_lines.push(idx);
    }

    let discount = round_currency(total.max(Decimal::ZERO));

    span.record("discount", tracing::field::display(discount));

    DiscountResult {
        discount,
        eligible_items,
        eligible_lines,
    }
}

/// Discount for a single line, or `None` if the arithmetic overflows.
fn line_discount(item: &CartLineItem, percent: Decimal, cap: Option<Decimal>) -> Option<Decimal> {
    let discount = item
        .subtotal()?
        .checked_mul(percent)?
        .checked_div(Decimal::ONE_HUNDRED)?;

    Some(match cap {
        Some(cap) => discount.min(cap),
        None => discount,
    })
}

/// Round a currency amount half away from zero to two decimal places.
///
/// The result always carries a scale of two, so `20` becomes `20.00`.
pub fn round_currency(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);

    rounded
}

/// Convert a two decimal place amount into money.
///
/// # Errors
///
/// Returns [`DiscountError::AmountConversion`] if the amount does not fit in minor units.
pub fn money_from_amount(
    amount: Decimal,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, DiscountError> {
    let minor = round_currency(amount)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|minor| minor.to_i64())
        .ok_or(DiscountError::AmountConversion(amount))?;

    Ok(Money::from_minor(minor, currency))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use super::*;

    fn line(product_id: &str, price: Decimal, quantity: i64) -> CartLineItem {
        CartLineItem::new(product_id, price, quantity)
    }

    #[test]
    fn no_promo_returns_zero() {
        let items = [line("A", Decimal::ONE_HUNDRED, 1)];

        assert_eq!(calculate(&items, None), DiscountResult::zero());
    }

    #[test]
    fn zero_rate_short_circuits() {
        let items = [line("A", Decimal::ONE_HUNDRED, 1)];
        let promo = PromoCodeDescriptor::unrestricted(Decimal::ZERO);

        assert_eq!(calculate(&items, Some(&promo)), DiscountResult::zero());
    }

    #[test]
    fn unrestricted_promo_discounts_every_line() {
        let items = [
            line("A", Decimal::new(1999, 2), 2),
            line("B", Decimal::new(500, 2), 1),
        ];
        let promo = PromoCodeDescriptor::unrestricted(Decimal::new(15, 0));

        let result = calculate(&items, Some(&promo));

        // (39.98 + 5.00) * 0.15 = 6.747
        assert_eq!(result.discount, Decimal::new(675, 2));
        assert_eq!(result.eligible_items, ["A", "B"]);
    }

    #[test]
    fn identifiers_are_trimmed() {
        let items = [line("  A ", Decimal::TEN, 1)];
        let promo = PromoCodeDescriptor::restricted(Decimal::TEN, [ApplicableProduct::uncapped("A")]);

        let result = calculate(&items, Some(&promo));

        assert_eq!(result.discount, Decimal::ONE);
        assert_eq!(result.eligible_items, ["A"]);
    }

    #[test]
    fn empty_identifier_is_skipped() {
        let items = [line("   ", Decimal::TEN, 1), line("B", Decimal::TEN, 1)];
        let promo = PromoCodeDescriptor::unrestricted(Decimal::TEN);

        let result = calculate(&items, Some(&promo));

        assert_eq!(result.discount, Decimal::ONE);
        assert_eq!(result.eligible_items, ["B"]);
    }

    #[test]
    fn first_matching_entry_sets_the_cap() {
        let items = [line("A", Decimal::ONE_HUNDRED, 1)];
        let promo = PromoCodeDescriptor::restricted(
            Decimal::new(50, 0),
            [
                ApplicableProduct::capped("A", Decimal::new(5, 0)),
                ApplicableProduct::capped("A", Decimal::new(40, 0)),
            ],
        );

        assert_eq!(calculate(&items, Some(&promo)).discount, Decimal::new(5, 0));
    }

    #[test]
    fn cap_applies_per_line() {
        let items = [
            line("A", Decimal::ONE_HUNDRED, 1),
            line("A", Decimal::ONE_HUNDRED, 1),
        ];
        let promo = PromoCodeDescriptor::restricted(
            Decimal::new(50, 0),
            [ApplicableProduct::capped("A", Decimal::new(30, 0))],
        );

        let result = calculate(&items, Some(&promo));

        assert_eq!(result.discount, Decimal::new(60, 0));
        assert_eq!(result.eligible_items, ["A", "A"]);
    }

    #[test]
    fn negative_cap_is_not_enforced() {
        let items = [line("A", Decimal::ONE_HUNDRED, 1)];
        let promo = PromoCodeDescriptor::restricted(
            Decimal::TEN,
            [ApplicableProduct::capped("A", Decimal::NEGATIVE_ONE)],
        );

        assert_eq!(calculate(&items, Some(&promo)).discount, Decimal::TEN);
    }

    #[test]
    fn negative_price_or_quantity_is_excluded() {
        let items = [
            line("neg-price", Decimal::new(-20, 0), 1),
            line("neg-qty", Decimal::new(20, 0), -1),
            line("B", Decimal::new(20, 0), 1),
        ];
        let promo = PromoCodeDescriptor::unrestricted(Decimal::TEN);

        let result = calculate(&items, Some(&promo));

        assert_eq!(result.discount, Decimal::TWO);
        assert_eq!(result.eligible_items, ["B"]);
    }

    #[test]
    fn eligible_lines_track_credited_positions() {
        let items = [
            line("A", Decimal::TEN, 1),
            line("A", Decimal::ZERO, 1),
            line("A", Decimal::TEN, -1),
            line("A", Decimal::TEN, 2),
        ];
        let promo = PromoCodeDescriptor::unrestricted(Decimal::TEN);

        let result = calculate(&items, Some(&promo));

        assert_eq!(result.eligible_items, ["A", "A"]);
        assert_eq!(result.eligible_lines, [0, 3]);
        assert!(result.is_line_eligible(0));
        assert!(!result.is_line_eligible(1));
        assert!(!result.is_line_eligible(2));
    }

    #[test]
    fn negative_rate_yields_zero() {
        let items = [line("A", Decimal::ONE_HUNDRED, 1)];
        let promo = PromoCodeDescriptor::unrestricted(Decimal::new(-10, 0));

        assert_eq!(calculate(&items, Some(&promo)), DiscountResult::zero());
    }

    #[test]
    fn overflowing_line_is_skipped() {
        let items = [line("huge", Decimal::MAX, 2), line("B", Decimal::TEN, 1)];
        let promo = PromoCodeDescriptor::unrestricted(Decimal::TEN);

        let result = calculate(&items, Some(&promo));

        assert_eq!(result.discount, Decimal::ONE);
        assert_eq!(result.eligible_items, ["B"]);
    }

    #[test]
    fn round_currency_rounds_half_away_from_zero() {
        assert_eq!(round_currency(Decimal::new(12345, 3)).to_string(), "12.35");
        assert_eq!(round_currency(Decimal::new(12344, 3)).to_string(), "12.34");
        assert_eq!(round_currency(Decimal::new(1005, 3)).to_string(), "1.01");
        assert_eq!(round_currency(Decimal::new(20, 0)).to_string(), "20.00");
    }

    #[test]
    fn zero_result_is_not_applied() {
        assert!(!DiscountResult::zero().is_applied());
        assert_eq!(DiscountResult::zero().discount.to_string(), "0.00");
    }

    #[test]
    fn to_money_uses_minor_units() -> TestResult {
        let result = DiscountResult {
            discount: Decimal::new(675, 2),
            eligible_items: vec!["A".to_string()],
            eligible_lines: vec![0],
        };

        assert_eq!(result.to_money(GBP)?, Money::from_minor(675, GBP));

        Ok(())
    }

    #[test]
    fn money_from_amount_overflow_errors() {
        assert_eq!(
            money_from_amount(Decimal::MAX, GBP),
            Err(DiscountError::AmountConversion(Decimal::MAX))
        );
    }
}
