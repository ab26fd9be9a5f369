//! Promotions
//!
//! A promo descriptor is the validated, active form of a promotional code:
//! its discount rate and, optionally, the allow-list of products it applies to.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

pub mod codes;

/// One entry of a promotion's allow-list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicableProduct {
    /// Product identifier this entry applies to.
    pub product_id: String,

    /// Upper bound on the discount given to a single line of this product.
    pub max_discount_amount: Option<Decimal>,
}

impl ApplicableProduct {
    /// Entry with no per-line cap.
    pub fn uncapped(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            max_discount_amount: None,
        }
    }

    /// Entry capped at `amount` per line.
    pub fn capped(product_id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            product_id: product_id.into(),
            max_discount_amount: Some(amount),
        }
    }

    /// The cap to enforce, if any. Negative caps are ignored.
    pub fn cap(&self) -> Option<Decimal> {
        self.max_discount_amount
            .filter(|amount| !amount.is_sign_negative() || amount.is_zero())
    }
}

/// Discount rate plus optional product restrictions for an applied promo code.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoCodeDescriptor {
    /// Percentage off, on a 0-100 scale.
    pub discount_percent: Decimal,

    /// Products the promotion is limited to. Empty means every product.
    pub applicable_products: Vec<ApplicableProduct>,
}

impl PromoCodeDescriptor {
    /// A promotion that applies to every product in the cart.
    pub fn unrestricted(discount_percent: Decimal) -> Self {
        Self {
            discount_percent,
            applicable_products: Vec::new(),
        }
    }

    /// A promotion limited to the listed products.
    pub fn restricted(
        discount_percent: Decimal,
        applicable_products: impl Into<Vec<ApplicableProduct>>,
    ) -> Self {
        Self {
            discount_percent,
            applicable_products: applicable_products.into(),
        }
    }

    /// Whether only listed products are eligible.
    pub fn is_restricted(&self) -> bool {
        !self.applicable_products.is_empty()
    }

    /// Find the first allow-list entry for `product_id`.
    pub fn find_applicable(&self, product_id: &str) -> Option<&ApplicableProduct> {
        self.applicable_products
            .iter()
            .find(|entry| entry.product_id.trim() == product_id)
    }

    /// Index the allow-list by trimmed identifier, keeping the first entry
    /// for each identifier.
    pub(crate) fn applicable_index(&self) -> FxHashMap<&str, &ApplicableProduct> {
        let mut index = FxHashMap::default();

        for entry in &self.applicable_products {
            index.entry(entry.product_id.trim()).or_insert(entry);
        }

        index
    }
}
