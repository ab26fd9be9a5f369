//! Rebate
//!
//! Rebate is a promo-code discount engine for storefront carts: it normalizes
//! loosely typed cart rows, validates promo codes and computes a consistent,
//! idempotent discount with per-product eligibility and caps.

pub mod cart;
pub mod discounts;
pub mod fixtures;
pub mod normalize;
pub mod prelude;
pub mod pricing;
pub mod promotions;
pub mod receipt;
