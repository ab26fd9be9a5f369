//! Rebate prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartLineItem},
    discounts::{DiscountError, DiscountResult, calculate, round_currency},
    fixtures::{Fixture, FixtureError},
    normalize::{RawCartLineItem, RawPromoCodeDescriptor, normalize_cart},
    pricing::{OrderPricing, PricingError, price_order},
    promotions::{
        ApplicableProduct, PromoCodeDescriptor,
        codes::{PromoCatalog, PromoCode, PromoCodeError},
    },
    receipt::{Receipt, ReceiptError},
};
