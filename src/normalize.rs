//! Normalize
//!
//! Loosely typed cart and promotion payloads, and their conversion into the
//! canonical [`CartLineItem`] and [`PromoCodeDescriptor`] shapes.
//!
//! Storefront clients send the product identifier under `product`,
//! `productId` or `id`, and numbers either as numbers or as strings. Every
//! malformed number maps to the value that makes it inert: zero for prices,
//! quantities and rates, no cap for caps.

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use serde::{Deserialize, de::IgnoredAny};
use tracing::debug;

use crate::{
    cart::{Cart, CartLineItem},
    promotions::{ApplicableProduct, PromoCodeDescriptor},
};

/// A number as it arrives over the wire.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    /// Whole number
    Int(i64),

    /// Floating point number, possibly NaN or infinite
    Float(f64),

    /// Number encoded as text
    Text(String),

    /// Anything else (booleans, lists, maps); never a number
    Other(IgnoredAny),
}

impl RawNumber {
    /// Convert to a `Decimal`, or `None` if the value is not a finite number.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            RawNumber::Int(value) => Some(Decimal::from(*value)),
            RawNumber::Float(value) => Decimal::from_f64(*value),
            RawNumber::Text(text) => text.trim().parse::<Decimal>().ok(),
            RawNumber::Other(_) => None,
        }
    }

    /// Convert to a whole number, or `None` if the value is fractional or not a number.
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            RawNumber::Int(value) => Some(*value),
            RawNumber::Float(_) | RawNumber::Text(_) => {
                let value = self.to_decimal()?;

                if value.fract().is_zero() {
                    value.to_i64()
                } else {
                    None
                }
            }
            RawNumber::Other(_) => None,
        }
    }
}

impl From<i64> for RawNumber {
    fn from(value: i64) -> Self {
        RawNumber::Int(value)
    }
}

impl From<f64> for RawNumber {
    fn from(value: f64) -> Self {
        RawNumber::Float(value)
    }
}

impl From<&str> for RawNumber {
    fn from(value: &str) -> Self {
        RawNumber::Text(value.to_string())
    }
}

/// An identifier that may be sent as a string or a number.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawIdentifier {
    /// Text identifier
    Text(String),

    /// Numeric identifier
    Number(i64),

    /// Fractional numeric identifier
    Float(f64),

    /// Anything else; resolves to an empty identifier
    Other(IgnoredAny),
}

impl RawIdentifier {
    fn resolve(&self) -> String {
        match self {
            RawIdentifier::Text(text) => text.trim().to_string(),
            RawIdentifier::Number(number) => number.to_string(),
            RawIdentifier::Float(number) if number.is_finite() => number.to_string(),
            RawIdentifier::Float(_) | RawIdentifier::Other(_) => String::new(),
        }
    }
}

/// A cart row before identifier resolution.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCartLineItem {
    /// Identifier sent as `product`
    #[serde(default)]
    pub product: Option<RawIdentifier>,

    /// Identifier sent as `productId` or `product_id`
    #[serde(default, alias = "product_id")]
    pub product_id: Option<RawIdentifier>,

    /// Identifier sent as `id`
    #[serde(default)]
    pub id: Option<RawIdentifier>,

    /// Unit price, sent as `price` or `unitPrice`
    #[serde(default, alias = "unitPrice", alias = "unit_price")]
    pub price: Option<RawNumber>,

    /// Quantity
    #[serde(default)]
    pub quantity: Option<RawNumber>,
}

impl RawCartLineItem {
    /// The first non-empty identifier among `product`, `productId` and `id`.
    pub fn resolve_product_id(&self) -> Option<String> {
        [&self.product, &self.product_id, &self.id]
            .into_iter()
            .flatten()
            .map(RawIdentifier::resolve)
            .find(|id| !id.is_empty())
    }

    /// Resolve to a canonical line item, or `None` if no identifier is present.
    pub fn normalize(&self) -> Option<CartLineItem> {
        let product_id = self.resolve_product_id()?;

        let unit_price = self
            .price
            .as_ref()
            .and_then(RawNumber::to_decimal)
            .unwrap_or_default();

        let quantity = self
            .quantity
            .as_ref()
            .and_then(RawNumber::to_integer)
            .unwrap_or_default();

        Some(CartLineItem::new(product_id, unit_price, quantity))
    }
}

/// Resolve raw rows into a cart, dropping rows with no usable identifier.
pub fn normalize_cart(rows: &[RawCartLineItem]) -> Cart {
    let items: Vec<CartLineItem> = rows
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| {
            let item = row.normalize();

            if item.is_none() {
                debug!(row = idx, "dropping cart row with no product identifier");
            }

            item
        })
        .collect();

    Cart::with_items(items)
}

/// An allow-list entry before normalization.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawApplicableProduct {
    /// Product identifier, sent as `productId`, `product_id` or `product`
    #[serde(default, alias = "product_id", alias = "product")]
    pub product_id: Option<RawIdentifier>,

    /// Per-line cap, sent as `maxDiscountAmount` or `max_discount_amount`
    #[serde(default, alias = "max_discount_amount")]
    pub max_discount_amount: Option<RawNumber>,
}

impl RawApplicableProduct {
    /// Normalize the entry.
    ///
    /// An entry without an identifier is kept with an empty one: it still
    /// makes the promotion restricted, but matches no cart line.
    pub fn normalize(&self) -> ApplicableProduct {
        let product_id = self
            .product_id
            .as_ref()
            .map(RawIdentifier::resolve)
            .unwrap_or_default();

        let max_discount_amount = self
            .max_discount_amount
            .as_ref()
            .and_then(RawNumber::to_decimal)
            .filter(|amount| !amount.is_sign_negative() || amount.is_zero());

        ApplicableProduct {
            product_id,
            max_discount_amount,
        }
    }
}

/// A promo descriptor before normalization.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPromoCodeDescriptor {
    /// Discount rate, sent as `discountPercent` or `discount_percent`
    #[serde(default, alias = "discount_percent")]
    pub discount_percent: Option<RawNumber>,

    /// Allow-list entries, sent as `applicableProducts` or `applicable_products`
    #[serde(default, alias = "applicable_products")]
    pub applicable_products: Vec<RawApplicableProduct>,
}

impl RawPromoCodeDescriptor {
    /// Normalize into a descriptor. A missing or malformed rate becomes zero.
    pub fn normalize(&self) -> PromoCodeDescriptor {
        let discount_percent = self
            .discount_percent
            .as_ref()
            .and_then(RawNumber::to_decimal)
            .unwrap_or_default();

        let applicable_products = self
            .applicable_products
            .iter()
            .map(RawApplicableProduct::normalize)
            .collect::<Vec<_>>();

        PromoCodeDescriptor::restricted(discount_percent, applicable_products)
    }
}
