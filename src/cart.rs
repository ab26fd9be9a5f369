//! Cart

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Errors related to cart totals.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// A line subtotal or the running cart subtotal did not fit in a `Decimal`.
    #[error("cart subtotal overflowed at line {0}")]
    Overflow(usize),
}

/// A single cart line, already resolved to one canonical product identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartLineItem {
    product_id: String,
    unit_price: Decimal,
    quantity: i64,
}

impl CartLineItem {
    /// Creates a new line item.
    pub fn new(product_id: impl Into<String>, unit_price: Decimal, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            unit_price,
            quantity,
        }
    }

    /// Returns the product identifier as given.
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// Returns the unit price.
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Returns the quantity.
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Whether the line can carry value: both price and quantity are non-zero.
    pub fn is_priced(&self) -> bool {
        !self.unit_price.is_zero() && self.quantity != 0
    }

    /// Unit price multiplied by quantity, or `None` on overflow.
    pub fn subtotal(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Immutable snapshot of a cart's line items, in the order they were added.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// Create a cart from line items.
    pub fn with_items(items: impl Into<Vec<CartLineItem>>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Line items in input order.
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Iterate over the line items.
    pub fn iter(&self) -> impl Iterator<Item = &CartLineItem> {
        self.items.iter()
    }

    /// Get the number of line items in the cart.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Calculate the subtotal of the cart.
    ///
    /// Lines with a non-positive price or quantity are left out, matching the
    /// lines the discount calculator is willing to look at.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Overflow`] if a line or the running total overflows.
    pub fn subtotal(&self) -> Result<Decimal, CartError> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.unit_price > Decimal::ZERO && item.quantity > 0)
            .try_fold(Decimal::ZERO, |acc, (idx, item)| {
                item.subtotal()
                    .and_then(|line| acc.checked_add(line))
                    .ok_or(CartError::Overflow(idx))
            })
    }
}

impl From<Vec<CartLineItem>> for Cart {
    fn from(items: Vec<CartLineItem>) -> Self {
        Self::with_items(items)
    }
}
