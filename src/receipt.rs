//! Receipt

use std::io;

use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::Cart,
    discounts::{DiscountError, money_from_amount},
    pricing::OrderPricing,
};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// An amount could not be shown as money.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// A priced order ready to be rendered.
#[derive(Debug)]
pub struct Receipt<'a> {
    cart: &'a Cart,
    pricing: &'a OrderPricing,
    currency: &'static Currency,
}

impl<'a> Receipt<'a> {
    /// Create a receipt for a cart and its pricing.
    pub fn new(cart: &'a Cart, pricing: &'a OrderPricing, currency: &'static Currency) -> Self {
        Self {
            cart,
            pricing,
            currency,
        }
    }

    /// Write the receipt table and totals.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if an amount cannot be converted or writing fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(["Product", "Unit Price", "Qty", "Line Total", "Promo"]);

        for (idx, item) in self.cart.iter().enumerate() {
            let line_total = item.subtotal().unwrap_or(Decimal::ZERO);
            let promo = if self.pricing.is_line_eligible(idx) {
                "✓"
            } else {
                ""
            };

            builder.push_record([
                item.product_id().to_string(),
                self.money(item.unit_price())?,
                item.quantity().to_string(),
                self.money(line_total)?,
                promo.to_string(),
            ]);
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(
            1,
            HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
        );

        table.with(theme);
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(1..4), Alignment::right());

        writeln!(out, "\n{table}").map_err(|_err| ReceiptError::IO)?;

        self.write_summary(&mut out)
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let discount_label = match &self.pricing.promo_code {
            Some(code) => format!("Discount ({code}, {}%):", self.pricing.discount_percent),
            None => "Discount:".to_string(),
        };

        let lines = [
            ("Subtotal:".to_string(), self.money(self.pricing.subtotal)?),
            (discount_label, format!("-{}", self.money(self.pricing.discount)?)),
            ("Total:".to_string(), self.money(self.pricing.total)?),
        ];

        let label_width = lines.iter().map(|(label, _)| label.chars().count()).max();
        let value_width = lines.iter().map(|(_, value)| value.chars().count()).max();

        for (label, value) in &lines {
            writeln!(
                out,
                " {label:<label_width$} {value:>value_width$}",
                label_width = label_width.unwrap_or_default(),
                value_width = value_width.unwrap_or_default(),
            )
            .map_err(|_err| ReceiptError::IO)?;
        }

        writeln!(out).map_err(|_err| ReceiptError::IO)
    }

    fn money(&self, amount: Decimal) -> Result<String, ReceiptError> {
        Ok(money_from_amount(amount, self.currency)?.to_string())
    }
}
