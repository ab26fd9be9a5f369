//! Fixtures
//!
//! YAML fixture sets: a cart under `carts/<name>.yml` and promo codes under
//! `promotions/<name>.yml`, both relative to a base directory.

use std::{fs, path::PathBuf};

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    cart::Cart,
    normalize::{RawCartLineItem, RawPromoCodeDescriptor, normalize_cart},
    promotions::codes::{PromoCatalog, PromoCode},
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid expiry timestamp
    #[error("Invalid timestamp for promo code {code}: {value}")]
    InvalidTimestamp {
        /// Promo code the timestamp belongs to
        code: String,
        /// Value as written in the fixture
        value: String,
    },
}

/// Wrapper for cart rows in YAML
#[derive(Debug, Deserialize)]
pub struct CartFixture {
    /// Cart rows, in order
    pub items: Vec<RawCartLineItem>,
}

/// Wrapper for promo codes in YAML
#[derive(Debug, Deserialize)]
pub struct PromotionsFixture {
    /// Map of code -> promo code fixture
    pub promotions: FxHashMap<String, PromoCodeFixture>,
}

/// Promo Code Fixture
#[derive(Debug, Deserialize)]
pub struct PromoCodeFixture {
    /// Discount rate and allow-list
    #[serde(flatten)]
    pub descriptor: RawPromoCodeDescriptor,

    /// Whether the code is switched on
    #[serde(default = "active_by_default")]
    pub is_active: bool,

    /// Expiry as an RFC 3339 timestamp (e.g., "2026-12-31T23:59:59Z")
    #[serde(default)]
    pub expires_at: Option<String>,

    /// Maximum number of redemptions
    #[serde(default)]
    pub usage_limit: Option<u32>,

    /// Redemptions so far
    #[serde(default)]
    pub usage_count: u32,
}

fn active_by_default() -> bool {
    true
}

impl PromoCodeFixture {
    /// Convert into a [`PromoCode`] named `code`.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::InvalidTimestamp`] if `expires_at` is not a valid timestamp.
    pub fn try_into_promo_code(self, code: String) -> Result<PromoCode, FixtureError> {
        let expires_at = self
            .expires_at
            .map(|value| {
                value
                    .parse::<Timestamp>()
                    .map_err(|_err| FixtureError::InvalidTimestamp {
                        code: code.clone(),
                        value,
                    })
            })
            .transpose()?;

        let descriptor = self.descriptor.normalize();

        Ok(PromoCode {
            code,
            discount_percent: descriptor.discount_percent,
            applicable_products: descriptor.applicable_products,
            is_active: self.is_active,
            expires_at,
            usage_limit: self.usage_limit,
            usage_count: self.usage_count,
        })
    }
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Loaded cart
    cart: Cart,

    /// Loaded promo codes
    catalog: PromoCatalog,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            cart: Cart::default(),
            catalog: PromoCatalog::default(),
        }
    }

    /// Load a cart from a YAML fixture file, replacing any loaded cart
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_cart(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("carts").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: CartFixture = serde_norway::from_str(&contents)?;

        self.cart = normalize_cart(&fixture.items);

        Ok(self)
    }

    /// Load promo codes from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a timestamp is invalid.
    pub fn load_promotions(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self
            .base_path
            .join("promotions")
            .join(format!("{name}.yml"));

        let contents = fs::read_to_string(&file_path)?;
        let fixture: PromotionsFixture = serde_norway::from_str(&contents)?;

        let mut codes = fixture
            .promotions
            .into_iter()
            .map(|(code, promo)| promo.try_into_promo_code(code))
            .collect::<Result<Vec<_>, _>>()?;

        // Map iteration order is unspecified.
        codes.sort_by(|a, b| a.code.cmp(&b.code));

        for code in codes {
            self.catalog.insert(code);
        }

        Ok(self)
    }

    /// Load a complete fixture set (cart and promotions with the same name) from a base path
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set_in(base_path: impl Into<PathBuf>, name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::with_base_path(base_path);

        fixture.load_cart(name)?.load_promotions(name)?;

        Ok(fixture)
    }

    /// Load a complete fixture set from the default base path
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_set_in("./fixtures", name)
    }

    /// The loaded cart
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The loaded promo codes
    pub fn catalog(&self) -> &PromoCatalog {
        &self.catalog
    }
}
