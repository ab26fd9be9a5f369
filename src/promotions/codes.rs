//! Promo Codes
//!
//! Stored promo codes and the checks that turn one into a [`PromoCodeDescriptor`].

use jiff::Timestamp;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::promotions::{ApplicableProduct, PromoCodeDescriptor};

/// Reasons a promo code cannot be applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromoCodeError {
    /// No code with this name exists.
    #[error("promo code not found: {0}")]
    NotFound(String),

    /// The code exists but has been switched off.
    #[error("promo code {0} is not active")]
    Inactive(String),

    /// The code's expiry time has passed.
    #[error("promo code {code} expired at {expired_at}")]
    Expired {
        /// Promo code
        code: String,
        /// When it stopped being valid
        expired_at: Timestamp,
    },

    /// The code has been redeemed as many times as allowed.
    #[error("promo code {code} has reached its usage limit of {limit}")]
    UsageLimitReached {
        /// Promo code
        code: String,
        /// Maximum number of redemptions
        limit: u32,
    },
}

/// A promo code as stored by the shop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromoCode {
    /// Code customers type in
    pub code: String,

    /// Percentage off, on a 0-100 scale
    pub discount_percent: Decimal,

    /// Allow-list of products; empty applies to all products
    pub applicable_products: Vec<ApplicableProduct>,

    /// Whether the code is switched on
    pub is_active: bool,

    /// When the code stops being valid
    pub expires_at: Option<Timestamp>,

    /// Maximum number of redemptions
    pub usage_limit: Option<u32>,

    /// Redemptions so far
    pub usage_count: u32,
}

impl PromoCode {
    /// An active, unlimited, never-expiring code.
    pub fn new(code: impl Into<String>, descriptor: PromoCodeDescriptor) -> Self {
        Self {
            code: code.into(),
            discount_percent: descriptor.discount_percent,
            applicable_products: descriptor.applicable_products,
            is_active: true,
            expires_at: None,
            usage_limit: None,
            usage_count: 0,
        }
    }

    /// Case-insensitive comparison against user input, ignoring surrounding whitespace.
    pub fn matches(&self, input: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(input.trim())
    }

    /// Check the code can be redeemed at `now` and return its descriptor.
    ///
    /// # Errors
    ///
    /// - [`PromoCodeError::Inactive`]: the code is switched off.
    /// - [`PromoCodeError::Expired`]: `now` is at or past `expires_at`.
    /// - [`PromoCodeError::UsageLimitReached`]: `usage_count` has reached `usage_limit`.
    pub fn validate(&self, now: Timestamp) -> Result<PromoCodeDescriptor, PromoCodeError> {
        if !self.is_active {
            return Err(PromoCodeError::Inactive(self.code.clone()));
        }

        if let Some(expired_at) = self.expires_at
            && now >= expired_at
        {
            return Err(PromoCodeError::Expired {
                code: self.code.clone(),
                expired_at,
            });
        }

        if let Some(limit) = self.usage_limit
            && self.usage_count >= limit
        {
            return Err(PromoCodeError::UsageLimitReached {
                code: self.code.clone(),
                limit,
            });
        }

        Ok(self.descriptor())
    }

    /// The discount part of the code, without any validity checks.
    pub fn descriptor(&self) -> PromoCodeDescriptor {
        PromoCodeDescriptor {
            discount_percent: self.discount_percent,
            applicable_products: self.applicable_products.clone(),
        }
    }
}

/// The set of promo codes known to the shop.
#[derive(Clone, Debug, Default)]
pub struct PromoCatalog {
    codes: Vec<PromoCode>,
}

impl PromoCatalog {
    /// Create a catalog from codes.
    pub fn with_codes(codes: impl Into<Vec<PromoCode>>) -> Self {
        Self {
            codes: codes.into(),
        }
    }

    /// Add a code to the catalog.
    pub fn insert(&mut self, code: PromoCode) {
        self.codes.push(code);
    }

    /// Iterate over the codes.
    pub fn iter(&self) -> impl Iterator<Item = &PromoCode> {
        self.codes.iter()
    }

    /// Number of codes in the catalog.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the catalog holds no codes.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Look up a code by user input.
    ///
    /// # Errors
    ///
    /// Returns [`PromoCodeError::NotFound`] if no code matches.
    pub fn find(&self, input: &str) -> Result<&PromoCode, PromoCodeError> {
        self.codes
            .iter()
            .find(|code| code.matches(input))
            .ok_or_else(|| PromoCodeError::NotFound(input.trim().to_string()))
    }

    /// Look up a code and validate it at `now`.
    ///
    /// # Errors
    ///
    /// Returns any [`PromoCodeError`] from lookup or validation.
    pub fn redeem(&self, input: &str, now: Timestamp) -> Result<PromoCodeDescriptor, PromoCodeError> {
        self.find(input)?.validate(now)
    }
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, Timestamp};
    use testresult::TestResult;

    use super::*;

    fn summer() -> PromoCode {
        PromoCode::new("SUMMER10", PromoCodeDescriptor::unrestricted(Decimal::TEN))
    }

    #[test]
    fn matches_ignores_case_and_whitespace() {
        let code = summer();

        assert!(code.matches("  summer10 "));
        assert!(!code.matches("SUMMER"));
    }

    #[test]
    fn validate_active_code_returns_descriptor() -> TestResult {
        let descriptor = summer().validate(Timestamp::UNIX_EPOCH)?;

        assert_eq!(descriptor, PromoCodeDescriptor::unrestricted(Decimal::TEN));

        Ok(())
    }

    #[test]
    fn validate_inactive_code_errors() {
        let code = PromoCode {
            is_active: false,
            ..summer()
        };

        assert_eq!(
            code.validate(Timestamp::UNIX_EPOCH),
            Err(PromoCodeError::Inactive("SUMMER10".to_string()))
        );
    }

    #[test]
    fn validate_expired_code_errors() -> TestResult {
        let expired_at = Timestamp::UNIX_EPOCH;
        let code = PromoCode {
            expires_at: Some(expired_at),
            ..summer()
        };

        let now = expired_at.checked_add(SignedDuration::from_secs(1))?;

        assert_eq!(
            code.validate(now),
            Err(PromoCodeError::Expired {
                code: "SUMMER10".to_string(),
                expired_at,
            })
        );

        Ok(())
    }

    #[test]
    fn validate_before_expiry_succeeds() -> TestResult {
        let expires_at = Timestamp::UNIX_EPOCH.checked_add(SignedDuration::from_hours(1))?;
        let code = PromoCode {
            expires_at: Some(expires_at),
            ..summer()
        };

        assert!(code.validate(Timestamp::UNIX_EPOCH).is_ok());

        Ok(())
    }

    #[test]
    fn validate_usage_limit_reached_errors() {
        let code = PromoCode {
            usage_limit: Some(3),
            usage_count: 3,
            ..summer()
        };

        assert_eq!(
            code.validate(Timestamp::UNIX_EPOCH),
            Err(PromoCodeError::UsageLimitReached {
                code: "SUMMER10".to_string(),
                limit: 3,
            })
        );
    }

    #[test]
    fn catalog_find_and_redeem() -> TestResult {
        let catalog = PromoCatalog::with_codes([summer()]);

        assert_eq!(catalog.find("summer10")?.code, "SUMMER10");
        assert_eq!(
            catalog.redeem("summer10", Timestamp::UNIX_EPOCH)?.discount_percent,
            Decimal::TEN
        );

        Ok(())
    }

    #[test]
    fn catalog_missing_code_errors() {
        let catalog = PromoCatalog::default();

        assert_eq!(
            catalog.find(" WINTER "),
            Err(PromoCodeError::NotFound("WINTER".to_string()))
        );
    }
}
