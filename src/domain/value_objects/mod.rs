//! Value Objects for the marketplace

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

/// Non-negative price or amount with at most two decimal places, bounded
/// by what a `NUMERIC(12, 2)` column holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const SCALE: u32 = 2;

    /// 9 999 999 999.99
    pub fn max() -> Decimal { Decimal::new(999_999_999_999, 2) }

    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount < Decimal::ZERO { return Err(MoneyError::Negative); }
        if amount.normalize().scale() > Self::SCALE { return Err(MoneyError::TooPrecise); }
        if amount > Self::max() { return Err(MoneyError::TooLarge); }
        Ok(Self(amount))
    }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn add(&self, other: &Money) -> Money { Money(self.0 + other.0) }
    pub fn multiply(&self, qty: Quantity) -> Money { Money(self.0 * Decimal::from(qty.value())) }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;
    fn try_from(amount: Decimal) -> Result<Self, Self::Error> { Self::new(amount) }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self { money.0 }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum MoneyError { Negative, TooPrecise, TooLarge }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative => write!(f, "amount must not be negative"),
            Self::TooPrecise => write!(f, "amount must have at most {} decimal places", Money::SCALE),
            Self::TooLarge => write!(f, "amount must not exceed {}", Money::max()),
        }
    }
}

/// Stock or line-item quantity. Never negative by construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: Quantity) -> Self { Self(self.0.saturating_add(other.0)) }
    pub fn subtract(&self, other: Quantity) -> Option<Self> {
        if other.0 > self.0 { None } else { Some(Self(self.0 - other.0)) }
    }
    pub fn covers(&self, requested: Quantity) -> bool { self.0 >= requested.0 }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
}

impl Quantity {
    /// Largest stock a listing may hold; stock lives in a 32-bit signed column.
    pub const MAX_STOCK: u32 = i32::MAX as u32;
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Where an order is delivered. All three parts are required.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DeliveryAddress {
    #[validate(custom = "not_blank")]
    pub street: String,
    #[validate(custom = "not_blank")]
    pub city: String,
    #[validate(custom = "not_blank")]
    pub pincode: String,
}

pub(crate) fn within_stock_limit(value: &Quantity) -> Result<(), ValidationError> {
    if value.value() > Quantity::MAX_STOCK {
        return Err(ValidationError::new("stock_too_large"));
    }
    Ok(())
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_rejects_negative() {
        assert_eq!(Money::new(Decimal::new(-1, 0)), Err(MoneyError::Negative));
        assert!(Money::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_money_rejects_sub_cent_and_oversized_amounts() {
        assert_eq!(Money::new(Decimal::new(10005, 3)), Err(MoneyError::TooPrecise));
        assert!(Money::new(Decimal::new(10500, 3)).is_ok());
        assert_eq!(Money::new(Decimal::new(10_000_000_000, 0)), Err(MoneyError::TooLarge));
        assert!(Money::new(Money::max()).is_ok());

        let parsed: Result<Money, _> = serde_json::from_str("10.005");
        assert!(parsed.is_err());
        let parsed: Money = serde_json::from_str("10.05").unwrap();
        assert_eq!(parsed.amount(), Decimal::new(1005, 2));
    }

    #[test]
    fn test_stock_limit() {
        assert!(within_stock_limit(&Quantity::new(Quantity::MAX_STOCK)).is_ok());
        assert!(within_stock_limit(&Quantity::new(3_000_000_000)).is_err());
    }

    #[test]
    fn test_money_multiply() {
        let price = Money::new(Decimal::new(2550, 2)).unwrap();
        assert_eq!(price.multiply(Quantity::new(3)).amount(), Decimal::new(7650, 2));
    }

    #[test]
    fn test_quantity_subtract() {
        let q = Quantity::new(10);
        assert_eq!(q.subtract(Quantity::new(7)), Some(Quantity::new(3)));
        assert_eq!(q.subtract(Quantity::new(11)), None);
        assert!(q.covers(Quantity::new(10)));
    }

    #[test]
    fn test_address_requires_all_parts() {
        let address = DeliveryAddress { street: "12 Mill Lane".into(), city: "Pune".into(), pincode: "  ".into() };
        let errors = address.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("pincode"));
    }
}
