//! Fixed-point quantities and prices.
//!
//! Stock quantities carry three decimal places (`DECIMAL(10,3)`), unit prices
//! two. Values are validated on construction and kept rescaled so that their
//! textual form is stable (`5` is stored as `5.000`).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::InventoryError;

/// Decimal places kept for stock quantities and balances.
pub const QUANTITY_SCALE: u32 = 3;

/// Decimal places kept for unit prices.
pub const PRICE_SCALE: u32 = 2;

/// Largest magnitude a quantity or balance may take: `9999999.999`.
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, QUANTITY_SCALE);

/// A stock quantity with at most three decimal places and seven integer digits.
///
/// Sign is not restricted here: positivity is checked when an item is added to
/// a document and again by the ledger writer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Quantity(Decimal);

impl Quantity {
    pub fn new(value: Decimal) -> Result<Self, InventoryError> {
        if value.abs() > MAX_QUANTITY {
            return Err(InventoryError::InvalidQuantity(value));
        }
        rescaled(value, QUANTITY_SCALE)
            .map(Self)
            .ok_or(InventoryError::InvalidQuantity(value))
    }

    /// Whole units, e.g. `Quantity::units(5)` is `5.000`.
    pub fn units(value: i16) -> Self {
        let mut d = Decimal::from(value);
        d.rescale(QUANTITY_SCALE);
        Self(d)
    }

    pub fn value(self) -> Decimal {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl TryFrom<Decimal> for Quantity {
    type Error = InventoryError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Non-negative unit price with at most two decimal places.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct UnitPrice(Decimal);

impl UnitPrice {
    pub fn new(value: Decimal) -> Result<Self, InventoryError> {
        if value < Decimal::ZERO {
            return Err(InventoryError::InvalidUnitPrice(value));
        }
        rescaled(value, PRICE_SCALE)
            .map(Self)
            .ok_or(InventoryError::InvalidUnitPrice(value))
    }

    pub fn value(self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for UnitPrice {
    type Error = InventoryError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UnitPrice> for Decimal {
    fn from(value: UnitPrice) -> Self {
        value.0
    }
}

impl core::fmt::Display for UnitPrice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Rescale `value` to exactly `scale` places, refusing to drop significant digits.
pub(crate) fn rescaled(value: Decimal, scale: u32) -> Option<Decimal> {
    if value.normalize().scale() > scale {
        return None;
    }
    let mut out = value;
    out.rescale(scale);
    Some(out)
}
