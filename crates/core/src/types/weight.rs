//! Physical weight values used for shipping surcharges.
//!
//! The catalog reports variant weights in grams or kilograms; shipping math
//! always runs in kilograms, so [`Weight::as_kilograms`] is the only way the
//! value is consumed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unit a variant weight is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WeightUnit {
    /// Grams.
    #[serde(rename = "g")]
    Grams,
    /// Kilograms.
    #[default]
    #[serde(rename = "kg")]
    Kilograms,
}

/// A weight value with its unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weight {
    /// Magnitude in `unit`.
    pub value: Decimal,
    /// Unit of `value`.
    pub unit: WeightUnit,
}

impl Weight {
    /// Create a weight from a value and unit.
    #[must_use]
    pub const fn new(value: Decimal, unit: WeightUnit) -> Self {
        Self { value, unit }
    }

    /// Create a weight in grams.
    #[must_use]
    pub const fn grams(value: Decimal) -> Self {
        Self::new(value, WeightUnit::Grams)
    }

    /// Create a weight in kilograms.
    #[must_use]
    pub const fn kilograms(value: Decimal) -> Self {
        Self::new(value, WeightUnit::Kilograms)
    }

    /// Normalize to kilograms (grams divided by 1000).
    #[must_use]
    pub fn as_kilograms(&self) -> Decimal {
        match self.unit {
            WeightUnit::Kilograms => self.value,
            WeightUnit::Grams => self.value / Decimal::from(1000),
        }
    }
}
