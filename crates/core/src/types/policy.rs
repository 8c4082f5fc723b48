//! Shipping and payment policy records.
//!
//! These shapes are fetched from the shipping-method and payment-method
//! collaborators; the engine only consumes them, it never stores or edits
//! them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cost policy of one selected shipping method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingPolicy {
    /// Flat cost of the shipment. The first kilogram is included.
    pub base_cost: Decimal,
    /// Surcharge per kilogram beyond the first, for weight-based methods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_cost_per_kg: Option<Decimal>,
    /// Subtotal at or above which shipping is waived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_shipping_threshold: Option<Decimal>,
}

impl ShippingPolicy {
    /// A flat-cost method with no weight surcharge or free-shipping rule.
    #[must_use]
    pub const fn flat(base_cost: Decimal) -> Self {
        Self {
            base_cost,
            extra_cost_per_kg: None,
            free_shipping_threshold: None,
        }
    }
}

/// Commission policy of one payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPolicy {
    /// Percentage (0-100) applied to subtotal plus shipping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_percentage: Option<Decimal>,
}

impl PaymentPolicy {
    /// A method charging the given commission percentage.
    #[must_use]
    pub const fn with_commission(percentage: Decimal) -> Self {
        Self {
            commission_percentage: Some(percentage),
        }
    }
}
