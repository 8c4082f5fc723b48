//! Variant price/stock snapshots from the product catalog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::weight::{Weight, WeightUnit};

/// Price and stock snapshot for one purchasable variant.
///
/// Fetched from the product catalog collaborator and copied onto cart lines;
/// the cart never reads catalog storage directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSnapshot {
    /// Current unit price.
    pub price: Decimal,
    /// Discounted unit price; preferred over `price` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<Decimal>,
    /// Units in stock. Advisory ceiling only; the backend re-validates.
    pub stock: u32,
    /// Unit weight value, expressed in `weight_unit`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<Decimal>,
    /// Unit for `weight`.
    #[serde(default)]
    pub weight_unit: WeightUnit,
}

impl VariantSnapshot {
    /// The variant's unit weight, when the catalog reports one.
    #[must_use]
    pub fn unit_weight(&self) -> Option<Weight> {
        self.weight.map(|value| Weight::new(value, self.weight_unit))
    }
}
