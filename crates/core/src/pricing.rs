//! Cost breakdown computation.
//!
//! The single pricing path for every surface that displays a total. Cart
//! summary, shipping step, payment step and quotation summary all call
//! [`price`] with the same three inputs; none of them derives subtotal,
//! shipping or commission on its own.
//!
//! The computation is pure: identical inputs always produce an identical
//! [`CostBreakdown`], independent of call order or call site.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CartLine, LineKey, PaymentPolicy, ShippingPolicy};

/// Derived cost breakdown for a cart.
///
/// Never persisted; recomputed on demand from the cart lines and the selected
/// policies. `total` is always the sum of the other three fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    /// Sum of effective unit price times quantity over all lines.
    pub subtotal: Decimal,
    /// Cost of the selected shipping method, zero before one is chosen.
    pub shipping_cost: Decimal,
    /// Payment-method commission on subtotal plus shipping.
    pub payment_commission: Decimal,
    /// `subtotal + shipping_cost + payment_commission`.
    pub total: Decimal,
}

/// Pricing failures. All of them block checkout progression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// A line has neither a discounted nor a regular unit price. This is a
    /// data error: the cart must not be silently priced at zero.
    #[error("no usable price for line {key}")]
    MissingPrice {
        /// The unpriceable line.
        key: LineKey,
    },
}

/// Compute the cost breakdown for a set of cart lines.
///
/// - No shipping policy means the shopper has not reached the shipping step
///   yet; shipping cost is zero.
/// - A free-shipping threshold waives shipping when `subtotal >= threshold`.
/// - Weight-based methods bill `base_cost` for the first kilogram and
///   `extra_cost_per_kg` for every kilogram beyond it.
/// - Commission applies to subtotal plus shipping.
///
/// # Errors
///
/// Returns [`PricingError::MissingPrice`] if any line carries no usable
/// price.
pub fn price(
    lines: &[CartLine],
    shipping: Option<&ShippingPolicy>,
    payment: Option<&PaymentPolicy>,
) -> Result<CostBreakdown, PricingError> {
    let mut subtotal = Decimal::ZERO;
    for line in lines {
        let unit = line
            .effective_unit_price()
            .ok_or_else(|| PricingError::MissingPrice { key: line.key() })?;
        subtotal += unit * Decimal::from(line.quantity);
    }

    let shipping_cost = shipping.map_or(Decimal::ZERO, |policy| {
        shipping_cost(subtotal, lines, policy)
    });

    let payment_commission = payment
        .and_then(|policy| policy.commission_percentage)
        .map_or(Decimal::ZERO, |percentage| {
            (subtotal + shipping_cost) * percentage / Decimal::ONE_HUNDRED
        });

    Ok(CostBreakdown {
        subtotal,
        shipping_cost,
        payment_commission,
        total: subtotal + shipping_cost + payment_commission,
    })
}

fn shipping_cost(subtotal: Decimal, lines: &[CartLine], policy: &ShippingPolicy) -> Decimal {
    if let Some(threshold) = policy.free_shipping_threshold
        && subtotal >= threshold
    {
        return Decimal::ZERO;
    }

    match policy.extra_cost_per_kg {
        Some(per_kg) => {
            // The first kilogram rides inside base_cost.
            let billable_kg = (total_weight_kg(lines) - Decimal::ONE).max(Decimal::ZERO);
            policy.base_cost + billable_kg * per_kg
        }
        None => policy.base_cost,
    }
}

fn total_weight_kg(lines: &[CartLine]) -> Decimal {
    lines
        .iter()
        .filter_map(|line| {
            line.unit_weight
                .map(|weight| weight.as_kilograms() * Decimal::from(line.quantity))
        })
        .sum()
}
