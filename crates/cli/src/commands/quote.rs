//! Quotation command.
//!
//! Prices a JSON array of cart lines against optional shipping and payment
//! policy files and prints the breakdown. Runs the exact same pricing
//! function the storefront surfaces use, so a quote here always matches what
//! checkout will show.

use std::path::Path;

use campo_fresco_core::pricing;
use campo_fresco_core::types::{CartLine, PaymentPolicy, ShippingPolicy};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Compute and print a cost breakdown.
pub fn run(
    cart_path: &Path,
    shipping_path: Option<&Path>,
    payment_path: Option<&Path>,
) -> Result<()> {
    let lines: Vec<CartLine> = read_json(cart_path)?;
    let shipping: Option<ShippingPolicy> = shipping_path.map(read_json).transpose()?;
    let payment: Option<PaymentPolicy> = payment_path.map(read_json).transpose()?;

    let breakdown = pricing::price(&lines, shipping.as_ref(), payment.as_ref())?;

    println!("{}", serde_json::to_string_pretty(&breakdown)?);
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
