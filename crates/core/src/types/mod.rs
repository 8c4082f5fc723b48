//! Core types for Campo Fresco.
//!
//! This module provides type-safe wrappers for the cart domain concepts.

pub mod cart;
pub mod id;
pub mod policy;
pub mod snapshot;
pub mod weight;

pub use cart::{Cart, CartLine, CartOrigin, LineKey};
pub use id::*;
pub use policy::{PaymentPolicy, ShippingPolicy};
pub use snapshot::VariantSnapshot;
pub use weight::{Weight, WeightUnit};
