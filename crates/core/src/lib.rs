//! Campo Fresco Core - Shared domain types and pricing.
//!
//! This crate provides the cart domain model and the pricing engine used by
//! every Campo Fresco component:
//! - `cart` - The cart engine (store, reconciler, quantity updater)
//! - `cli` - Command-line tools for cart inspection and quoting
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async. Every surface that displays a total calls
//! [`pricing::price`] with the same three inputs; the breakdown is never
//! computed anywhere else.
//!
//! # Modules
//!
//! - [`types`] - Cart lines, policies, weights, and type-safe IDs
//! - [`pricing`] - The cost breakdown computation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::{CostBreakdown, PricingError, price};
pub use types::*;
