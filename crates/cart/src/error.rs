//! Unified error handling for the cart engine.
//!
//! Advisory conditions (stock clamping, an edit dropped because another is in
//! flight, partial replay failure) are *not* errors; they are carried in
//! [`crate::updater::QuantityOutcome`] and [`crate::reconciler::ReconcileReport`].
//! Everything here is a genuine failure of an engine operation.

use thiserror::Error;

use campo_fresco_core::pricing::PricingError;
use campo_fresco_core::types::LineKey;

use crate::backend::BackendError;
use crate::catalog::CatalogError;

/// Engine-level error type.
#[derive(Debug, Error)]
pub enum CartError {
    /// Backend cart API operation failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Product catalog lookup failed.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// A line could not be priced. Fatal for checkout progression.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// The targeted line is not in the cart.
    #[error("no cart line with key {0}")]
    LineNotFound(LineKey),

    /// A reconciliation for this session is still completing.
    #[error("cart reconciliation already in progress")]
    ReconciliationInProgress,
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
