//! Per-line quantity mutations.
//!
//! One quantity edit targets exactly one cart line, and at most one edit per
//! line may be in flight at a time. The lock table is checked synchronously
//! before anything is dispatched, so rapid repeated clicks collapse into a
//! single backend mutation instead of compounding into runaway quantities. A
//! rejected edit is a silent no-op; the UI reflects the eventual state.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, instrument, warn};

use campo_fresco_core::types::{CartOrigin, LineKey};

use crate::backend::{CartBackend, QuantityAction, UpdateQuantityRequest};
use crate::error::{CartError, Result};
use crate::store::CartStore;

/// Requested change to one line's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityEdit {
    /// Raise the quantity by a step (normally 1).
    Increment(u32),
    /// Lower the quantity by a step (normally 1).
    Decrement(u32),
    /// Assign an absolute quantity. Never additive with the current count.
    Set(u32),
}

/// What became of a quantity request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityOutcome {
    /// Applied as requested.
    Applied {
        /// The line's resulting quantity.
        quantity: u32,
    },
    /// The request exceeded the stock ceiling and was clamped down. The
    /// caller should tell the user the request was adjusted.
    Clamped {
        /// Quantity the edit asked for.
        requested: u32,
        /// Quantity actually applied.
        applied: u32,
    },
    /// Another mutation for this line is still in flight; dropped, not
    /// queued.
    RejectedInFlight,
    /// The edit would drive the quantity below one (or stock is exhausted).
    /// Use an explicit remove instead.
    RejectedBelowMinimum,
}

/// Applies quantity edits, serialized per line.
pub struct QuantityUpdater<B> {
    backend: Arc<B>,
    store: CartStore,
    in_flight: Mutex<HashSet<LineKey>>,
    debounce: Duration,
}

impl<B: CartBackend> QuantityUpdater<B> {
    /// Create an updater over the given backend and store.
    ///
    /// `debounce` delays the lock release after each edit to absorb
    /// duplicate rapid inputs; configuration caps it at 300 ms.
    #[must_use]
    pub fn new(backend: Arc<B>, store: CartStore, debounce: Duration) -> Self {
        Self {
            backend,
            store,
            in_flight: Mutex::new(HashSet::new()),
            debounce,
        }
    }

    /// Apply one quantity edit to the line with this key.
    ///
    /// The resulting quantity is clamped to `[1, available_stock]`; see
    /// [`QuantityOutcome`] for the advisory results.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if the key is not in the cart and
    /// [`CartError::Backend`] if the mutation fails on the wire.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn apply(&self, key: &LineKey, edit: QuantityEdit) -> Result<QuantityOutcome> {
        if !self.try_acquire(key) {
            debug!("quantity edit dropped: previous mutation still in flight");
            return Ok(QuantityOutcome::RejectedInFlight);
        }

        // The lock must be released on every path, including errors.
        let result = self.apply_locked(key, edit).await;
        self.release(key).await;
        result
    }

    async fn apply_locked(&self, key: &LineKey, edit: QuantityEdit) -> Result<QuantityOutcome> {
        let Some(line) = self.store.line(key).await else {
            return Err(CartError::LineNotFound(key.clone()));
        };

        let current = line.quantity;
        let requested = match edit {
            QuantityEdit::Increment(step) => current.saturating_add(step),
            QuantityEdit::Decrement(step) => current.saturating_sub(step),
            QuantityEdit::Set(target) => target,
        };

        let applied = match line.available_stock {
            Some(stock) => requested.min(stock),
            None => requested,
        };
        if applied == 0 {
            debug!("quantity edit rejected: would drop the line below one unit");
            return Ok(QuantityOutcome::RejectedBelowMinimum);
        }

        // Increment/decrement travel as steps; anything the clamp touched is
        // sent as an absolute set so the server lands on the same count.
        let request = match edit {
            QuantityEdit::Increment(step) if applied == requested => UpdateQuantityRequest {
                variant_id: key.variant.clone(),
                quantity: step,
                action: QuantityAction::Increment,
            },
            QuantityEdit::Decrement(step) if applied == requested => UpdateQuantityRequest {
                variant_id: key.variant.clone(),
                quantity: step,
                action: QuantityAction::Decrement,
            },
            _ => UpdateQuantityRequest {
                variant_id: key.variant.clone(),
                quantity: applied,
                action: QuantityAction::Set,
            },
        };

        // Anonymous carts are local-only; the backend is mirrored once the
        // session is server-backed.
        if self.store.origin().await == CartOrigin::Server {
            self.backend.update_quantity(&key.product, &request).await?;
        }
        self.store.set_line_quantity(key, applied).await;

        if applied < requested {
            warn!(requested, applied, "quantity clamped to available stock");
            Ok(QuantityOutcome::Clamped { requested, applied })
        } else {
            Ok(QuantityOutcome::Applied { quantity: applied })
        }
    }

    /// Reserve the key. Returns `false` if an edit is already in flight.
    fn try_acquire(&self, key: &LineKey) -> bool {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        in_flight.insert(key.clone())
    }

    /// Free the key after the optional debounce.
    async fn release(&self, key: &LineKey) {
        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        in_flight.remove(key);
    }
}
