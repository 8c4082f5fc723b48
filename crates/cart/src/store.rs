//! Session cart store.
//!
//! Single owner of the session's cart lines. Every consumer holds a clone of
//! the same store; there is no module-level cart and no surface mutates lines
//! directly - edits go through [`crate::updater::QuantityUpdater`] and
//! reconciliation through [`crate::reconciler::CartReconciler`].

use std::sync::Arc;

use tokio::sync::RwLock;

use campo_fresco_core::pricing::{self, CostBreakdown, PricingError};
use campo_fresco_core::types::{
    Cart, CartLine, CartOrigin, LineKey, PaymentPolicy, ShippingPolicy, VariantSnapshot,
};

/// Authoritative holder of the session's cart.
///
/// Cheaply cloneable via `Arc`; clones share the same underlying cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<RwLock<Cart>>,
}

impl CartStore {
    /// Create a store around an existing cart.
    #[must_use]
    pub fn new(cart: Cart) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cart)),
        }
    }

    /// Create a store holding an empty local cart (anonymous session).
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Cart::new(CartOrigin::Local))
    }

    /// A point-in-time copy of the whole cart.
    pub async fn snapshot(&self) -> Cart {
        self.inner.read().await.clone()
    }

    /// A point-in-time copy of the lines.
    pub async fn lines(&self) -> Vec<CartLine> {
        self.inner.read().await.lines().to_vec()
    }

    /// Look up one line by key.
    pub async fn line(&self, key: &LineKey) -> Option<CartLine> {
        self.inner.read().await.line(key).cloned()
    }

    /// The cart's provenance tag.
    pub async fn origin(&self) -> CartOrigin {
        self.inner.read().await.origin
    }

    /// Add a line, accumulating quantity on an existing key.
    pub async fn add_line(&self, line: CartLine) {
        self.inner.write().await.add(line);
    }

    /// Set one line's quantity in place. Returns `false` if the key is absent.
    pub async fn set_line_quantity(&self, key: &LineKey, quantity: u32) -> bool {
        self.inner.write().await.set_quantity(key, quantity)
    }

    /// Remove one line. Returns `false` if the key is absent.
    pub async fn remove_line(&self, key: &LineKey) -> bool {
        self.inner.write().await.remove(key)
    }

    /// Apply a catalog snapshot to one line. Returns `false` if absent.
    pub async fn apply_snapshot(&self, key: &LineKey, snapshot: &VariantSnapshot) -> bool {
        self.inner.write().await.apply_snapshot(key, snapshot)
    }

    /// Install a different cart wholesale (reconciliation result).
    pub async fn replace(&self, cart: Cart) {
        *self.inner.write().await = cart;
    }

    /// Empty the cart (order completion).
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    /// Whether the cart has no lines.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Cost breakdown for the current lines and the given policies.
    ///
    /// Delegates to the single pricing function; the store never derives
    /// totals on its own.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::MissingPrice`] if any line has no usable
    /// price.
    pub async fn breakdown(
        &self,
        shipping: Option<&ShippingPolicy>,
        payment: Option<&PaymentPolicy>,
    ) -> Result<CostBreakdown, PricingError> {
        pricing::price(self.inner.read().await.lines(), shipping, payment)
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::empty()
    }
}
