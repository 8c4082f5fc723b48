//! Engine wiring shared across checkout surfaces.
//!
//! One handle owns the store, the updater, the reconciler and the two
//! collaborator clients. Surfaces clone the handle; they never hold cart
//! state of their own, and every displayed total comes out of the same
//! pricing call.

use std::sync::Arc;
use std::time::Duration;

use tracing::{instrument, warn};

use campo_fresco_core::pricing::CostBreakdown;
use campo_fresco_core::types::{CartLine, CartOrigin, LineKey, PaymentPolicy, ShippingPolicy};

use crate::backend::{AddLineRequest, CartBackend, HttpCartBackend};
use crate::catalog::{HttpCatalog, ProductCatalog};
use crate::config::EngineConfig;
use crate::error::{CartError, Result};
use crate::reconciler::{CartReconciler, ReconcileReport};
use crate::store::CartStore;
use crate::updater::{QuantityEdit, QuantityOutcome, QuantityUpdater};

/// The cart engine behind every checkout surface.
///
/// Cheaply cloneable; clones share the same store and lock tables. Generic
/// over the backend and catalog seams so tests can run it against in-memory
/// collaborators.
pub struct CartEngine<B, C> {
    inner: Arc<EngineInner<B, C>>,
}

impl<B, C> Clone for CartEngine<B, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct EngineInner<B, C> {
    backend: Arc<B>,
    catalog: C,
    store: CartStore,
    updater: QuantityUpdater<B>,
    reconciler: CartReconciler<B>,
}

impl CartEngine<HttpCartBackend, HttpCatalog> {
    /// Build the production engine from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client fails to build.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let backend = HttpCartBackend::new(config)?;
        let catalog = HttpCatalog::new(config)?;
        Ok(Self::new(backend, catalog, config.quantity_debounce))
    }
}

impl<B: CartBackend, C: ProductCatalog> CartEngine<B, C> {
    /// Wire an engine over the given collaborators, starting from an empty
    /// local cart.
    #[must_use]
    pub fn new(backend: B, catalog: C, quantity_debounce: Duration) -> Self {
        let backend = Arc::new(backend);
        let store = CartStore::empty();
        let updater = QuantityUpdater::new(Arc::clone(&backend), store.clone(), quantity_debounce);
        let reconciler = CartReconciler::new(Arc::clone(&backend), store.clone());

        Self {
            inner: Arc::new(EngineInner {
                backend,
                catalog,
                store,
                updater,
                reconciler,
            }),
        }
    }

    /// The session cart store.
    #[must_use]
    pub fn store(&self) -> &CartStore {
        &self.inner.store
    }

    /// Add units of a variant to the cart.
    ///
    /// Fetches the variant's catalog snapshot, clamps the initial quantity
    /// to available stock, mirrors the add onto the backend when the session
    /// is server-backed, then installs the line locally.
    ///
    /// # Errors
    ///
    /// Returns catalog or backend failures; an exhausted variant surfaces as
    /// [`QuantityOutcome::RejectedBelowMinimum`], not an error.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn add_to_cart(&self, key: LineKey, quantity: u32) -> Result<QuantityOutcome> {
        let snapshot = self.inner.catalog.variant_snapshot(&key).await?;

        let requested = quantity;
        let applied = requested.min(snapshot.stock);
        if applied == 0 {
            return Ok(QuantityOutcome::RejectedBelowMinimum);
        }

        let mut line = CartLine::new(key.product, key.variant, applied);
        line.apply_snapshot(&snapshot);

        if self.inner.store.origin().await == CartOrigin::Server {
            self.inner
                .backend
                .add_line(&AddLineRequest::from_line(&line))
                .await?;
        }
        self.inner.store.add_line(line).await;

        if applied < requested {
            warn!(requested, applied, "add-to-cart clamped to available stock");
            Ok(QuantityOutcome::Clamped { requested, applied })
        } else {
            Ok(QuantityOutcome::Applied { quantity: applied })
        }
    }

    /// Apply one quantity edit to one line, serialized per line.
    ///
    /// # Errors
    ///
    /// See [`QuantityUpdater::apply`].
    pub async fn update_quantity(
        &self,
        key: &LineKey,
        edit: QuantityEdit,
    ) -> Result<QuantityOutcome> {
        self.inner.updater.apply(key, edit).await
    }

    /// Remove one line, locally and (for server-backed sessions) on the
    /// backend.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if the key is not in the cart.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn remove_line(&self, key: &LineKey) -> Result<()> {
        if self.inner.store.line(key).await.is_none() {
            return Err(CartError::LineNotFound(key.clone()));
        }
        if self.inner.store.origin().await == CartOrigin::Server {
            self.inner.backend.remove_line(key).await?;
        }
        self.inner.store.remove_line(key).await;
        Ok(())
    }

    /// Reconcile the local cart with the server cart at login, then refresh
    /// catalog snapshots for the merged lines (server-sourced lines arrive
    /// without prices).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ReconciliationInProgress`] if a reconciliation
    /// is still completing. Replay failures arrive in the report.
    pub async fn reconcile_at_login(&self) -> Result<ReconcileReport> {
        let report = self.inner.reconciler.reconcile().await?;
        self.refresh_snapshots().await;
        Ok(report)
    }

    /// Refresh every line's price/stock snapshot from the catalog.
    ///
    /// Best-effort: a failed lookup leaves the line's previous snapshot in
    /// place and is logged. Lines that end up with no usable price block
    /// checkout later, at pricing time.
    pub async fn refresh_snapshots(&self) {
        for line in self.inner.store.lines().await {
            let key = line.key();
            match self.inner.catalog.variant_snapshot(&key).await {
                Ok(snapshot) => {
                    self.inner.store.apply_snapshot(&key, &snapshot).await;
                }
                Err(error) => {
                    warn!(key = %key, %error, "failed to refresh variant snapshot");
                }
            }
        }
    }

    // =========================================================================
    // Checkout surfaces - all of them price through the same function
    // =========================================================================

    /// Breakdown for the cart page: no shipping method or payment method
    /// chosen yet.
    ///
    /// # Errors
    ///
    /// Returns a pricing error if any line has no usable price.
    pub async fn cart_summary(&self) -> Result<CostBreakdown> {
        Ok(self.inner.store.breakdown(None, None).await?)
    }

    /// Breakdown for the shipping step, with the selected method applied.
    ///
    /// # Errors
    ///
    /// Returns a pricing error if any line has no usable price.
    pub async fn shipping_step(&self, shipping: &ShippingPolicy) -> Result<CostBreakdown> {
        Ok(self.inner.store.breakdown(Some(shipping), None).await?)
    }

    /// Breakdown for the payment step, with the selected method's commission
    /// stacked on subtotal plus shipping.
    ///
    /// # Errors
    ///
    /// Returns a pricing error if any line has no usable price.
    pub async fn payment_step(
        &self,
        shipping: Option<&ShippingPolicy>,
        payment: &PaymentPolicy,
    ) -> Result<CostBreakdown> {
        Ok(self.inner.store.breakdown(shipping, Some(payment)).await?)
    }

    /// Breakdown for a quotation summary over whatever has been selected so
    /// far.
    ///
    /// # Errors
    ///
    /// Returns a pricing error if any line has no usable price.
    pub async fn quotation_summary(
        &self,
        shipping: Option<&ShippingPolicy>,
        payment: Option<&PaymentPolicy>,
    ) -> Result<CostBreakdown> {
        Ok(self.inner.store.breakdown(shipping, payment).await?)
    }

    /// Empty the cart after an order is successfully created.
    ///
    /// The local cart is cleared first so the order cannot be re-submitted;
    /// a failure clearing the server cart is logged and absorbed.
    #[instrument(skip(self))]
    pub async fn complete_order(&self) {
        let origin = self.inner.store.origin().await;
        self.inner.store.clear().await;
        if origin == CartOrigin::Server
            && let Err(error) = self.inner.backend.clear_cart().await
        {
            warn!(%error, "failed to clear server cart after order completion");
        }
    }
}
