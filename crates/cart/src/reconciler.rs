//! Login-time cart reconciliation.
//!
//! When an anonymous session authenticates, the locally-held cart and the
//! server-held cart must become one cart, with no line lost and no line
//! duplicated. The merge itself is a pure function; the reconciler wraps it
//! with the fetch/install/replay choreography and guards against re-entry.
//!
//! Cart sync must never block a login: an unreachable server degrades to an
//! empty server cart, and replay failures are collected into the report
//! rather than raised.

use std::sync::Arc;

use tracing::{instrument, warn};

use campo_fresco_core::types::{Cart, CartLine, CartOrigin, LineKey};

use crate::backend::{AddLineRequest, BackendError, CartBackend, ServerCart};
use crate::error::{CartError, Result};
use crate::store::CartStore;

/// Merge a local and a server cart into one.
///
/// The result is the union of lines keyed by product + variant. Where both
/// sides hold the same key, the quantity is the *maximum* of the two, never
/// the sum: summing would double the overlapping lines every time the merge
/// re-ran for the same session transition. Local snapshot data (prices,
/// stock, weight) wins, since server lines carry none.
///
/// The merge is idempotent: feeding its own output back in returns the same
/// lines.
#[must_use]
pub fn merge_carts(local: &Cart, server: &Cart) -> Cart {
    let mut merged = Cart::new(CartOrigin::Server);
    for line in local.lines() {
        merged.add(line.clone());
    }
    for line in server.lines() {
        let key = line.key();
        if let Some(existing) = merged.line(&key) {
            let quantity = existing.quantity.max(line.quantity);
            merged.set_quantity(&key, quantity);
        } else {
            merged.add(line.clone());
        }
    }
    merged
}

/// Lift the backend's wire cart into the domain model.
///
/// Zero-quantity lines are dropped; a line either exists with a positive
/// count or not at all.
#[must_use]
pub fn cart_from_wire(wire: ServerCart) -> Cart {
    let mut cart = Cart::new(CartOrigin::Server);
    for line in wire.products {
        if line.quantity == 0 {
            continue;
        }
        cart.add(CartLine::new(line.product_id, line.variant_id, line.quantity));
    }
    cart
}

/// One line that could not be replayed onto the server.
#[derive(Debug)]
pub struct ReplayFailure {
    /// The line that failed.
    pub key: LineKey,
    /// Why the add failed.
    pub error: BackendError,
}

/// Result of a login reconciliation.
///
/// Partial failure is data, not an error: login proceeds, and the caller
/// surfaces `failed` as a non-blocking warning.
#[derive(Debug)]
pub struct ReconcileReport {
    /// The cart now installed in the store.
    pub merged: Cart,
    /// Lines that did not make it onto the server.
    pub failed: Vec<ReplayFailure>,
    /// The server cart could not be fetched and was treated as empty.
    pub server_unreachable: bool,
}

impl ReconcileReport {
    /// Whether the reconciliation completed with no degradation at all.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && !self.server_unreachable
    }
}

/// Folds the local cart into the server cart, once per login transition.
pub struct CartReconciler<B> {
    backend: Arc<B>,
    store: CartStore,
    in_flight: tokio::sync::Mutex<()>,
}

impl<B: CartBackend> CartReconciler<B> {
    /// Create a reconciler over the given backend and store.
    #[must_use]
    pub fn new(backend: Arc<B>, store: CartStore) -> Self {
        Self {
            backend,
            store,
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Reconcile the local cart with the server cart.
    ///
    /// Fetches the server cart (an unreachable server degrades to an empty
    /// one), merges, installs the merged cart in the store, then makes the
    /// server match by clearing it and replaying each line. Every replayed
    /// add stands on its own: one failure is recorded and the rest continue.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ReconciliationInProgress`] if a reconciliation
    /// for this session is still completing. Replay failures are *not*
    /// errors; they arrive in the report.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            return Err(CartError::ReconciliationInProgress);
        };

        let (server_cart, server_unreachable) = match self.backend.fetch_cart().await {
            Ok(wire) => (cart_from_wire(wire), false),
            Err(error) => {
                warn!(%error, "server cart unavailable; reconciling against an empty cart");
                (Cart::new(CartOrigin::Server), true)
            }
        };

        let local = self.store.snapshot().await;
        let merged = merge_carts(&local, &server_cart);
        self.store.replace(merged.clone()).await;

        // Clear-then-replay. A failed clear is logged and replay continues:
        // adds are keyed by product + variant, so the backend folds them
        // into existing lines rather than duplicating them.
        if let Err(error) = self.backend.clear_cart().await {
            warn!(%error, "failed to clear server cart before replay");
        }

        let mut failed = Vec::new();
        for line in merged.lines() {
            if let Err(error) = self.backend.add_line(&AddLineRequest::from_line(line)).await {
                warn!(key = %line.key(), %error, "line failed to replay onto the server");
                failed.push(ReplayFailure {
                    key: line.key(),
                    error,
                });
            }
        }

        Ok(ReconcileReport {
            merged,
            failed,
            server_unreachable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campo_fresco_core::types::{ProductId, VariantId};
    use rust_decimal::Decimal;

    fn line(product: &str, variant: Option<&str>, quantity: u32) -> CartLine {
        CartLine::new(ProductId::new(product), variant.map(VariantId::new), quantity)
    }

    fn keys(cart: &Cart) -> Vec<String> {
        cart.lines().iter().map(|l| l.key().to_string()).collect()
    }

    fn quantities(cart: &Cart) -> Vec<(String, u32)> {
        cart.lines()
            .iter()
            .map(|l| (l.key().to_string(), l.quantity))
            .collect()
    }

    #[test]
    fn test_merge_takes_the_maximum_never_the_sum() {
        let mut local = Cart::new(CartOrigin::Local);
        local.add(line("aceite-oliva", Some("500ml"), 3));
        let mut server = Cart::new(CartOrigin::Server);
        server.add(line("aceite-oliva", Some("500ml"), 5));

        let merged = merge_carts(&local, &server);

        assert_eq!(
            quantities(&merged),
            vec![("aceite-oliva/500ml".to_string(), 5)]
        );
    }

    #[test]
    fn test_merge_is_the_union_of_both_sides() {
        let mut local = Cart::new(CartOrigin::Local);
        local.add(line("aceite-oliva", Some("500ml"), 2));
        local.add(line("lomo", Some("1kg"), 1));
        let mut server = Cart::new(CartOrigin::Server);
        server.add(line("lomo", Some("1kg"), 4));
        server.add(line("vacio", None, 1));

        let merged = merge_carts(&local, &server);

        // Local order first, then server-only lines.
        assert_eq!(
            quantities(&merged),
            vec![
                ("aceite-oliva/500ml".to_string(), 2),
                ("lomo/1kg".to_string(), 4),
                ("vacio".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut local = Cart::new(CartOrigin::Local);
        local.add(line("aceite-oliva", Some("500ml"), 2));
        local.add(line("lomo", Some("1kg"), 7));
        let mut server = Cart::new(CartOrigin::Server);
        server.add(line("lomo", Some("1kg"), 3));

        let once = merge_carts(&local, &server);
        let twice = merge_carts(&once, &server);

        assert_eq!(quantities(&once), quantities(&twice));

        let against_empty = merge_carts(&once, &Cart::new(CartOrigin::Server));
        assert_eq!(quantities(&once), quantities(&against_empty));
    }

    #[test]
    fn test_merge_keeps_local_snapshot_data() {
        let mut priced = line("aceite-oliva", Some("500ml"), 2);
        priced.unit_price = Some(Decimal::from(15990));
        priced.available_stock = Some(8);

        let mut local = Cart::new(CartOrigin::Local);
        local.add(priced);
        let mut server = Cart::new(CartOrigin::Server);
        server.add(line("aceite-oliva", Some("500ml"), 5));

        let merged = merge_carts(&local, &server);

        let merged_line = merged.lines().first().unwrap();
        assert_eq!(merged_line.quantity, 5);
        assert_eq!(merged_line.unit_price, Some(Decimal::from(15990)));
        assert_eq!(merged_line.available_stock, Some(8));
    }

    #[test]
    fn test_merge_never_duplicates_a_key() {
        let mut local = Cart::new(CartOrigin::Local);
        local.add(line("lomo", Some("1kg"), 2));
        local.add(line("lomo", None, 1));
        let mut server = Cart::new(CartOrigin::Server);
        server.add(line("lomo", Some("1kg"), 1));
        server.add(line("lomo", None, 6));

        let merged = merge_carts(&local, &server);

        let mut seen = keys(&merged);
        let total = seen.len();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), total);
        assert_eq!(total, 2);
    }

    #[test]
    fn test_wire_cart_drops_zero_quantities() {
        let wire = ServerCart {
            products: vec![
                crate::backend::ServerCartLine {
                    product_id: ProductId::new("lomo"),
                    variant_id: None,
                    quantity: 0,
                },
                crate::backend::ServerCartLine {
                    product_id: ProductId::new("vacio"),
                    variant_id: None,
                    quantity: 2,
                },
            ],
        };

        let cart = cart_from_wire(wire);
        assert_eq!(quantities(&cart), vec![("vacio".to_string(), 2)]);
    }
}
