//! Shared test doubles for the Campo Fresco integration tests.
//!
//! The cart engine is generic over its two collaborator seams
//! ([`CartBackend`] and [`ProductCatalog`]); the doubles here stand in for
//! the backend cart API and the product catalog so cross-crate behavior can
//! be exercised without a network. Both are cheaply cloneable and share
//! state across clones, so a test can keep a handle for inspection after
//! handing one to the engine.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use tokio::sync::Notify;

use campo_fresco_cart::backend::{
    AddLineRequest, BackendError, CartBackend, QuantityAction, ServerCart, ServerCartLine,
    UpdateQuantityRequest,
};
use campo_fresco_cart::catalog::{CatalogError, ProductCatalog};
use campo_fresco_core::types::{LineKey, ProductId, VariantSnapshot, WeightUnit};

// =============================================================================
// InMemoryBackend
// =============================================================================

/// In-memory stand-in for the backend cart API.
///
/// Holds a wire-shaped cart plus call counters. Individual operations can be
/// made to fail (whole fetch, adds for specific products) and gated on a
/// [`Notify`] to hold a request open while a test races a second one.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<BackendState>>,
    fetch_gate: Option<Arc<Notify>>,
    update_gate: Option<Arc<Notify>>,
}

#[derive(Default)]
struct BackendState {
    products: Vec<ServerCartLine>,
    fetch_fails: bool,
    failing_adds: Vec<ProductId>,
    add_calls: usize,
    update_calls: usize,
    clear_calls: usize,
}

impl InMemoryBackend {
    /// An empty backend cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend already holding the given lines.
    #[must_use]
    pub fn with_cart(products: Vec<ServerCartLine>) -> Self {
        let backend = Self::default();
        backend.state().products = products;
        backend
    }

    /// Hold every `fetch_cart` open until the gate is notified.
    #[must_use]
    pub fn gate_fetch(mut self, gate: Arc<Notify>) -> Self {
        self.fetch_gate = Some(gate);
        self
    }

    /// Hold every `update_quantity` open until the gate is notified.
    #[must_use]
    pub fn gate_updates(mut self, gate: Arc<Notify>) -> Self {
        self.update_gate = Some(gate);
        self
    }

    /// Make `fetch_cart` fail from now on.
    pub fn fail_fetch(&self) {
        self.state().fetch_fails = true;
    }

    /// Make `add_line` fail for one product from now on.
    pub fn fail_adds_for(&self, product: ProductId) {
        self.state().failing_adds.push(product);
    }

    /// Current server-held lines.
    #[must_use]
    pub fn products(&self) -> Vec<ServerCartLine> {
        self.state().products.clone()
    }

    /// How many adds were attempted.
    #[must_use]
    pub fn add_calls(&self) -> usize {
        self.state().add_calls
    }

    /// How many quantity mutations were attempted.
    #[must_use]
    pub fn update_calls(&self) -> usize {
        self.state().update_calls
    }

    /// How many clears were attempted.
    #[must_use]
    pub fn clear_calls(&self) -> usize {
        self.state().clear_calls
    }

    fn state(&self) -> std::sync::MutexGuard<'_, BackendState> {
        self.state.lock().expect("backend state lock poisoned")
    }
}

fn injected_failure() -> BackendError {
    BackendError::Api {
        status: 503,
        message: "injected failure".to_string(),
    }
}

impl CartBackend for InMemoryBackend {
    async fn fetch_cart(&self) -> Result<ServerCart, BackendError> {
        if let Some(gate) = &self.fetch_gate {
            gate.notified().await;
        }
        let state = self.state();
        if state.fetch_fails {
            return Err(injected_failure());
        }
        Ok(ServerCart {
            products: state.products.clone(),
        })
    }

    async fn add_line(&self, request: &AddLineRequest) -> Result<(), BackendError> {
        let mut state = self.state();
        state.add_calls += 1;
        if state.failing_adds.contains(&request.product_id) {
            return Err(injected_failure());
        }

        // The backend folds repeated adds into the existing line.
        if let Some(line) = state.products.iter_mut().find(|line| {
            line.product_id == request.product_id && line.variant_id == request.variant_id
        }) {
            line.quantity += request.quantity;
        } else {
            state.products.push(ServerCartLine {
                product_id: request.product_id.clone(),
                variant_id: request.variant_id.clone(),
                quantity: request.quantity,
            });
        }
        Ok(())
    }

    async fn update_quantity(
        &self,
        product_id: &ProductId,
        request: &UpdateQuantityRequest,
    ) -> Result<(), BackendError> {
        if let Some(gate) = &self.update_gate {
            gate.notified().await;
        }
        let mut state = self.state();
        state.update_calls += 1;

        if let Some(line) = state
            .products
            .iter_mut()
            .find(|line| line.product_id == *product_id && line.variant_id == request.variant_id)
        {
            line.quantity = match request.action {
                QuantityAction::Increment => line.quantity + request.quantity,
                QuantityAction::Decrement => line.quantity.saturating_sub(request.quantity),
                QuantityAction::Set => request.quantity,
            };
        }
        Ok(())
    }

    async fn remove_line(&self, key: &LineKey) -> Result<(), BackendError> {
        let mut state = self.state();
        state
            .products
            .retain(|line| line.product_id != key.product || line.variant_id != key.variant);
        Ok(())
    }

    async fn clear_cart(&self) -> Result<(), BackendError> {
        let mut state = self.state();
        state.clear_calls += 1;
        state.products.clear();
        Ok(())
    }
}

// =============================================================================
// InMemoryCatalog
// =============================================================================

/// In-memory product catalog serving canned snapshots.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    snapshots: Arc<Mutex<HashMap<LineKey, VariantSnapshot>>>,
}

impl InMemoryCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a snapshot for one variant.
    pub fn insert(&self, key: LineKey, snapshot: VariantSnapshot) {
        self.snapshots
            .lock()
            .expect("catalog lock poisoned")
            .insert(key, snapshot);
    }
}

impl ProductCatalog for InMemoryCatalog {
    async fn variant_snapshot(&self, key: &LineKey) -> Result<VariantSnapshot, CatalogError> {
        self.snapshots
            .lock()
            .expect("catalog lock poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(key.to_string()))
    }
}

// =============================================================================
// Builders
// =============================================================================

/// A snapshot with the given price and stock, no discount, no weight.
#[must_use]
pub fn snapshot(price: i64, stock: u32) -> VariantSnapshot {
    VariantSnapshot {
        price: Decimal::from(price),
        discounted_price: None,
        stock,
        weight: None,
        weight_unit: WeightUnit::Kilograms,
    }
}

/// A snapshot with a unit weight in grams on top of price and stock.
#[must_use]
pub fn snapshot_with_weight(price: i64, stock: u32, grams: i64) -> VariantSnapshot {
    VariantSnapshot {
        price: Decimal::from(price),
        discounted_price: None,
        stock,
        weight: Some(Decimal::from(grams)),
        weight_unit: WeightUnit::Grams,
    }
}

/// A wire-shaped server cart line.
#[must_use]
pub fn server_line(product: &str, variant: Option<&str>, quantity: u32) -> ServerCartLine {
    ServerCartLine {
        product_id: ProductId::new(product),
        variant_id: variant.map(campo_fresco_core::types::VariantId::new),
        quantity,
    }
}

/// A line key.
#[must_use]
pub fn key(product: &str, variant: Option<&str>) -> LineKey {
    LineKey::new(
        ProductId::new(product),
        variant.map(campo_fresco_core::types::VariantId::new),
    )
}
