//! Cart data model.
//!
//! A cart is an ordered collection of lines, each identified by its
//! product + variant pair. The pair is unique within a cart: a mutation
//! targeting an existing pair updates that line in place rather than
//! appending a duplicate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, VariantId};
use super::snapshot::VariantSnapshot;
use super::weight::Weight;

/// Where a cart snapshot is held. Only meaningful during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CartOrigin {
    /// Held only in this session (anonymous user).
    #[default]
    Local,
    /// Backed by the server-side cart record (authenticated user).
    Server,
}

/// Identity of a cart line: product plus optional variant.
///
/// Single-variant products may omit the variant on the wire, so the variant
/// component is optional; `None` and `Some(..)` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    /// Product this line references.
    pub product: ProductId,
    /// Specific weight/volume variant, when the product has several.
    pub variant: Option<VariantId>,
}

impl LineKey {
    /// Create a line key.
    #[must_use]
    pub const fn new(product: ProductId, variant: Option<VariantId>) -> Self {
        Self { product, variant }
    }
}

impl std::fmt::Display for LineKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.variant {
            Some(variant) => write!(f, "{}/{variant}", self.product),
            None => write!(f, "{}", self.product),
        }
    }
}

/// One purchasable unit in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product this line references.
    pub product_id: ProductId,
    /// Specific variant of the product, when it has several.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    /// Unit count. Strictly positive; a count of zero means "remove".
    pub quantity: u32,
    /// Unit price at the last catalog refresh.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,
    /// Discounted unit price; preferred over `unit_price` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounted_unit_price: Option<Decimal>,
    /// Last-known stock ceiling. Advisory only; the backend re-validates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_stock: Option<u32>,
    /// Unit weight, used for shipping surcharges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_weight: Option<Weight>,
}

impl CartLine {
    /// Create a bare line with no price/stock snapshot yet.
    #[must_use]
    pub const fn new(product_id: ProductId, variant_id: Option<VariantId>, quantity: u32) -> Self {
        Self {
            product_id,
            variant_id,
            quantity,
            unit_price: None,
            discounted_unit_price: None,
            available_stock: None,
            unit_weight: None,
        }
    }

    /// The line's identity within a cart.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id.clone(), self.variant_id.clone())
    }

    /// The price one unit of this line sells at, preferring the discount.
    #[must_use]
    pub fn effective_unit_price(&self) -> Option<Decimal> {
        self.discounted_unit_price.or(self.unit_price)
    }

    /// Overwrite price, stock and weight from a catalog snapshot.
    pub fn apply_snapshot(&mut self, snapshot: &VariantSnapshot) {
        self.unit_price = Some(snapshot.price);
        self.discounted_unit_price = snapshot.discounted_price;
        self.available_stock = Some(snapshot.stock);
        self.unit_weight = snapshot.unit_weight();
    }
}

/// An ordered collection of cart lines plus provenance.
///
/// Lines are kept private so the uniqueness invariant (one line per
/// `LineKey`) cannot be broken from outside.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Provenance tag used during reconciliation.
    pub origin: CartOrigin,
    lines: Vec<CartLine>,
    /// When the cart was created or last cleared.
    pub created_at: DateTime<Utc>,
    /// When a line was last added, updated or removed.
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Create an empty cart with the given provenance.
    #[must_use]
    pub fn new(origin: CartOrigin) -> Self {
        let now = Utc::now();
        Self {
            origin,
            lines: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// All lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up a line by its key.
    #[must_use]
    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.key() == *key)
    }

    fn line_mut(&mut self, key: &LineKey) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.key() == *key)
    }

    /// Add a line, accumulating quantity if the key is already present.
    ///
    /// An existing line is updated in place: quantity is added (saturating)
    /// and any price/stock data carried by the incoming line replaces the
    /// stale snapshot.
    pub fn add(&mut self, line: CartLine) {
        if let Some(existing) = self.line_mut(&line.key()) {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
            if line.unit_price.is_some() {
                existing.unit_price = line.unit_price;
                existing.discounted_unit_price = line.discounted_unit_price;
            }
            if line.available_stock.is_some() {
                existing.available_stock = line.available_stock;
            }
            if line.unit_weight.is_some() {
                existing.unit_weight = line.unit_weight;
            }
        } else {
            self.lines.push(line);
        }
        self.touch();
    }

    /// Set a line's quantity in place. Callers pass a positive count.
    ///
    /// Returns `false` if no line has this key.
    pub fn set_quantity(&mut self, key: &LineKey, quantity: u32) -> bool {
        let Some(line) = self.line_mut(key) else {
            return false;
        };
        line.quantity = quantity;
        self.touch();
        true
    }

    /// Remove the line with this key. Returns `false` if absent.
    pub fn remove(&mut self, key: &LineKey) -> bool {
        let initial_len = self.lines.len();
        self.lines.retain(|line| line.key() != *key);
        let removed = self.lines.len() != initial_len;
        if removed {
            self.touch();
        }
        removed
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
        let now = Utc::now();
        self.created_at = now;
        self.updated_at = now;
    }

    /// Apply a catalog snapshot to the line with this key, if present.
    pub fn apply_snapshot(&mut self, key: &LineKey, snapshot: &VariantSnapshot) -> bool {
        let Some(line) = self.line_mut(key) else {
            return false;
        };
        line.apply_snapshot(snapshot);
        self.touch();
        true
    }

    /// Total unit count across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new(CartOrigin::Local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(product: &str, variant: Option<&str>) -> LineKey {
        LineKey::new(ProductId::new(product), variant.map(VariantId::new))
    }

    fn line(product: &str, variant: Option<&str>, quantity: u32) -> CartLine {
        CartLine::new(ProductId::new(product), variant.map(VariantId::new), quantity)
    }

    #[test]
    fn test_add_accumulates_quantity_for_same_key() {
        let mut cart = Cart::default();
        cart.add(line("aceite-oliva", Some("500ml"), 2));
        cart.add(line("aceite-oliva", Some("500ml"), 3));

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_no_two_lines_share_a_key() {
        let mut cart = Cart::default();
        cart.add(line("aceite-oliva", Some("500ml"), 1));
        cart.add(line("aceite-oliva", Some("1l"), 1));
        cart.add(line("aceite-oliva", Some("500ml"), 4));
        cart.set_quantity(&key("aceite-oliva", Some("1l")), 2);

        let mut keys: Vec<_> = cart.lines().iter().map(CartLine::key).collect();
        let total = keys.len();
        keys.sort_by(|a, b| format!("{a}").cmp(&format!("{b}")));
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn test_missing_variant_is_a_distinct_key() {
        let mut cart = Cart::default();
        cart.add(line("vacio", None, 1));
        cart.add(line("vacio", Some("entero"), 1));

        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn test_set_quantity_is_absolute() {
        let mut cart = Cart::default();
        cart.add(line("lomo", Some("1kg"), 10));

        assert!(cart.set_quantity(&key("lomo", Some("1kg")), 4));
        assert_eq!(cart.line(&key("lomo", Some("1kg"))).map(|l| l.quantity), Some(4));
    }

    #[test]
    fn test_set_quantity_on_missing_line() {
        let mut cart = Cart::default();
        assert!(!cart.set_quantity(&key("lomo", None), 1));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::default();
        cart.add(line("lomo", Some("1kg"), 1));
        cart.add(line("vacio", None, 2));

        assert!(cart.remove(&key("lomo", Some("1kg"))));
        assert!(!cart.remove(&key("lomo", Some("1kg"))));
        assert_eq!(cart.lines().len(), 1);

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_effective_price_prefers_discount() {
        let mut priced = line("aceite-oliva", Some("500ml"), 1);
        priced.unit_price = Some(rust_decimal::Decimal::from(15990));
        assert_eq!(
            priced.effective_unit_price(),
            Some(rust_decimal::Decimal::from(15990))
        );

        priced.discounted_unit_price = Some(rust_decimal::Decimal::from(12990));
        assert_eq!(
            priced.effective_unit_price(),
            Some(rust_decimal::Decimal::from(12990))
        );
    }
}
