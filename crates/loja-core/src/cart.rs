//! # Cart Module
//!
//! The transient, session-local collection of candidate sale lines prior to
//! commit.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Operations                                   │
//! │                                                                         │
//! │  Sale-screen Action        Cart Operation         State Change          │
//! │  ──────────────────        ──────────────         ────────────          │
//! │                                                                         │
//! │  Click Product ──────────► add(product) ────────► qty += 1 or push      │
//! │                                                                         │
//! │  Change Quantity ────────► set_quantity(id, q) ─► q <= 0 removes line   │
//! │                                                                         │
//! │  Type Discount ──────────► set_discount(id, c) ─► clamped to >= 0       │
//! │                                                                         │
//! │  Click Remove ───────────► remove(id) ──────────► line dropped          │
//! │                                                                         │
//! │  Checkout Success ───────► clear() ─────────────► empty cart            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one line per product id (adding the same product merges).
//! - Quantity is always > 0 (set_quantity to 0 or below removes the line).
//! - Line discount is always >= 0 but is NOT bounded by the line subtotal;
//!   an over-discount legally produces a negative line total. Guarding this
//!   is a checkout policy decision, not a cart invariant.
//!
//! Every operation here is a synchronous, pure, local-state mutation. The
//! cart never touches the remote gateway.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::Product;

// =============================================================================
// Cart Line
// =============================================================================

/// One candidate sale line.
///
/// Holds a full snapshot of the product at the time it was added, so the
/// sale screen keeps showing consistent data (and checkout snapshots the
/// price from here) even if the catalog row changes underneath.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    /// Product snapshot at the time of adding.
    pub product: Product,

    /// Quantity in cart. Always > 0.
    pub quantity: i64,

    /// Flat discount for this line, in cents. Always >= 0.
    pub discount_cents: i64,
}

impl CartLine {
    /// Line subtotal before discount (unit price × quantity).
    #[inline]
    pub fn subtotal_cents(&self) -> i64 {
        self.product.sale_price_cents * self.quantity
    }

    /// Line total after discount. May be negative when the discount
    /// exceeds the subtotal.
    #[inline]
    pub fn total_cents(&self) -> i64 {
        self.subtotal_cents() - self.discount_cents
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart: an ordered list of lines keyed by product id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds one unit of a product, merging into an existing line.
    ///
    /// ## Behavior
    /// - Product already in cart: quantity += 1.
    /// - Otherwise: new line with quantity 1, discount 0.
    pub fn add(&mut self, product: &Product) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
            line.quantity += 1;
            return;
        }

        self.lines.push(CartLine {
            product: product.clone(),
            quantity: 1,
            discount_cents: 0,
        });
    }

    /// Sets the quantity of a line.
    ///
    /// A quantity of 0 or below removes the line entirely; a zero-quantity
    /// line must never remain. Unknown product ids are ignored. No upper
    /// bound is enforced against remaining stock at this layer.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove(product_id);
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product_id) {
            line.quantity = quantity;
        }
    }

    /// Sets the flat discount of a line, clamped to >= 0.
    ///
    /// The discount is deliberately NOT validated against the line subtotal.
    pub fn set_discount(&mut self, product_id: &str, discount_cents: i64) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product_id) {
            line.discount_cents = Money::from_cents(discount_cents).max_zero().cents();
        }
    }

    /// Removes a line by product id.
    pub fn remove(&mut self, product_id: &str) {
        self.lines.retain(|l| l.product.id != product_id);
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Subtotal before discounts: Σ(unit_price × quantity).
    pub fn subtotal_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.subtotal_cents()).sum()
    }

    /// Aggregate discount: Σ(line discount).
    pub fn total_discount_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.discount_cents).sum()
    }

    /// Grand total: subtotal − aggregate discount.
    pub fn total_cents(&self) -> i64 {
        self.subtotal_cents() - self.total_discount_cents()
    }

    /// Grand total as Money.
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents())
    }
}

/// Cart totals summary for display.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
            subtotal_cents: cart.subtotal_cents(),
            discount_cents: cart.total_discount_cents(),
            total_cents: cart.total_cents(),
        }
    }
}

// =============================================================================
// Product Picker
// =============================================================================

/// Filters the catalog mirror for the sale screen: active products whose
/// name or SKU matches the search term (case-insensitive). An empty term
/// returns all active products.
pub fn search_active_products<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    let term = term.trim().to_lowercase();
    products
        .iter()
        .filter(|p| p.active)
        .filter(|p| {
            term.is_empty()
                || p.name.to_lowercase().contains(&term)
                || p.sku
                    .as_deref()
                    .is_some_and(|sku| sku.to_lowercase().contains(&term))
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::product;

    #[test]
    fn test_add_new_line() {
        let mut cart = Cart::new();
        let p = product("1", "Coffee", 999, 10);

        cart.add(&p);

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 1);
        assert_eq!(cart.lines[0].discount_cents, 0);
    }

    #[test]
    fn test_add_same_product_merges() {
        let mut cart = Cart::new();
        let p = product("1", "Coffee", 999, 10);

        cart.add(&p);
        cart.add(&p);
        cart.add(&p);

        assert_eq!(cart.line_count(), 1); // still one line
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        let p = product("1", "Coffee", 999, 10);

        cart.add(&p);
        cart.set_quantity("1", 0);

        // no zero-quantity ghost entry may remain
        assert!(cart.is_empty());
        assert_eq!(cart.line_count(), 0);
    }

    #[test]
    fn test_set_quantity_negative_removes_line() {
        let mut cart = Cart::new();
        let p = product("1", "Coffee", 999, 10);

        cart.add(&p);
        cart.set_quantity("1", -3);

        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_ignores_unknown_product() {
        let mut cart = Cart::new();
        let p = product("1", "Coffee", 999, 10);

        cart.add(&p);
        cart.set_quantity("missing", 5);

        assert_eq!(cart.total_quantity(), 1);
    }

    #[test]
    fn test_discount_clamped_to_zero() {
        let mut cart = Cart::new();
        let p = product("1", "Coffee", 999, 10);

        cart.add(&p);
        cart.set_discount("1", -500);

        assert_eq!(cart.lines[0].discount_cents, 0);
    }

    #[test]
    fn test_over_discount_is_allowed() {
        let mut cart = Cart::new();
        let p = product("1", "Coffee", 500, 10);

        cart.add(&p);
        cart.set_discount("1", 800); // exceeds the R$5.00 subtotal

        assert_eq!(cart.lines[0].total_cents(), -300);
        assert_eq!(cart.total_cents(), -300);
    }

    /// Spec scenario: A at R$10.00 ×2 no discount, B at R$5.00 ×1 with
    /// R$1.00 discount → subtotal 25.00, discount 1.00, total 24.00, 3 items.
    #[test]
    fn test_totals_scenario() {
        let mut cart = Cart::new();
        let a = product("a", "Product A", 1000, 10);
        let b = product("b", "Product B", 500, 10);

        cart.add(&a);
        cart.set_quantity("a", 2);
        cart.add(&b);
        cart.set_discount("b", 100);

        assert_eq!(cart.subtotal_cents(), 2500);
        assert_eq!(cart.total_discount_cents(), 100);
        assert_eq!(cart.total_cents(), 2400);
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(&product("1", "Coffee", 999, 10));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_cents(), 0);
    }

    #[test]
    fn test_search_active_products() {
        let mut coffee = product("1", "Coffee Beans", 999, 10);
        coffee.sku = Some("COF-01".to_string());
        let mut tea = product("2", "Green Tea", 599, 10);
        tea.active = false;

        let products = vec![coffee, tea];

        let all = search_active_products(&products, "");
        assert_eq!(all.len(), 1); // inactive product never shows

        let by_sku = search_active_products(&products, "cof-01");
        assert_eq!(by_sku.len(), 1);

        let none = search_active_products(&products, "tea");
        assert!(none.is_empty());
    }
}
