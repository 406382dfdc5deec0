//! # Checkout Planning
//!
//! Turns the current cart into the complete set of remote writes a commit
//! must perform. Planning is pure; executing the plan against the gateway is
//! the application layer's job.
//!
//! ## Plan Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CheckoutPlan                                       │
//! │                                                                         │
//! │  Cart ──► plan_checkout() ──┬──► NewSale          (1 header insert)    │
//! │                             ├──► [SaleItemDraft]  (1 batch insert)     │
//! │                             ├──► [StockUpdate]    (1 update per line)  │
//! │                             └──► [MovementDraft]  (1 insert per line)  │
//! │                                                                         │
//! │  The sale id is only known after the header insert; item and movement  │
//! │  drafts are completed with it at execution time.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Updates
//! Each stock update carries the quantity observed in the cart's product
//! snapshot (`expected_stock`) alongside the decremented value. The executor
//! must key the remote update on product id + store id + expected stock, so
//! a concurrent checkout that already consumed the stock makes the update
//! match zero rows instead of silently losing the other session's decrement.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::error::CheckoutError;
use crate::types::{MovementKind, NewInventoryTransaction, NewSale, NewSaleItem, PaymentMethod};

// =============================================================================
// Policy & Request
// =============================================================================

/// Optional guards applied while planning.
///
/// Both default to OFF: the operator is trusted to over-discount and to sell
/// past the stock snapshot, matching the system's historical behavior.
/// Callers wanting stricter behavior opt in explicitly.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutPolicy {
    /// Reject carts whose line quantity exceeds the stock snapshot.
    pub enforce_stock: bool,

    /// Reject lines whose discount exceeds the line subtotal.
    pub forbid_over_discount: bool,
}

/// Operator choices made on the checkout screen.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    /// Selected customer, if any.
    pub customer_id: Option<String>,

    pub payment_method: PaymentMethod,
}

// =============================================================================
// Plan Components
// =============================================================================

/// A sale line awaiting its sale id. The unit price is snapshotted from the
/// cart's product copy here and never re-read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleItemDraft {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
}

impl SaleItemDraft {
    /// Completes the draft once the sale header insert returned its id.
    pub fn to_new_sale_item(&self, sale_id: &str) -> NewSaleItem {
        NewSaleItem {
            sale_id: sale_id.to_string(),
            product_id: self.product_id.clone(),
            quantity: self.quantity,
            unit_price_cents: self.unit_price_cents,
            discount_cents: self.discount_cents,
        }
    }
}

/// A guarded stock decrement for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockUpdate {
    pub product_id: String,

    /// Stock quantity observed in the cart snapshot. The remote update must
    /// be conditioned on this value (compare-and-set).
    pub expected_stock: i64,

    /// `expected_stock - quantity`. May go negative; the backing store is
    /// the authority on whether to reject that.
    pub new_stock: i64,

    pub quantity: i64,
}

/// A pending `out` movement awaiting the sale id for its reason text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MovementDraft {
    pub product_id: String,
    pub quantity: i64,
}

impl MovementDraft {
    /// Completes the draft into an audit row referencing the new sale.
    pub fn to_new_transaction(
        &self,
        sale_id: &str,
        user_id: &str,
        store_id: &str,
    ) -> NewInventoryTransaction {
        NewInventoryTransaction {
            product_id: self.product_id.clone(),
            kind: MovementKind::Out,
            quantity: self.quantity,
            reason: Some(format!("Sale #{sale_id}")),
            user_id: user_id.to_string(),
            store_id: store_id.to_string(),
        }
    }
}

/// The full write set of one checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutPlan {
    pub sale: NewSale,
    pub items: Vec<SaleItemDraft>,
    pub stock_updates: Vec<StockUpdate>,
    pub movements: Vec<MovementDraft>,
}

// =============================================================================
// Planning
// =============================================================================

/// Plans a checkout from the current cart.
///
/// ## Totals
/// The sale header carries `Σ(unit_price × quantity) − Σ(discount)` as its
/// total and `Σ(discount)` as its aggregate discount, both computed from the
/// cart's snapshots.
///
/// ## Errors
/// - [`CheckoutError::EmptyCart`] for an empty cart.
/// - [`CheckoutError::InsufficientStock`] / [`CheckoutError::DiscountExceedsLine`]
///   only when the corresponding [`CheckoutPolicy`] guard is enabled.
pub fn plan_checkout(
    cart: &Cart,
    store_id: &str,
    user_id: &str,
    request: &CheckoutRequest,
    policy: &CheckoutPolicy,
) -> Result<CheckoutPlan, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    for line in &cart.lines {
        if policy.enforce_stock && line.quantity > line.product.stock_quantity {
            return Err(CheckoutError::InsufficientStock {
                name: line.product.name.clone(),
                available: line.product.stock_quantity,
                requested: line.quantity,
            });
        }

        if policy.forbid_over_discount && line.discount_cents > line.subtotal_cents() {
            return Err(CheckoutError::DiscountExceedsLine {
                name: line.product.name.clone(),
                discount_cents: line.discount_cents,
                subtotal_cents: line.subtotal_cents(),
            });
        }
    }

    let sale = NewSale {
        customer_id: request.customer_id.clone(),
        store_id: store_id.to_string(),
        user_id: user_id.to_string(),
        total_amount_cents: cart.total_cents(),
        discount_cents: cart.total_discount_cents(),
        payment_method: request.payment_method,
        sale_date: None,
    };

    let items = cart
        .lines
        .iter()
        .map(|line| SaleItemDraft {
            product_id: line.product.id.clone(),
            quantity: line.quantity,
            unit_price_cents: line.product.sale_price_cents,
            discount_cents: line.discount_cents,
        })
        .collect();

    let stock_updates = cart
        .lines
        .iter()
        .map(|line| StockUpdate {
            product_id: line.product.id.clone(),
            expected_stock: line.product.stock_quantity,
            new_stock: line.product.stock_quantity - line.quantity,
            quantity: line.quantity,
        })
        .collect();

    let movements = cart
        .lines
        .iter()
        .map(|line| MovementDraft {
            product_id: line.product.id.clone(),
            quantity: line.quantity,
        })
        .collect();

    Ok(CheckoutPlan {
        sale,
        items,
        stock_updates,
        movements,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
