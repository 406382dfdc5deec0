//! # Domain Types
//!
//! Core domain types used throughout Loja.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Store       │   │    Product      │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  owner_id       │   │  store_id       │   │  store_id       │       │
//! │  │  name           │   │  sale_price     │   │  total_amount   │       │
//! │  │  tax_id (CNPJ)  │   │  stock_quantity │   │  payment_method │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Customer · SaleItem · Expense · InventoryTransaction                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tenant Scoping
//! Every collection except `stores` itself carries a `store_id`. Reads and
//! writes must always be filtered by the active store; the application layer
//! injects the scope so no call site can forget it.
//!
//! ## Entity vs `New*` Payloads
//! Entities mirror remote rows (server-generated `id` / `created_at`
//! included). The `New*` structs are insert payloads and omit every
//! server-generated column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Store (Tenant)
// =============================================================================

/// The business entity that owns an isolated set of customers, products,
/// sales, and expenses. Created once per owning identity; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Store {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Brazilian company tax id (CNPJ), digits only.
    pub tax_id: Option<String>,

    pub address: Option<String>,

    pub phone: Option<String>,

    /// Identity that owns this store.
    pub owner_id: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Mutable profile fields of a store. Used both for first-run creation and
/// for settings edits.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoreProfile {
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

// =============================================================================
// Customer
// =============================================================================

/// A registered customer of the store.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,

    /// Required, non-empty.
    pub name: String,

    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,

    /// Brazilian personal tax id (CPF), digits only.
    pub tax_id: Option<String>,

    pub notes: Option<String>,

    pub store_id: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a customer, as submitted by the registry form.
/// The application layer injects `store_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: String,

    /// Display name shown on the sale screen. Required.
    pub name: String,

    pub description: Option<String>,

    /// Stock Keeping Unit - optional business identifier.
    pub sku: Option<String>,

    /// Category label; `None` means uncategorized (such lines are dropped
    /// from per-category revenue).
    pub category: Option<String>,

    /// Acquisition cost in cents (for margin calculations).
    pub cost_price_cents: i64,

    /// Sale price in cents. Snapshot into each sale line at checkout.
    pub sale_price_cents: i64,

    /// Threshold for the low-stock classification.
    pub min_stock: i64,

    /// Current stock level. Decremented by checkout.
    #[serde(default)]
    pub stock_quantity: i64,

    /// Whether the product is offered on the sale screen (soft delete).
    pub active: bool,

    pub store_id: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Returns the sale price as a Money type.
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    /// Low stock is defined as `stock_quantity <= min_stock`.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock
    }

    /// Case-insensitive match against name, SKU, or category.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term)
            || self
                .sku
                .as_deref()
                .is_some_and(|sku| sku.to_lowercase().contains(&term))
            || self
                .category
                .as_deref()
                .is_some_and(|cat| cat.to_lowercase().contains(&term))
    }
}

/// Insert/update payload for a product, as submitted by the catalog form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub cost_price_cents: i64,
    pub sale_price_cents: i64,
    pub min_stock: i64,
    pub stock_quantity: i64,
    pub active: bool,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Brazilian instant-payment transfer.
    Pix,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale. Immutable after creation: there is no edit or delete
/// path for sales anywhere in the system.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,

    /// Optional customer reference; `None` is an anonymous walk-in sale.
    pub customer_id: Option<String>,

    pub store_id: String,

    /// Identity that issued the sale.
    pub user_id: String,

    /// Sum of line subtotals minus line discounts.
    pub total_amount_cents: i64,

    /// Aggregate of all line discounts.
    pub discount_cents: i64,

    pub payment_method: PaymentMethod,

    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,

    /// Line items, present only when the sale was fetched with embedding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_items: Option<Vec<SaleItem>>,
}

impl Sale {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    /// Total quantity across all embedded line items (0 when not embedded).
    pub fn items_quantity(&self) -> i64 {
        self.sale_items
            .as_deref()
            .map(|items| items.iter().map(|i| i.quantity).sum())
            .unwrap_or(0)
    }
}

/// Insert payload for a sale header. `sale_date` is omitted so the remote
/// backend stamps it, unless a caller supplies one explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub customer_id: Option<String>,
    pub store_id: String,
    pub user_id: String,
    pub total_amount_cents: i64,
    pub discount_cents: i64,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub sale_date: Option<DateTime<Utc>>,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
///
/// Uses the snapshot pattern: `unit_price_cents` is the product's sale price
/// at the time of sale, NOT a live reference. Later price edits never alter
/// past sales.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Quantity sold. Always > 0.
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Discount applied to this line.
    pub discount_cents: i64,
}

/// Insert payload for a sale line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSaleItem {
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
}

// =============================================================================
// Expense
// =============================================================================

/// A business expense.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Expense {
    pub id: String,

    /// Required, non-empty.
    pub description: String,

    /// Amount in cents. Always > 0.
    pub amount_cents: i64,

    /// One of [`crate::DEFAULT_EXPENSE_CATEGORIES`] or free text.
    pub category: String,

    #[ts(as = "String")]
    pub expense_date: DateTime<Utc>,

    /// Marks an expense that repeats monthly (rent, salaries, ...).
    pub recurring: bool,

    pub store_id: String,
    pub user_id: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Insert/update payload for an expense, as submitted by the form.
/// The application layer injects `store_id` and `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewExpense {
    pub description: String,
    pub amount_cents: i64,
    pub category: String,
    #[ts(as = "String")]
    pub expense_date: DateTime<Utc>,
    pub recurring: bool,
}

// =============================================================================
// Inventory Transaction
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Stock received.
    In,
    /// Stock leaving (every completed sale emits one per line).
    Out,
}

/// An append-only stock audit entry. One `out` row is emitted per cart line
/// per completed sale; rows are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryTransaction {
    pub id: String,
    pub product_id: String,
    /// Wire name is `type`; `kind` avoids the Rust keyword.
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub quantity: i64,
    pub reason: Option<String>,
    pub user_id: String,
    pub store_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a stock movement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewInventoryTransaction {
    pub product_id: String,
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub quantity: i64,
    pub reason: Option<String>,
    pub user_id: String,
    pub store_id: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
