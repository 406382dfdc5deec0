//! # loja-core: Pure Business Logic for Loja
//!
//! This crate is the **heart** of Loja. It contains all business logic as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Loja Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    loja-app (workflows)                         │   │
//! │  │   session resolution ──► checkout commit ──► report fetch       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ loja-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ checkout  │  │   │
//! │  │   │  Product  │  │   Money   │  │   Cart    │  │   plan    │  │   │
//! │  │   │   Sale    │  │  (cents)  │  │ CartLine  │  │  drafts   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐                                 │   │
//! │  │   │  report   │  │ validation│                                 │   │
//! │  │   │  folding  │  │   rules   │                                 │   │
//! │  │   └───────────┘  └───────────┘                                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 loja-gateway (remote gateway)                   │   │
//! │  │          REST client / in-memory backend, filter language       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic - same input =
//!    same output
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are in cents (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod error;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartTotals};
pub use checkout::{plan_checkout, CheckoutPlan, CheckoutPolicy, CheckoutRequest};
pub use error::{CheckoutError, ValidationError};
pub use money::Money;
pub use report::{
    build_dashboard, build_report, DashboardSummary, ReportRange, Resolution, SalesReport,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Fixed stock threshold used by the low-stock section of the report view.
///
/// The dashboard's low-stock count uses each product's own `min_stock`
/// instead; this constant only bounds the report fetch
/// (`stock_quantity <= 5`).
pub const LOW_STOCK_REPORT_THRESHOLD: i64 = 5;

/// Default expense categories offered by the expense form. The category
/// field itself is free text, so operators can extend this list ad hoc.
pub const DEFAULT_EXPENSE_CATEGORIES: [&str; 11] = [
    "Rent",
    "Salaries",
    "Electricity",
    "Water",
    "Internet",
    "Phone",
    "Maintenance",
    "Marketing",
    "Transport",
    "Taxes",
    "Other",
];
