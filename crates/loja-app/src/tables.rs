//! Remote collection names.
//!
//! One constant per table so a typo cannot silently address a different
//! collection.

pub const STORES: &str = "stores";
pub const CUSTOMERS: &str = "customers";
pub const PRODUCTS: &str = "products";
pub const CATEGORIES: &str = "categories";
pub const SALES: &str = "sales";
pub const SALE_ITEMS: &str = "sale_items";
pub const EXPENSES: &str = "expenses";
pub const INVENTORY_TRANSACTIONS: &str = "inventory_transactions";
