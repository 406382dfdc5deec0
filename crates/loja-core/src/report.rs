//! # Report Folding
//!
//! Pure aggregation over fetched slices of sales, expenses, and products.
//! Fetching the slices is the application layer's job; everything here is a
//! deterministic fold.
//!
//! ## Aggregation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Report Aggregation                                   │
//! │                                                                         │
//! │  sales (with items) ──┬──► total revenue, total items sold              │
//! │                       ├──► revenue buckets (day | month | year)         │
//! │                       └──► revenue per product category                  │
//! │                                                                         │
//! │  expenses ────────────┬──► total expenses                                │
//! │                       └──► amount per expense category                   │
//! │                                                                         │
//! │  profit = revenue − expenses   (may be negative; displayed, not error)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bucketing
//! A sale lands in the bucket of its `sale_date` truncated to the chosen
//! resolution. Buckets are emitted sorted ascending by key, each with a
//! human-readable label.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{Customer, Expense, Product, Sale};

// =============================================================================
// Resolution
// =============================================================================

/// Display resolution of the revenue time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// One bucket per calendar date.
    Day,
    /// One bucket per year-month.
    Month,
    /// One bucket per year.
    Year,
}

impl Resolution {
    /// Bucket key of a timestamp: `YYYY-MM-DD`, `YYYY-MM`, or `YYYY`.
    /// Keys sort chronologically as plain strings.
    pub fn bucket_key(&self, date: &DateTime<Utc>) -> String {
        match self {
            Resolution::Day => date.format("%Y-%m-%d").to_string(),
            Resolution::Month => date.format("%Y-%m").to_string(),
            Resolution::Year => date.format("%Y").to_string(),
        }
    }

    /// Human-readable label for a bucket key: `DD/MM`, `MM/YYYY`, or `YYYY`.
    pub fn label_for(&self, key: &str) -> String {
        match self {
            Resolution::Day => match (key.get(8..10), key.get(5..7)) {
                (Some(day), Some(month)) => format!("{day}/{month}"),
                _ => key.to_string(),
            },
            Resolution::Month => match (key.get(5..7), key.get(0..4)) {
                (Some(month), Some(year)) => format!("{month}/{year}"),
                _ => key.to_string(),
            },
            Resolution::Year => key.to_string(),
        }
    }
}

// =============================================================================
// Report Range
// =============================================================================

/// An inclusive date range for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportRange {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

impl ReportRange {
    /// The calendar month containing `now`.
    pub fn current_month(now: DateTime<Utc>) -> Self {
        let start = month_start(now.year(), now.month());
        ReportRange {
            start,
            end: month_end(now.year(), now.month()),
        }
    }

    /// The calendar month before the one containing `now`.
    pub fn previous_month(now: DateTime<Utc>) -> Self {
        let (year, month) = if now.month() == 1 {
            (now.year() - 1, 12)
        } else {
            (now.year(), now.month() - 1)
        };
        ReportRange {
            start: month_start(year, month),
            end: month_end(year, month),
        }
    }

    /// Explicit start/end dates.
    pub fn custom(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        ReportRange { start, end }
    }

    /// Checks whether a timestamp falls inside the range (inclusive).
    pub fn contains(&self, date: &DateTime<Utc>) -> bool {
        *date >= self.start && *date <= self.end
    }
}

/// First instant of a calendar month.
fn month_start(year: i32, month: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("first day of a month is a valid date")
        .and_utc()
}

/// Last instant (second precision) of a calendar month.
fn month_end(year: i32, month: u32) -> DateTime<Utc> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    month_start(next_year, next_month) - Duration::seconds(1)
}

// =============================================================================
// Report Output
// =============================================================================

/// One time bucket of the revenue series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RevenueBucket {
    /// Sort key (`YYYY-MM-DD` / `YYYY-MM` / `YYYY`).
    pub key: String,
    /// Display label (`DD/MM` / `MM/YYYY` / `YYYY`).
    pub label: String,
    pub total_cents: i64,
}

/// Accumulated total for one category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryTotal {
    pub name: String,
    pub total_cents: i64,
}

/// The folded report for one date range.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesReport {
    pub total_revenue_cents: i64,
    pub total_expenses_cents: i64,
    /// Revenue − expenses. Negative is a valid result, not an error.
    pub profit_cents: i64,
    /// Sum of all line quantities across all sales in range.
    pub total_items: i64,
    /// Ascending by key.
    pub revenue_buckets: Vec<RevenueBucket>,
    pub sales_by_category: Vec<CategoryTotal>,
    pub expenses_by_category: Vec<CategoryTotal>,
    pub low_stock: Vec<Product>,
}

// =============================================================================
// Folding
// =============================================================================

/// Folds fetched slices into a [`SalesReport`].
///
/// - `products` is the catalog mirror used to resolve each line item's
///   category; lines whose product is unknown or uncategorized are dropped
///   from the per-category view (only from that view - they still count
///   toward revenue and item totals).
/// - Per-category sale revenue is `unit_price × quantity` per line; line
///   discounts do not reduce it.
/// - `low_stock` is passed through as fetched.
pub fn build_report(
    sales: &[Sale],
    expenses: &[Expense],
    products: &[Product],
    low_stock: Vec<Product>,
    resolution: Resolution,
) -> SalesReport {
    let total_revenue_cents: i64 = sales.iter().map(|s| s.total_amount_cents).sum();
    let total_expenses_cents: i64 = expenses.iter().map(|e| e.amount_cents).sum();
    let total_items: i64 = sales.iter().map(|s| s.items_quantity()).sum();

    // Time buckets, sorted ascending by key.
    let mut buckets: BTreeMap<String, i64> = BTreeMap::new();
    for sale in sales {
        let key = resolution.bucket_key(&sale.sale_date);
        *buckets.entry(key).or_insert(0) += sale.total_amount_cents;
    }
    let revenue_buckets = buckets
        .into_iter()
        .map(|(key, total_cents)| RevenueBucket {
            label: resolution.label_for(&key),
            key,
            total_cents,
        })
        .collect();

    // Revenue per product category, in encounter order.
    let mut sales_by_category: Vec<CategoryTotal> = Vec::new();
    for sale in sales {
        let Some(items) = sale.sale_items.as_deref() else {
            continue;
        };
        for item in items {
            let category = products
                .iter()
                .find(|p| p.id == item.product_id)
                .and_then(|p| p.category.as_deref());
            let Some(category) = category else {
                continue; // uncategorized lines are dropped from this view
            };
            let line_revenue = item.unit_price_cents * item.quantity;
            match sales_by_category.iter_mut().find(|c| c.name == category) {
                Some(entry) => entry.total_cents += line_revenue,
                None => sales_by_category.push(CategoryTotal {
                    name: category.to_string(),
                    total_cents: line_revenue,
                }),
            }
        }
    }

    // Expense amount per category. Category is a required field, so every
    // expense lands somewhere.
    let mut expenses_by_category: Vec<CategoryTotal> = Vec::new();
    for expense in expenses {
        match expenses_by_category
            .iter_mut()
            .find(|c| c.name == expense.category)
        {
            Some(entry) => entry.total_cents += expense.amount_cents,
            None => expenses_by_category.push(CategoryTotal {
                name: expense.category.clone(),
                total_cents: expense.amount_cents,
            }),
        }
    }

    SalesReport {
        total_revenue_cents,
        total_expenses_cents,
        profit_cents: total_revenue_cents - total_expenses_cents,
        total_items,
        revenue_buckets,
        sales_by_category,
        expenses_by_category,
        low_stock,
    }
}

// =============================================================================
// Dashboard Summary
// =============================================================================

/// The at-a-glance numbers on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardSummary {
    /// Number of sales dated today.
    pub sales_today: usize,
    /// Revenue of today's sales.
    pub revenue_today_cents: i64,
    /// Total of all fetched expenses.
    pub total_expenses_cents: i64,
    /// Products with `stock_quantity <= min_stock`.
    pub low_stock_count: usize,
    pub customer_count: usize,
}

/// Folds the catalog mirrors into the dashboard summary. "Today" is the
/// calendar date of `now` in UTC.
pub fn build_dashboard(
    now: DateTime<Utc>,
    sales: &[Sale],
    expenses: &[Expense],
    products: &[Product],
    customers: &[Customer],
) -> DashboardSummary {
    let today = now.date_naive();
    let todays: Vec<&Sale> = sales
        .iter()
        .filter(|s| s.sale_date.date_naive() == today)
        .collect();

    DashboardSummary {
        sales_today: todays.len(),
        revenue_today_cents: todays.iter().map(|s| s.total_amount_cents).sum(),
        total_expenses_cents: expenses.iter().map(|e| e.amount_cents).sum(),
        low_stock_count: products.iter().filter(|p| p.is_low_stock()).count(),
        customer_count: customers.len(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
