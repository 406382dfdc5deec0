//! # Reporting Service
//!
//! Fetches the date-ranged slices a report needs and folds them with
//! loja-core's pure aggregation.
//!
//! ## Failure Semantics
//! Any fetch failure aborts the whole aggregation: the error is logged and
//! returned, partial results are never produced, and no retry is attempted.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error};

use loja_core::report::{
    build_dashboard, build_report, DashboardSummary, ReportRange, Resolution, SalesReport,
};
use loja_core::types::{Customer, Expense, Product, Sale};
use loja_core::LOW_STOCK_REPORT_THRESHOLD;
use loja_gateway::{DataGateway, Query};

use crate::error::AppResult;
use crate::rows::decode_rows;
use crate::state::AppState;
use crate::tables;

/// Service for the report and dashboard views.
pub struct ReportService {
    data: Arc<dyn DataGateway>,
    state: Arc<AppState>,
}

impl ReportService {
    pub fn new(data: Arc<dyn DataGateway>, state: Arc<AppState>) -> Self {
        ReportService { data, state }
    }

    /// Builds the report for a date range at the given resolution.
    pub async fn report(
        &self,
        range: ReportRange,
        resolution: Resolution,
    ) -> AppResult<SalesReport> {
        let result = self.fetch_and_fold(range, resolution).await;
        if let Err(e) = &result {
            error!(error = %e, "report aggregation failed");
        }
        result
    }

    async fn fetch_and_fold(
        &self,
        range: ReportRange,
        resolution: Resolution,
    ) -> AppResult<SalesReport> {
        let store = self.state.require_store()?;

        // Sales in range, with their line items embedded.
        let sales: Vec<Sale> = decode_rows(
            self.data
                .select(
                    tables::SALES,
                    &Query::new()
                        .eq("store_id", store.id.as_str())
                        .gte("sale_date", range.start.to_rfc3339())
                        .lte("sale_date", range.end.to_rfc3339())
                        .embed(tables::SALE_ITEMS),
                )
                .await?,
        )?;

        // Expenses in range.
        let expenses: Vec<Expense> = decode_rows(
            self.data
                .select(
                    tables::EXPENSES,
                    &Query::new()
                        .eq("store_id", store.id.as_str())
                        .gte("expense_date", range.start.to_rfc3339())
                        .lte("expense_date", range.end.to_rfc3339()),
                )
                .await?,
        )?;

        // Active products at or below the fixed low-stock threshold.
        let low_stock: Vec<Product> = decode_rows(
            self.data
                .select(
                    tables::PRODUCTS,
                    &Query::new()
                        .eq("store_id", store.id.as_str())
                        .eq("active", true)
                        .lte("stock_quantity", LOW_STOCK_REPORT_THRESHOLD),
                )
                .await?,
        )?;

        // Category lookup uses the product mirror; populate it on first use.
        let mut products = self.state.products();
        if products.is_empty() {
            products = decode_rows(
                self.data
                    .select(
                        tables::PRODUCTS,
                        &Query::new()
                            .eq("store_id", store.id.as_str())
                            .order_desc("created_at"),
                    )
                    .await?,
            )?;
            self.state.set_products(products.clone());
        }

        debug!(
            sales = sales.len(),
            expenses = expenses.len(),
            low_stock = low_stock.len(),
            "report slices fetched"
        );

        Ok(build_report(
            &sales,
            &expenses,
            &products,
            low_stock,
            resolution,
        ))
    }

    /// Refreshes all four catalog mirrors and folds the dashboard summary.
    pub async fn dashboard(&self) -> AppResult<DashboardSummary> {
        let result = self.fetch_dashboard().await;
        if let Err(e) = &result {
            error!(error = %e, "dashboard aggregation failed");
        }
        result
    }

    async fn fetch_dashboard(&self) -> AppResult<DashboardSummary> {
        let store = self.state.require_store()?;
        let store_id = store.id.as_str();

        let customers: Vec<Customer> = decode_rows(
            self.data
                .select(
                    tables::CUSTOMERS,
                    &Query::new().eq("store_id", store_id).order_desc("created_at"),
                )
                .await?,
        )?;

        let products: Vec<Product> = decode_rows(
            self.data
                .select(
                    tables::PRODUCTS,
                    &Query::new().eq("store_id", store_id).order_desc("created_at"),
                )
                .await?,
        )?;

        let sales: Vec<Sale> = decode_rows(
            self.data
                .select(
                    tables::SALES,
                    &Query::new()
                        .eq("store_id", store_id)
                        .order_desc("sale_date")
                        .limit(100),
                )
                .await?,
        )?;

        let expenses: Vec<Expense> = decode_rows(
            self.data
                .select(
                    tables::EXPENSES,
                    &Query::new()
                        .eq("store_id", store_id)
                        .order_desc("expense_date")
                        .limit(100),
                )
                .await?,
        )?;

        let summary = build_dashboard(Utc::now(), &sales, &expenses, &products, &customers);

        self.state.set_customers(customers);
        self.state.set_products(products);
        self.state.set_sales(sales);
        self.state.set_expenses(expenses);

        Ok(summary)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use chrono::TimeZone;
    use loja_gateway::MemoryGateway;
    use serde_json::{json, Value};

    fn setup() -> (Arc<MemoryGateway>, Arc<AppState>, ReportService) {
        let gateway = Arc::new(MemoryGateway::new());
        let state = Arc::new(AppState::new());
        state.set_store(Some(loja_core::types::Store {
            id: "store-1".to_string(),
            name: "Corner Shop".to_string(),
            tax_id: None,
            address: None,
            phone: None,
            owner_id: "user-1".to_string(),
            created_at: Utc::now(),
        }));
        let service = ReportService::new(gateway.clone(), state.clone());
        (gateway, state, service)
    }

    fn sale_row(id: &str, total_cents: i64, sale_date: &str) -> Value {
        json!({
            "id": id,
            "customer_id": null,
            "store_id": "store-1",
            "user_id": "user-1",
            "total_amount_cents": total_cents,
            "discount_cents": 0,
            "payment_method": "cash",
            "sale_date": sale_date,
        })
    }

    fn expense_row(id: &str, amount_cents: i64, category: &str, date: &str) -> Value {
        json!({
            "id": id,
            "description": format!("Expense {id}"),
            "amount_cents": amount_cents,
            "category": category,
            "expense_date": date,
            "recurring": false,
            "store_id": "store-1",
            "user_id": "user-1",
            "created_at": date,
        })
    }

    fn product_row(id: &str, name: &str, category: Option<&str>, stock: i64, min_stock: i64) -> Value {
        json!({
            "id": id,
            "name": name,
            "description": null,
            "sku": null,
            "category": category,
            "cost_price_cents": 0,
            "sale_price_cents": 1000,
            "min_stock": min_stock,
            "stock_quantity": stock,
            "active": true,
            "store_id": "store-1",
            "created_at": "2026-01-01T00:00:00Z",
        })
    }

    fn march() -> ReportRange {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 31, 23, 59, 59).unwrap();
        ReportRange::custom(start, end)
    }

    /// Spec scenario: 30.00 + 20.00 in sales, 10.00 in expenses → revenue
    /// 50.00, expenses 10.00, profit 40.00.
    #[tokio::test]
    async fn test_report_numbers() {
        let (gateway, _, service) = setup();
        gateway.seed(
            tables::SALES,
            vec![
                sale_row("s1", 3000, "2026-03-10T09:00:00Z"),
                sale_row("s2", 2000, "2026-03-12T15:00:00Z"),
                sale_row("s-outside", 77700, "2026-04-02T09:00:00Z"),
            ],
        );
        gateway.seed(
            tables::EXPENSES,
            vec![expense_row("e1", 1000, "Rent", "2026-03-05T00:00:00Z")],
        );

        let report = service.report(march(), Resolution::Day).await.unwrap();

        assert_eq!(report.total_revenue_cents, 5000);
        assert_eq!(report.total_expenses_cents, 1000);
        assert_eq!(report.profit_cents, 4000);
    }

    #[tokio::test]
    async fn test_same_day_sales_share_a_bucket() {
        let (gateway, _, service) = setup();
        gateway.seed(
            tables::SALES,
            vec![
                sale_row("s1", 3000, "2026-03-10T09:00:00Z"),
                sale_row("s2", 2000, "2026-03-10T18:30:00Z"),
            ],
        );

        let report = service.report(march(), Resolution::Day).await.unwrap();

        assert_eq!(report.revenue_buckets.len(), 1);
        assert_eq!(report.revenue_buckets[0].key, "2026-03-10");
        assert_eq!(report.revenue_buckets[0].total_cents, 5000);
    }

    #[tokio::test]
    async fn test_items_and_categories_from_embedded_lines() {
        let (gateway, _, service) = setup();
        gateway.seed(
            tables::SALES,
            vec![sale_row("s1", 2500, "2026-03-10T09:00:00Z")],
        );
        gateway.seed(
            tables::SALE_ITEMS,
            vec![
                json!({
                    "id": "i1", "sale_id": "s1", "product_id": "p1",
                    "quantity": 2, "unit_price_cents": 1000, "discount_cents": 0,
                }),
                json!({
                    "id": "i2", "sale_id": "s1", "product_id": "p2",
                    "quantity": 1, "unit_price_cents": 500, "discount_cents": 0,
                }),
            ],
        );
        gateway.seed(
            tables::PRODUCTS,
            vec![
                product_row("p1", "Cola", Some("Drinks"), 50, 5),
                product_row("p2", "Mystery", None, 50, 5),
            ],
        );

        let report = service.report(march(), Resolution::Day).await.unwrap();

        assert_eq!(report.total_items, 3);
        assert_eq!(report.sales_by_category.len(), 1);
        assert_eq!(report.sales_by_category[0].name, "Drinks");
        assert_eq!(report.sales_by_category[0].total_cents, 2000);
    }

    #[tokio::test]
    async fn test_low_stock_uses_fixed_threshold() {
        let (gateway, _, service) = setup();
        gateway.seed(
            tables::PRODUCTS,
            vec![
                product_row("p1", "Scarce", None, 5, 0), // at threshold → in
                product_row("p2", "Plenty", None, 6, 0), // above → out
            ],
        );

        let report = service.report(march(), Resolution::Day).await.unwrap();

        assert_eq!(report.low_stock.len(), 1);
        assert_eq!(report.low_stock[0].id, "p1");
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_whole_report() {
        let (gateway, _, service) = setup();
        gateway.seed(
            tables::SALES,
            vec![sale_row("s1", 3000, "2026-03-10T09:00:00Z")],
        );
        gateway.fail_table(tables::EXPENSES);

        let err = service.report(march(), Resolution::Day).await.unwrap_err();

        assert!(matches!(err, AppError::Gateway(_)));
    }

    #[tokio::test]
    async fn test_report_requires_store() {
        let (_, state, service) = setup();
        state.set_store(None);

        let err = service.report(march(), Resolution::Day).await.unwrap_err();
        assert!(matches!(err, AppError::NoActiveStore));
    }

    #[tokio::test]
    async fn test_dashboard_refreshes_mirrors_and_folds() {
        let (gateway, state, service) = setup();
        let today = Utc::now();
        let today_str = today.to_rfc3339();
        gateway.seed(
            tables::SALES,
            vec![
                sale_row("s1", 3000, &today_str),
                sale_row("s2", 2000, "2020-01-01T10:00:00Z"),
            ],
        );
        gateway.seed(
            tables::EXPENSES,
            vec![expense_row("e1", 700, "Rent", "2026-03-01T00:00:00Z")],
        );
        gateway.seed(
            tables::PRODUCTS,
            vec![
                product_row("p1", "Scarce", None, 2, 5), // stock <= min_stock
                product_row("p2", "Plenty", None, 50, 5),
            ],
        );
        gateway.seed(
            tables::CUSTOMERS,
            vec![json!({
                "id": "c1", "name": "Maria", "phone": null, "email": null,
                "address": null, "tax_id": null, "notes": null,
                "store_id": "store-1", "created_at": "2026-01-01T00:00:00Z",
            })],
        );

        let summary = service.dashboard().await.unwrap();

        assert_eq!(summary.sales_today, 1);
        assert_eq!(summary.revenue_today_cents, 3000);
        assert_eq!(summary.total_expenses_cents, 700);
        assert_eq!(summary.low_stock_count, 1);
        assert_eq!(summary.customer_count, 1);

        // mirrors were replaced wholesale
        assert_eq!(state.sales().len(), 2);
        assert_eq!(state.products().len(), 2);
        assert_eq!(state.customers().len(), 1);
        assert_eq!(state.expenses().len(), 1);
    }
}
