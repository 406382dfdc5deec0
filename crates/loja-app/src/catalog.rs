//! # Catalog Services
//!
//! Tenant-scoped CRUD for customers, products, and expenses, plus the
//! in-memory mirror maintenance that goes with it.
//!
//! ## Rules
//! - Every operation goes through the store guard first; a tenant-less
//!   session never issues a remote call.
//! - Form payloads are validated locally before the gateway sees them.
//! - A mirror is replaced wholesale on refresh, or spliced one element
//!   after the corresponding remote write succeeded - never optimistically.

use std::sync::Arc;

use tracing::{debug, info};

use loja_core::cart::search_active_products;
use loja_core::types::{Customer, Expense, NewCustomer, NewExpense, NewProduct, Product};
use loja_core::validation::{validate_new_customer, validate_new_expense, validate_new_product};
use loja_gateway::{DataGateway, Query};

use crate::error::AppResult;
use crate::rows::{decode_rows, decode_single, scoped_row};
use crate::state::AppState;
use crate::tables;

/// Service for the customer registry, product catalog, and expense book.
pub struct CatalogService {
    data: Arc<dyn DataGateway>,
    state: Arc<AppState>,
}

impl CatalogService {
    pub fn new(data: Arc<dyn DataGateway>, state: Arc<AppState>) -> Self {
        CatalogService { data, state }
    }

    // -------------------------------------------------------------------------
    // Customers
    // -------------------------------------------------------------------------

    /// Full-collection fetch, newest first; replaces the mirror.
    pub async fn refresh_customers(&self) -> AppResult<Vec<Customer>> {
        let store = self.state.require_store()?;

        let rows = self
            .data
            .select(
                tables::CUSTOMERS,
                &Query::new()
                    .eq("store_id", store.id.as_str())
                    .order_desc("created_at"),
            )
            .await?;
        let customers: Vec<Customer> = decode_rows(rows)?;

        debug!(count = customers.len(), "customers refreshed");
        self.state.set_customers(customers.clone());
        Ok(customers)
    }

    pub async fn create_customer(&self, form: NewCustomer) -> AppResult<Customer> {
        let store = self.state.require_store()?;
        validate_new_customer(&form)?;

        let row = scoped_row(&form, &store.id, None)?;
        let inserted = self.data.insert(tables::CUSTOMERS, vec![row]).await?;
        let customer: Customer = decode_single(inserted)?;

        info!(customer_id = %customer.id, "customer created");
        self.state.push_customer(customer.clone());
        Ok(customer)
    }

    pub async fn update_customer(&self, id: &str, form: NewCustomer) -> AppResult<Customer> {
        let store = self.state.require_store()?;
        validate_new_customer(&form)?;

        let affected = self
            .data
            .update(
                tables::CUSTOMERS,
                &Query::new().eq("id", id).eq("store_id", store.id.as_str()),
                serde_json::to_value(&form)?,
            )
            .await?;
        let customer: Customer = decode_single(affected)?;

        info!(customer_id = %customer.id, "customer updated");
        self.state.replace_customer(customer.clone());
        Ok(customer)
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    /// Full-collection fetch, newest first; replaces the mirror.
    pub async fn refresh_products(&self) -> AppResult<Vec<Product>> {
        let store = self.state.require_store()?;

        let rows = self
            .data
            .select(
                tables::PRODUCTS,
                &Query::new()
                    .eq("store_id", store.id.as_str())
                    .order_desc("created_at"),
            )
            .await?;
        let products: Vec<Product> = decode_rows(rows)?;

        debug!(count = products.len(), "products refreshed");
        self.state.set_products(products.clone());
        Ok(products)
    }

    pub async fn create_product(&self, form: NewProduct) -> AppResult<Product> {
        let store = self.state.require_store()?;
        validate_new_product(&form)?;

        let row = scoped_row(&form, &store.id, None)?;
        let inserted = self.data.insert(tables::PRODUCTS, vec![row]).await?;
        let product: Product = decode_single(inserted)?;

        info!(product_id = %product.id, name = %product.name, "product created");
        self.state.push_product(product.clone());
        Ok(product)
    }

    pub async fn update_product(&self, id: &str, form: NewProduct) -> AppResult<Product> {
        let store = self.state.require_store()?;
        validate_new_product(&form)?;

        let affected = self
            .data
            .update(
                tables::PRODUCTS,
                &Query::new().eq("id", id).eq("store_id", store.id.as_str()),
                serde_json::to_value(&form)?,
            )
            .await?;
        let product: Product = decode_single(affected)?;

        info!(product_id = %product.id, "product updated");
        self.state.replace_product(product.clone());
        Ok(product)
    }

    pub async fn delete_product(&self, id: &str) -> AppResult<()> {
        let store = self.state.require_store()?;

        self.data
            .delete(
                tables::PRODUCTS,
                &Query::new().eq("id", id).eq("store_id", store.id.as_str()),
            )
            .await?;

        info!(product_id = %id, "product deleted");
        self.state.remove_product(id);
        Ok(())
    }

    /// Product picker for the sale screen: active products matching the
    /// search term, served from the mirror.
    pub fn search_products(&self, term: &str) -> Vec<Product> {
        let products = self.state.products();
        search_active_products(&products, term)
            .into_iter()
            .cloned()
            .collect()
    }

    // -------------------------------------------------------------------------
    // Expenses
    // -------------------------------------------------------------------------

    /// Full-collection fetch by expense date, newest first; replaces the
    /// mirror.
    pub async fn refresh_expenses(&self) -> AppResult<Vec<Expense>> {
        let store = self.state.require_store()?;

        let rows = self
            .data
            .select(
                tables::EXPENSES,
                &Query::new()
                    .eq("store_id", store.id.as_str())
                    .order_desc("expense_date"),
            )
            .await?;
        let expenses: Vec<Expense> = decode_rows(rows)?;

        debug!(count = expenses.len(), "expenses refreshed");
        self.state.set_expenses(expenses.clone());
        Ok(expenses)
    }

    pub async fn create_expense(&self, form: NewExpense) -> AppResult<Expense> {
        let store = self.state.require_store()?;
        let identity = self.state.require_identity()?;
        validate_new_expense(&form)?;

        let row = scoped_row(&form, &store.id, Some(&identity.id))?;
        let inserted = self.data.insert(tables::EXPENSES, vec![row]).await?;
        let expense: Expense = decode_single(inserted)?;

        info!(expense_id = %expense.id, "expense created");
        self.state.prepend_expense(expense.clone());
        Ok(expense)
    }

    pub async fn update_expense(&self, id: &str, form: NewExpense) -> AppResult<Expense> {
        let store = self.state.require_store()?;
        validate_new_expense(&form)?;

        let affected = self
            .data
            .update(
                tables::EXPENSES,
                &Query::new().eq("id", id).eq("store_id", store.id.as_str()),
                serde_json::to_value(&form)?,
            )
            .await?;
        let expense: Expense = decode_single(affected)?;

        info!(expense_id = %expense.id, "expense updated");
        self.state.replace_expense(expense.clone());
        Ok(expense)
    }

    pub async fn delete_expense(&self, id: &str) -> AppResult<()> {
        let store = self.state.require_store()?;

        self.data
            .delete(
                tables::EXPENSES,
                &Query::new().eq("id", id).eq("store_id", store.id.as_str()),
            )
            .await?;

        info!(expense_id = %id, "expense deleted");
        self.state.remove_expense(id);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use chrono::Utc;
    use loja_gateway::{Identity, MemoryGateway};
    use serde_json::json;

    fn setup() -> (Arc<MemoryGateway>, Arc<AppState>, CatalogService) {
        let gateway = Arc::new(MemoryGateway::new());
        let state = Arc::new(AppState::new());
        state.set_identity(Some(Identity {
            id: "user-1".to_string(),
            email: None,
        }));
        state.set_store(Some(loja_core::types::Store {
            id: "store-1".to_string(),
            name: "Corner Shop".to_string(),
            tax_id: None,
            address: None,
            phone: None,
            owner_id: "user-1".to_string(),
            created_at: Utc::now(),
        }));
        let service = CatalogService::new(gateway.clone(), state.clone());
        (gateway, state, service)
    }

    fn product_form(name: &str, sale_price_cents: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            sale_price_cents,
            active: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_customer_scopes_to_store() {
        let (gateway, state, service) = setup();

        let customer = service
            .create_customer(NewCustomer {
                name: "Maria".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(customer.store_id, "store-1");
        assert_eq!(gateway.rows(tables::CUSTOMERS).len(), 1);
        assert_eq!(state.customers().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_customer_never_reaches_gateway() {
        let (gateway, state, service) = setup();

        let err = service
            .create_customer(NewCustomer {
                name: "  ".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(gateway.rows(tables::CUSTOMERS).is_empty());
        assert!(state.customers().is_empty());
    }

    #[tokio::test]
    async fn test_tenant_less_session_writes_nothing() {
        let (gateway, state, service) = setup();
        state.set_store(None); // authenticated but tenant-less

        let err = service
            .create_product(product_form("Coffee", 1000))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NoActiveStore));
        assert!(gateway.rows(tables::PRODUCTS).is_empty());
    }

    #[tokio::test]
    async fn test_product_negative_price_rejected_locally() {
        let (gateway, _, service) = setup();

        let err = service
            .create_product(product_form("Coffee", -100))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(gateway.rows(tables::PRODUCTS).is_empty());
    }

    #[tokio::test]
    async fn test_update_product_splices_mirror() {
        let (_, state, service) = setup();

        let created = service
            .create_product(product_form("Coffee", 1000))
            .await
            .unwrap();

        let mut form = product_form("Coffee Premium", 1500);
        form.stock_quantity = 7;
        let updated = service.update_product(&created.id, form).await.unwrap();

        assert_eq!(updated.name, "Coffee Premium");
        let mirror = state.products();
        assert_eq!(mirror.len(), 1);
        assert_eq!(mirror[0].sale_price_cents, 1500);
        assert_eq!(mirror[0].stock_quantity, 7);
    }

    #[tokio::test]
    async fn test_delete_product_removes_from_mirror() {
        let (gateway, state, service) = setup();

        let created = service
            .create_product(product_form("Coffee", 1000))
            .await
            .unwrap();
        service.delete_product(&created.id).await.unwrap();

        assert!(gateway.rows(tables::PRODUCTS).is_empty());
        assert!(state.products().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_products_is_newest_first() {
        let (gateway, _, service) = setup();
        gateway.seed(
            tables::PRODUCTS,
            vec![
                json!({
                    "id": "p1", "name": "Old", "description": null, "sku": null,
                    "category": null, "cost_price_cents": 0, "sale_price_cents": 100,
                    "min_stock": 0, "stock_quantity": 1, "active": true,
                    "store_id": "store-1", "created_at": "2025-01-01T00:00:00Z",
                }),
                json!({
                    "id": "p2", "name": "New", "description": null, "sku": null,
                    "category": null, "cost_price_cents": 0, "sale_price_cents": 100,
                    "min_stock": 0, "stock_quantity": 1, "active": true,
                    "store_id": "store-1", "created_at": "2026-01-01T00:00:00Z",
                }),
                json!({
                    "id": "p3", "name": "Foreign", "description": null, "sku": null,
                    "category": null, "cost_price_cents": 0, "sale_price_cents": 100,
                    "min_stock": 0, "stock_quantity": 1, "active": true,
                    "store_id": "other-store", "created_at": "2026-02-01T00:00:00Z",
                }),
            ],
        );

        let products = service.refresh_products().await.unwrap();

        // other tenants never leak into the mirror
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].id, "p2");
        assert_eq!(products[1].id, "p1");
    }

    #[tokio::test]
    async fn test_expense_stamped_with_user_and_store() {
        let (gateway, _, service) = setup();

        let expense = service
            .create_expense(NewExpense {
                description: "Electricity bill".to_string(),
                amount_cents: 12000,
                category: "Electricity".to_string(),
                expense_date: Utc::now(),
                recurring: true,
            })
            .await
            .unwrap();

        assert_eq!(expense.store_id, "store-1");
        assert_eq!(expense.user_id, "user-1");
        assert_eq!(gateway.rows(tables::EXPENSES).len(), 1);
    }

    #[tokio::test]
    async fn test_expense_amount_must_be_positive() {
        let (gateway, _, service) = setup();

        let err = service
            .create_expense(NewExpense {
                description: "Bad".to_string(),
                amount_cents: 0,
                category: "Other".to_string(),
                expense_date: Utc::now(),
                recurring: false,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(gateway.rows(tables::EXPENSES).is_empty());
    }

    #[tokio::test]
    async fn test_search_products_uses_mirror() {
        let (_, _, service) = setup();
        service
            .create_product(product_form("Coffee Beans", 1000))
            .await
            .unwrap();
        service
            .create_product(product_form("Green Tea", 800))
            .await
            .unwrap();

        let hits = service.search_products("coffee");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Coffee Beans");
    }
}
