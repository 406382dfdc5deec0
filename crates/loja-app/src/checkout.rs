//! # Checkout Workflow
//!
//! Holds the session's cart and commits it as a sale.
//!
//! ## Commit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Checkout Commit                                    │
//! │                                                                         │
//! │  Preconditions: identity present, store present, cart non-empty         │
//! │                                                                         │
//! │  1. insert sale header ───────────► generated sale id                   │
//! │  2. insert all sale items ────────► one batch, snapshot prices          │
//! │  3. per line: update product stock ► keyed by id + store id AND the     │
//! │     observed stock (compare-and-set); zero rows affected = another      │
//! │     session consumed the stock → abort with StockConflict               │
//! │  4. per line: append inventory transaction (out, "Sale #<id>")          │
//! │                                                                         │
//! │  Each step is a separate remote write, awaited before the next.         │
//! │  A failure aborts the REMAINING steps only: whatever already committed  │
//! │  stays committed. There is no compensating rollback - a conflict after  │
//! │  step 2 leaves a sale without stock side effects. Collapsing 1-4 into   │
//! │  one server-side transaction is the known hardening path.               │
//! │                                                                         │
//! │  On full success: clear cart, refresh the product mirror so displayed   │
//! │  stock reflects the decrement, prepend the sale to the sales mirror.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};

use serde_json::json;
use tracing::{error, info};

use loja_core::cart::{Cart, CartTotals};
use loja_core::checkout::{plan_checkout, CheckoutPolicy, CheckoutRequest};
use loja_core::types::{Product, Sale};
use loja_gateway::{DataGateway, Query};

use crate::error::{AppError, AppResult};
use crate::rows::{decode_rows, decode_single};
use crate::state::AppState;
use crate::tables;

/// Service owning the session cart and the commit workflow.
pub struct CheckoutService {
    data: Arc<dyn DataGateway>,
    state: Arc<AppState>,
    cart: Mutex<Cart>,
    policy: CheckoutPolicy,
}

impl CheckoutService {
    pub fn new(data: Arc<dyn DataGateway>, state: Arc<AppState>) -> Self {
        CheckoutService {
            data,
            state,
            cart: Mutex::new(Cart::new()),
            policy: CheckoutPolicy::default(),
        }
    }

    /// Replaces the permissive default policy with explicit guards.
    pub fn with_policy(mut self, policy: CheckoutPolicy) -> Self {
        self.policy = policy;
        self
    }

    // -------------------------------------------------------------------------
    // Cart access
    // -------------------------------------------------------------------------

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().expect("cart mutex poisoned");
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().expect("cart mutex poisoned");
        f(&mut cart)
    }

    /// Adds one unit of a product (merging into an existing line).
    pub fn add_to_cart(&self, product: &Product) {
        self.with_cart_mut(|cart| cart.add(product));
    }

    /// Sets a line's quantity; 0 or below removes the line.
    pub fn set_quantity(&self, product_id: &str, quantity: i64) {
        self.with_cart_mut(|cart| cart.set_quantity(product_id, quantity));
    }

    /// Sets a line's flat discount, clamped to >= 0.
    pub fn set_discount(&self, product_id: &str, discount_cents: i64) {
        self.with_cart_mut(|cart| cart.set_discount(product_id, discount_cents));
    }

    /// Removes a line.
    pub fn remove_item(&self, product_id: &str) {
        self.with_cart_mut(|cart| cart.remove(product_id));
    }

    /// Empties the cart.
    pub fn clear_cart(&self) {
        self.with_cart_mut(|cart| cart.clear());
    }

    /// Current totals summary.
    pub fn totals(&self) -> CartTotals {
        self.with_cart(|cart| CartTotals::from(cart))
    }

    // -------------------------------------------------------------------------
    // Commit
    // -------------------------------------------------------------------------

    /// Commits the cart as a sale. See the module docs for the exact write
    /// sequence and failure semantics.
    pub async fn commit(&self, request: CheckoutRequest) -> AppResult<Sale> {
        let identity = self.state.require_identity()?;
        let store = self.state.require_store()?;

        // Plan from a snapshot; the lock is never held across an await.
        let plan = {
            let cart = self.cart.lock().expect("cart mutex poisoned");
            plan_checkout(&cart, &store.id, &identity.id, &request, &self.policy)?
        };

        // 1. Sale header
        let inserted = self
            .data
            .insert(tables::SALES, vec![serde_json::to_value(&plan.sale)?])
            .await?;
        let sale: Sale = decode_single(inserted)?;

        // 2. Sale items, one batch insert referencing the new id
        let item_rows = plan
            .items
            .iter()
            .map(|draft| serde_json::to_value(draft.to_new_sale_item(&sale.id)))
            .collect::<Result<Vec<_>, _>>()?;
        self.data.insert(tables::SALE_ITEMS, item_rows).await?;

        // 3. Stock decrements, guarded by the observed stock
        for update in &plan.stock_updates {
            let affected = self
                .data
                .update(
                    tables::PRODUCTS,
                    &Query::new()
                        .eq("id", update.product_id.as_str())
                        .eq("store_id", store.id.as_str())
                        .eq("stock_quantity", update.expected_stock),
                    json!({ "stock_quantity": update.new_stock }),
                )
                .await?;

            if affected.is_empty() {
                error!(
                    product_id = %update.product_id,
                    expected = update.expected_stock,
                    "stock changed underneath the checkout, aborting remaining steps"
                );
                return Err(AppError::StockConflict {
                    product_id: update.product_id.clone(),
                });
            }
        }

        // 4. Inventory audit trail
        for movement in &plan.movements {
            let transaction = movement.to_new_transaction(&sale.id, &identity.id, &store.id);
            self.data
                .insert(
                    tables::INVENTORY_TRANSACTIONS,
                    vec![serde_json::to_value(transaction)?],
                )
                .await?;
        }

        info!(
            sale_id = %sale.id,
            total = %sale.total_amount(),
            lines = plan.items.len(),
            "sale committed"
        );

        // Full success: clear the cart and bring the mirrors up to date.
        self.clear_cart();
        self.refresh_product_mirror(&store.id).await?;
        self.state.prepend_sale(sale.clone());

        Ok(sale)
    }

    /// Re-fetches the product collection so displayed stock reflects the
    /// decrements.
    async fn refresh_product_mirror(&self, store_id: &str) -> AppResult<()> {
        let rows = self
            .data
            .select(
                tables::PRODUCTS,
                &Query::new().eq("store_id", store_id).order_desc("created_at"),
            )
            .await?;
        self.state.set_products(decode_rows(rows)?);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use loja_core::error::CheckoutError;
    use loja_core::types::PaymentMethod;
    use loja_gateway::{Identity, MemoryGateway};
    use serde_json::{json, Value};

    fn product(id: &str, name: &str, price_cents: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            sku: None,
            category: None,
            cost_price_cents: 0,
            sale_price_cents: price_cents,
            min_stock: 0,
            stock_quantity: stock,
            active: true,
            store_id: "store-1".to_string(),
            created_at: Utc::now(),
        }
    }

    fn product_row(p: &Product) -> Value {
        serde_json::to_value(p).unwrap()
    }

    fn setup() -> (Arc<MemoryGateway>, Arc<AppState>, CheckoutService) {
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
        let service = CheckoutService::new(gateway.clone(), state.clone());
        (gateway, state, service)
    }

    /// Spec scenario end-to-end: A (R$10.00 ×2) + B (R$5.00 ×1, R$1.00 off)
    /// against starting stocks 10 and 4.
    #[tokio::test]
    async fn test_commit_full_sequence() {
        let (gateway, state, service) = setup();
        let a = product("p-a", "Product A", 1000, 10);
        let b = product("p-b", "Product B", 500, 4);
        gateway.seed(tables::PRODUCTS, vec![product_row(&a), product_row(&b)]);

        service.add_to_cart(&a);
        service.set_quantity("p-a", 2);
        service.add_to_cart(&b);
        service.set_discount("p-b", 100);

        let sale = service
            .commit(CheckoutRequest {
                customer_id: Some("cust-1".to_string()),
                payment_method: PaymentMethod::Pix,
            })
            .await
            .unwrap();

        // header totals match the cart identity
        assert_eq!(sale.total_amount_cents, 2400);
        assert_eq!(sale.discount_cents, 100);
        let sale_row = &gateway.rows(tables::SALES)[0];
        assert_eq!(sale_row["total_amount_cents"], 2400);
        assert_eq!(sale_row["payment_method"], "pix");
        assert_eq!(sale_row["customer_id"], "cust-1");
        assert_eq!(sale_row["store_id"], "store-1");
        assert_eq!(sale_row["user_id"], "user-1");

        // one item per line, referencing the new sale
        let items = gateway.rows(tables::SALE_ITEMS);
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i["sale_id"] == sale.id.as_str()));

        // stock decremented: 10 → 8 and 4 → 3
        let products = gateway.rows(tables::PRODUCTS);
        let stock_of = |id: &str| {
            products
                .iter()
                .find(|p| p["id"] == id)
                .and_then(|p| p["stock_quantity"].as_i64())
                .unwrap()
        };
        assert_eq!(stock_of("p-a"), 8);
        assert_eq!(stock_of("p-b"), 3);

        // one out-movement per line, tagged with the sale
        let movements = gateway.rows(tables::INVENTORY_TRANSACTIONS);
        assert_eq!(movements.len(), 2);
        let movement_for = |id: &str| {
            movements
                .iter()
                .find(|m| m["product_id"] == id)
                .unwrap()
                .clone()
        };
        assert_eq!(movement_for("p-a")["type"], "out");
        assert_eq!(movement_for("p-a")["quantity"], 2);
        assert_eq!(movement_for("p-b")["quantity"], 1);
        assert_eq!(
            movement_for("p-a")["reason"],
            format!("Sale #{}", sale.id).as_str()
        );

        // cart cleared, mirrors updated
        assert!(service.with_cart(|c| c.is_empty()));
        let mirrored_stock = state
            .products()
            .iter()
            .find(|p| p.id == "p-a")
            .unwrap()
            .stock_quantity;
        assert_eq!(mirrored_stock, 8);
        assert_eq!(state.sales().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_commits_nothing() {
        let (gateway, _, service) = setup();

        let err = service.commit(CheckoutRequest::default()).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Checkout(CheckoutError::EmptyCart)
        ));
        assert!(gateway.rows(tables::SALES).is_empty());
        assert!(gateway.rows(tables::SALE_ITEMS).is_empty());
        assert!(gateway.rows(tables::INVENTORY_TRANSACTIONS).is_empty());
    }

    #[tokio::test]
    async fn test_absent_tenant_commits_nothing() {
        let (gateway, state, service) = setup();
        service.add_to_cart(&product("p-a", "Product A", 1000, 10));
        state.set_store(None);

        let err = service.commit(CheckoutRequest::default()).await.unwrap_err();

        assert!(matches!(err, AppError::NoActiveStore));
        assert!(gateway.rows(tables::SALES).is_empty());
        // the cart survives for when a store becomes active
        assert!(!service.with_cart(|c| c.is_empty()));
    }

    #[tokio::test]
    async fn test_unit_price_is_snapshotted_at_cart_time() {
        let (gateway, _, service) = setup();
        let a = product("p-a", "Product A", 1000, 10);
        gateway.seed(tables::PRODUCTS, vec![product_row(&a)]);

        service.add_to_cart(&a);

        // the catalog price changes after the product entered the cart
        gateway
            .update(
                tables::PRODUCTS,
                &Query::new().eq("id", "p-a"),
                json!({ "sale_price_cents": 9999 }),
            )
            .await
            .unwrap();

        let sale = service.commit(CheckoutRequest::default()).await.unwrap();

        assert_eq!(sale.total_amount_cents, 1000);
        let items = gateway.rows(tables::SALE_ITEMS);
        assert_eq!(items[0]["unit_price_cents"], 1000);
    }

    #[tokio::test]
    async fn test_stock_conflict_aborts_before_movements() {
        let (gateway, _, service) = setup();
        let a = product("p-a", "Product A", 1000, 10);
        gateway.seed(tables::PRODUCTS, vec![product_row(&a)]);

        service.add_to_cart(&a); // snapshot says stock 10

        // another session consumes stock before this commit
        gateway
            .update(
                tables::PRODUCTS,
                &Query::new().eq("id", "p-a"),
                json!({ "stock_quantity": 7 }),
            )
            .await
            .unwrap();

        let err = service.commit(CheckoutRequest::default()).await.unwrap_err();

        assert!(matches!(err, AppError::StockConflict { ref product_id } if product_id == "p-a"));
        // the guarded update refused to clobber the concurrent decrement
        assert_eq!(gateway.rows(tables::PRODUCTS)[0]["stock_quantity"], 7);
        // no audit rows were written after the abort
        assert!(gateway.rows(tables::INVENTORY_TRANSACTIONS).is_empty());
        // earlier writes remain - this sequence has no rollback
        assert_eq!(gateway.rows(tables::SALES).len(), 1);
        assert_eq!(gateway.rows(tables::SALE_ITEMS).len(), 1);
        // the cart is preserved on failure
        assert!(!service.with_cart(|c| c.is_empty()));
    }

    #[tokio::test]
    async fn test_step_failure_keeps_earlier_writes_and_cart() {
        let (gateway, _, service) = setup();
        let a = product("p-a", "Product A", 1000, 10);
        gateway.seed(tables::PRODUCTS, vec![product_row(&a)]);
        gateway.fail_table(tables::INVENTORY_TRANSACTIONS);

        service.add_to_cart(&a);

        let err = service.commit(CheckoutRequest::default()).await.unwrap_err();

        assert!(matches!(err, AppError::Gateway(_)));
        // steps 1-3 committed, step 4 failed, nothing was undone
        assert_eq!(gateway.rows(tables::SALES).len(), 1);
        assert_eq!(gateway.rows(tables::SALE_ITEMS).len(), 1);
        assert_eq!(gateway.rows(tables::PRODUCTS)[0]["stock_quantity"], 9);
        assert!(gateway.rows(tables::INVENTORY_TRANSACTIONS).is_empty());
        assert!(!service.with_cart(|c| c.is_empty()));
    }

    #[tokio::test]
    async fn test_policy_guard_blocks_before_any_write() {
        let (gateway, _, service) = setup();
        let service = service.with_policy(CheckoutPolicy {
            enforce_stock: true,
            forbid_over_discount: false,
        });
        let a = product("p-a", "Product A", 1000, 1);
        gateway.seed(tables::PRODUCTS, vec![product_row(&a)]);

        service.add_to_cart(&a);
        service.set_quantity("p-a", 5);

        let err = service.commit(CheckoutRequest::default()).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Checkout(CheckoutError::InsufficientStock { .. })
        ));
        assert!(gateway.rows(tables::SALES).is_empty());
    }
}
