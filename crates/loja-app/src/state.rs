//! # Application State
//!
//! The explicit state container injected into every workflow. Nothing in
//! Loja reads session or catalog state from ambient globals.
//!
//! ## State Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         AppState                                        │
//! │                                                                         │
//! │  ┌──────────────────────┐   ┌──────────────────────────────────────┐   │
//! │  │   Session slot       │   │   Catalog mirrors                    │   │
//! │  │                      │   │                                      │   │
//! │  │   identity: Option   │   │   customers  products                │   │
//! │  │   store:    Option   │   │   sales      expenses                │   │
//! │  └──────────────────────┘   └──────────────────────────────────────┘   │
//! │                                                                         │
//! │  phase: watch<AuthPhase>   Loading → SignedIn | SignedOut               │
//! │                                                                         │
//! │  LIFECYCLE: initialized empty at startup, populated on successful       │
//! │  identity resolution, cleared on sign-out.                              │
//! │                                                                         │
//! │  MUTATION RULES: a mirror is either replaced wholesale on refresh or    │
//! │  spliced one element at a time after a successful remote write -        │
//! │  never partially streamed.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! Slots are behind `std::sync::RwLock`; locks are held only for the
//! synchronous splice itself, never across an await.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use loja_core::types::{Customer, Expense, Product, Sale, Store};
use loja_gateway::Identity;

use crate::error::{AppError, AppResult};

// =============================================================================
// Auth Phase
// =============================================================================

/// Where the session currently stands. `SignedOut` is the signal for a UI
/// to force navigation back to the unauthenticated entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhase {
    /// Startup resolution has not finished yet.
    Loading,
    /// No identity (or resolution failed, which is treated identically).
    SignedOut,
    /// Identity resolved. A store may or may not be attached.
    SignedIn,
}

// =============================================================================
// Snapshots
// =============================================================================

#[derive(Debug, Default)]
struct SessionSlot {
    identity: Option<Identity>,
    store: Option<Store>,
}

#[derive(Debug, Default)]
struct CatalogMirrors {
    customers: Vec<Customer>,
    products: Vec<Product>,
    sales: Vec<Sale>,
    expenses: Vec<Expense>,
}

// =============================================================================
// App State
// =============================================================================

/// Process-wide application state: the authenticated identity, the active
/// store, and the in-memory catalog mirrors.
#[derive(Debug)]
pub struct AppState {
    session: RwLock<SessionSlot>,
    catalog: RwLock<CatalogMirrors>,
    phase_tx: watch::Sender<AuthPhase>,
}

impl AppState {
    /// Creates an empty state in the `Loading` phase.
    pub fn new() -> Self {
        let (phase_tx, _) = watch::channel(AuthPhase::Loading);
        AppState {
            session: RwLock::new(SessionSlot::default()),
            catalog: RwLock::new(CatalogMirrors::default()),
            phase_tx,
        }
    }

    // -------------------------------------------------------------------------
    // Session slot
    // -------------------------------------------------------------------------

    pub fn identity(&self) -> Option<Identity> {
        self.session
            .read()
            .expect("session lock poisoned")
            .identity
            .clone()
    }

    pub fn store(&self) -> Option<Store> {
        self.session
            .read()
            .expect("session lock poisoned")
            .store
            .clone()
    }

    pub fn set_identity(&self, identity: Option<Identity>) {
        self.session.write().expect("session lock poisoned").identity = identity;
    }

    pub fn set_store(&self, store: Option<Store>) {
        self.session.write().expect("session lock poisoned").store = store;
    }

    /// The identity, or [`AppError::NotSignedIn`]. Every identity-stamped
    /// write goes through this guard.
    pub fn require_identity(&self) -> AppResult<Identity> {
        self.identity().ok_or(AppError::NotSignedIn)
    }

    /// The active store, or [`AppError::NoActiveStore`]. Every tenant-scoped
    /// operation goes through this guard, so a tenant-less session can never
    /// issue a tenant-scoped write.
    pub fn require_store(&self) -> AppResult<Store> {
        self.store().ok_or(AppError::NoActiveStore)
    }

    /// Clears identity, store, and all catalog mirrors.
    pub fn clear_session(&self) {
        {
            let mut session = self.session.write().expect("session lock poisoned");
            session.identity = None;
            session.store = None;
        }
        let mut catalog = self.catalog.write().expect("catalog lock poisoned");
        *catalog = CatalogMirrors::default();
    }

    // -------------------------------------------------------------------------
    // Auth phase
    // -------------------------------------------------------------------------

    pub fn phase(&self) -> AuthPhase {
        *self.phase_tx.borrow()
    }

    pub fn set_phase(&self, phase: AuthPhase) {
        self.phase_tx.send_replace(phase);
    }

    /// Subscribes to phase transitions (the headless equivalent of route
    /// guards reacting to auth state).
    pub fn subscribe_phase(&self) -> watch::Receiver<AuthPhase> {
        self.phase_tx.subscribe()
    }

    // -------------------------------------------------------------------------
    // Catalog mirrors
    // -------------------------------------------------------------------------

    pub fn customers(&self) -> Vec<Customer> {
        self.catalog
            .read()
            .expect("catalog lock poisoned")
            .customers
            .clone()
    }

    pub fn products(&self) -> Vec<Product> {
        self.catalog
            .read()
            .expect("catalog lock poisoned")
            .products
            .clone()
    }

    pub fn sales(&self) -> Vec<Sale> {
        self.catalog
            .read()
            .expect("catalog lock poisoned")
            .sales
            .clone()
    }

    pub fn expenses(&self) -> Vec<Expense> {
        self.catalog
            .read()
            .expect("catalog lock poisoned")
            .expenses
            .clone()
    }

    pub fn set_customers(&self, customers: Vec<Customer>) {
        self.catalog
            .write()
            .expect("catalog lock poisoned")
            .customers = customers;
    }

    pub fn set_products(&self, products: Vec<Product>) {
        self.catalog.write().expect("catalog lock poisoned").products = products;
    }

    pub fn set_sales(&self, sales: Vec<Sale>) {
        self.catalog.write().expect("catalog lock poisoned").sales = sales;
    }

    pub fn set_expenses(&self, expenses: Vec<Expense>) {
        self.catalog.write().expect("catalog lock poisoned").expenses = expenses;
    }

    /// Appends a customer after a successful insert.
    pub fn push_customer(&self, customer: Customer) {
        self.catalog
            .write()
            .expect("catalog lock poisoned")
            .customers
            .push(customer);
    }

    /// Replaces a customer in place after a successful update.
    pub fn replace_customer(&self, customer: Customer) {
        let mut catalog = self.catalog.write().expect("catalog lock poisoned");
        if let Some(slot) = catalog.customers.iter_mut().find(|c| c.id == customer.id) {
            *slot = customer;
        }
    }

    /// Appends a product after a successful insert.
    pub fn push_product(&self, product: Product) {
        self.catalog
            .write()
            .expect("catalog lock poisoned")
            .products
            .push(product);
    }

    /// Replaces a product in place after a successful update.
    pub fn replace_product(&self, product: Product) {
        let mut catalog = self.catalog.write().expect("catalog lock poisoned");
        if let Some(slot) = catalog.products.iter_mut().find(|p| p.id == product.id) {
            *slot = product;
        }
    }

    /// Drops a product after a successful delete.
    pub fn remove_product(&self, product_id: &str) {
        self.catalog
            .write()
            .expect("catalog lock poisoned")
            .products
            .retain(|p| p.id != product_id);
    }

    /// Prepends a sale (newest first) after a successful checkout.
    pub fn prepend_sale(&self, sale: Sale) {
        self.catalog
            .write()
            .expect("catalog lock poisoned")
            .sales
            .insert(0, sale);
    }

    /// Prepends an expense (newest first) after a successful insert.
    pub fn prepend_expense(&self, expense: Expense) {
        self.catalog
            .write()
            .expect("catalog lock poisoned")
            .expenses
            .insert(0, expense);
    }

    /// Replaces an expense in place after a successful update.
    pub fn replace_expense(&self, expense: Expense) {
        let mut catalog = self.catalog.write().expect("catalog lock poisoned");
        if let Some(slot) = catalog.expenses.iter_mut().find(|e| e.id == expense.id) {
            *slot = expense;
        }
    }

    /// Drops an expense after a successful delete.
    pub fn remove_expense(&self, expense_id: &str) {
        self.catalog
            .write()
            .expect("catalog lock poisoned")
            .expenses
            .retain(|e| e.id != expense_id);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
