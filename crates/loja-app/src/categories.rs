//! # Category Directory
//!
//! One abstraction over the two ways category labels can be sourced.
//!
//! ## Backing Strategies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Category Directory                                  │
//! │                                                                         │
//! │  load() ──► select categories (dedicated table)                         │
//! │               │                                                         │
//! │               ├── ok ───────► Dedicated: its rows are the labels        │
//! │               │               (an empty table is a valid answer)        │
//! │               │                                                         │
//! │               └── failure ──► Derived: distinct non-empty product       │
//! │                               categories already in use, sorted,        │
//! │                               merged with locally added labels          │
//! │                                                                         │
//! │  add(label)                                                             │
//! │    Dedicated: insert into the table; if the insert fails, the label     │
//! │               is kept locally so the operator's entry is not lost       │
//! │    Derived:   local merge only - there is no table to write to          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Labels are deduplicated at read time; nothing enforces uniqueness
//! remotely.

use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tracing::{debug, warn};

use loja_core::error::ValidationError;
use loja_gateway::{DataGateway, Query};

use crate::error::AppResult;
use crate::state::AppState;
use crate::tables;

/// Which backing strategy served the last load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategorySource {
    /// The dedicated `categories` collection.
    Dedicated,
    /// Distinct product categories, derived at read time.
    Derived,
}

/// Tenant-scoped directory of category labels.
pub struct CategoryDirectory {
    data: Arc<dyn DataGateway>,
    state: Arc<AppState>,
    source: Mutex<CategorySource>,
    /// Labels added while no dedicated table was reachable.
    local: Mutex<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct CategoryRow {
    name: String,
}

impl CategoryDirectory {
    pub fn new(data: Arc<dyn DataGateway>, state: Arc<AppState>) -> Self {
        CategoryDirectory {
            data,
            state,
            source: Mutex::new(CategorySource::Derived),
            local: Mutex::new(Vec::new()),
        }
    }

    /// The strategy that served the most recent [`load`](Self::load).
    pub fn source(&self) -> CategorySource {
        *self.source.lock().expect("source lock poisoned")
    }

    /// Loads the category labels for the active store.
    pub async fn load(&self) -> AppResult<Vec<String>> {
        let store = self.state.require_store()?;

        match self
            .data
            .select(
                tables::CATEGORIES,
                &Query::new()
                    .eq("store_id", store.id.as_str())
                    .order_asc("name"),
            )
            .await
        {
            Ok(rows) => {
                let mut names: Vec<String> = rows
                    .into_iter()
                    .filter_map(|row| {
                        serde_json::from_value::<CategoryRow>(row)
                            .ok()
                            .map(|c| c.name)
                    })
                    .collect();
                names.dedup();
                *self.source.lock().expect("source lock poisoned") = CategorySource::Dedicated;
                debug!(count = names.len(), "categories loaded from dedicated table");
                Ok(names)
            }
            Err(e) => {
                warn!(error = %e, "dedicated category table unavailable, deriving from products");
                *self.source.lock().expect("source lock poisoned") = CategorySource::Derived;
                self.derive_from_products(&store.id).await
            }
        }
    }

    /// Fallback: the distinct set of product categories already in use,
    /// merged with locally added labels, sorted.
    async fn derive_from_products(&self, store_id: &str) -> AppResult<Vec<String>> {
        let rows = self
            .data
            .select(tables::PRODUCTS, &Query::new().eq("store_id", store_id))
            .await?;

        let mut names: Vec<String> = rows
            .iter()
            .filter_map(|row| row.get("category"))
            .filter_map(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();

        names.extend(self.local.lock().expect("local lock poisoned").iter().cloned());
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Adds a label to the directory and returns the refreshed list.
    ///
    /// Under the dedicated strategy the label is inserted remotely; if that
    /// insert fails (or under the derived strategy), the label survives as a
    /// local-only entry instead of being lost.
    pub async fn add(&self, name: &str) -> AppResult<Vec<String>> {
        let store = self.state.require_store()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Required {
                field: "category".to_string(),
            }
            .into());
        }

        if self.source() == CategorySource::Dedicated {
            let insert = self
                .data
                .insert(
                    tables::CATEGORIES,
                    vec![serde_json::json!({ "name": name, "store_id": store.id })],
                )
                .await;

            if let Err(e) = insert {
                warn!(error = %e, "category insert failed, keeping label locally");
                self.remember_local(name);
            }
        } else {
            self.remember_local(name);
        }

        self.load().await
    }

    fn remember_local(&self, name: &str) {
        let mut local = self.local.lock().expect("local lock poisoned");
        if !local.iter().any(|l| l == name) {
            local.push(name.to_string());
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
