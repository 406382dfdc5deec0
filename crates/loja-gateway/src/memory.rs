//! # In-Memory Gateway
//!
//! An in-process implementation of the gateway contract backed by plain JSON
//! tables. Behaves like the hosted backend for everything the application
//! layer relies on: filter evaluation, ordering, limiting, child embedding,
//! and server-default columns on insert.
//!
//! ## Uses
//! - Workflow tests in loja-app run end-to-end against this backend.
//! - Local development without a provisioned backend.
//!
//! Failure injection (`fail_table`) makes a chosen table error on every
//! operation, which is how tests exercise fallback paths and mid-checkout
//! aborts.

use std::collections::{HashMap, HashSet};
use std::cmp::Ordering;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{AuthSession, DataGateway, Identity, IdentityGateway};
use crate::query::{Filter, FilterOp, Query};

// =============================================================================
// Memory Gateway
// =============================================================================

/// In-process tables implementing [`DataGateway`] and [`IdentityGateway`].
#[derive(Debug)]
pub struct MemoryGateway {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    failing: Mutex<HashSet<String>>,
    session: Mutex<Option<AuthSession>>,
    identity_tx: watch::Sender<Option<Identity>>,
}

impl MemoryGateway {
    /// Creates an empty gateway with no identity.
    pub fn new() -> Self {
        let (identity_tx, _) = watch::channel(None);
        MemoryGateway {
            tables: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            session: Mutex::new(None),
            identity_tx,
        }
    }

    /// Seeds a table with rows exactly as given (no default filling).
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        self.tables
            .lock()
            .expect("tables lock poisoned")
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Returns a snapshot of a table's rows.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .expect("tables lock poisoned")
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes every operation on `table` fail with a remote error.
    pub fn fail_table(&self, table: &str) {
        self.failing
            .lock()
            .expect("failing lock poisoned")
            .insert(table.to_string());
    }

    /// Removes a previously injected failure.
    pub fn heal_table(&self, table: &str) {
        self.failing
            .lock()
            .expect("failing lock poisoned")
            .remove(table);
    }

    /// Sets the current identity directly, driving the watch channel the way
    /// an external identity-state change would.
    pub fn push_identity(&self, identity: Option<Identity>) {
        let session = identity.clone().map(|identity| AuthSession {
            access_token: "memory-token".to_string(),
            identity,
        });
        *self.session.lock().expect("session lock poisoned") = session;
        self.identity_tx.send_replace(identity);
    }

    fn check_failure(&self, table: &str) -> GatewayResult<()> {
        if self
            .failing
            .lock()
            .expect("failing lock poisoned")
            .contains(table)
        {
            return Err(GatewayError::remote(
                503,
                format!("table '{table}' is unavailable"),
            ));
        }
        Ok(())
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Filter Evaluation
// =============================================================================

/// Orders two JSON scalars. Strings that parse as RFC 3339 timestamps are
/// compared as instants so mixed-precision timestamps order correctly.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => {
            match (
                DateTime::parse_from_rfc3339(a),
                DateTime::parse_from_rfc3339(b),
            ) {
                (Ok(a), Ok(b)) => Some(a.cmp(&b)),
                _ => Some(a.cmp(b)),
            }
        }
        (Value::Number(_), Value::Number(_)) => a.as_f64().partial_cmp(&b.as_f64()),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => a.as_f64() == b.as_f64(),
        _ => a == b,
    }
}

/// Case-insensitive pattern match with `%` wildcards at either end.
fn ilike_match(field: &Value, pattern: &str) -> bool {
    let Some(text) = field.as_str() else {
        return false;
    };
    let text = text.to_lowercase();
    let pattern = pattern.to_lowercase();

    match (pattern.starts_with('%'), pattern.ends_with('%')) {
        (true, true) => text.contains(pattern.trim_matches('%')),
        (true, false) => text.ends_with(pattern.trim_start_matches('%')),
        (false, true) => text.starts_with(pattern.trim_end_matches('%')),
        (false, false) => text == pattern,
    }
}

fn filter_matches(filter: &Filter, row: &Value) -> bool {
    let field = row.get(&filter.column).unwrap_or(&Value::Null);
    match filter.op {
        FilterOp::Eq => values_equal(field, &filter.value),
        FilterOp::Ilike => filter
            .value
            .as_str()
            .is_some_and(|pattern| ilike_match(field, pattern)),
        FilterOp::Gte => matches!(
            compare_values(field, &filter.value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterOp::Lte => matches!(
            compare_values(field, &filter.value),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

fn row_matches(filters: &[Filter], row: &Value) -> bool {
    filters.iter().all(|f| filter_matches(f, row))
}

/// Foreign-key column a child table uses to reference this parent table
/// (`sales` → `sale_id`).
fn parent_fk(parent_table: &str) -> String {
    format!("{}_id", parent_table.trim_end_matches('s'))
}

// =============================================================================
// Server Defaults
// =============================================================================

/// Fills the columns the hosted backend generates on insert.
fn fill_defaults(table: &str, row: &mut Map<String, Value>) {
    if !row.contains_key("id") {
        row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
    }
    if !row.contains_key("created_at") {
        row.insert(
            "created_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
    }
    if table == "sales" && !row.contains_key("sale_date") {
        row.insert(
            "sale_date".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
    }
}

// =============================================================================
// Data Surface
// =============================================================================

#[async_trait]
impl DataGateway for MemoryGateway {
    async fn select(&self, table: &str, query: &Query) -> GatewayResult<Vec<Value>> {
        self.check_failure(table)?;

        let tables = self.tables.lock().expect("tables lock poisoned");
        let mut rows: Vec<Value> = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| row_matches(&query.filters, r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let a = a.get(&order.column).unwrap_or(&Value::Null);
                let b = b.get(&order.column).unwrap_or(&Value::Null);
                let ordering = compare_values(a, b).unwrap_or(Ordering::Equal);
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit as usize);
        }

        if let Some(child_table) = &query.embed {
            let fk = parent_fk(table);
            let children = tables.get(child_table.as_str()).cloned().unwrap_or_default();
            for row in &mut rows {
                let id = row.get("id").cloned().unwrap_or(Value::Null);
                let matching: Vec<Value> = children
                    .iter()
                    .filter(|c| c.get(&fk).is_some_and(|v| values_equal(v, &id)))
                    .cloned()
                    .collect();
                if let Some(object) = row.as_object_mut() {
                    object.insert(child_table.clone(), Value::Array(matching));
                }
            }
        }

        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> GatewayResult<Vec<Value>> {
        self.check_failure(table)?;

        let mut tables = self.tables.lock().expect("tables lock poisoned");
        let stored = tables.entry(table.to_string()).or_default();

        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let Value::Object(mut object) = row else {
                return Err(GatewayError::Decode(format!(
                    "insert into '{table}' expects JSON objects"
                )));
            };
            fill_defaults(table, &mut object);
            let row = Value::Object(object);
            stored.push(row.clone());
            inserted.push(row);
        }

        Ok(inserted)
    }

    async fn update(&self, table: &str, query: &Query, patch: Value) -> GatewayResult<Vec<Value>> {
        self.check_failure(table)?;

        let Value::Object(patch) = patch else {
            return Err(GatewayError::Decode(format!(
                "update on '{table}' expects a JSON object patch"
            )));
        };

        let mut tables = self.tables.lock().expect("tables lock poisoned");
        let rows = tables.entry(table.to_string()).or_default();

        let mut affected = Vec::new();
        for row in rows.iter_mut() {
            if !row_matches(&query.filters, row) {
                continue;
            }
            if let Some(object) = row.as_object_mut() {
                for (key, value) in &patch {
                    object.insert(key.clone(), value.clone());
                }
            }
            affected.push(row.clone());
        }

        Ok(affected)
    }

    async fn delete(&self, table: &str, query: &Query) -> GatewayResult<u64> {
        self.check_failure(table)?;

        let mut tables = self.tables.lock().expect("tables lock poisoned");
        let rows = tables.entry(table.to_string()).or_default();

        let before = rows.len();
        rows.retain(|r| !row_matches(&query.filters, r));
        Ok((before - rows.len()) as u64)
    }
}

// =============================================================================
// Identity Surface
// =============================================================================

#[async_trait]
impl IdentityGateway for MemoryGateway {
    async fn session(&self) -> GatewayResult<Option<AuthSession>> {
        Ok(self.session.lock().expect("session lock poisoned").clone())
    }

    async fn current_identity(&self) -> GatewayResult<Option<Identity>> {
        Ok(self
            .session
            .lock()
            .expect("session lock poisoned")
            .as_ref()
            .map(|s| s.identity.clone()))
    }

    fn subscribe_identity(&self) -> watch::Receiver<Option<Identity>> {
        self.identity_tx.subscribe()
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> GatewayResult<AuthSession> {
        if password.is_empty() {
            return Err(GatewayError::Unauthorized(
                "Invalid login credentials".to_string(),
            ));
        }

        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
        };
        let session = AuthSession {
            access_token: "memory-token".to_string(),
            identity: identity.clone(),
        };

        *self.session.lock().expect("session lock poisoned") = Some(session.clone());
        self.identity_tx.send_replace(Some(identity));
        Ok(session)
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        self.push_identity(None);
        Ok(())
    }

    async fn probe(&self) -> GatewayResult<u16> {
        Ok(200)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
