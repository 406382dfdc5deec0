//! # Query Filter Language
//!
//! The filter language every collection read/write speaks: equality, pattern
//! match, range, ordering, limiting, and child-row embedding.
//!
//! ## Builder
//! ```rust
//! use loja_gateway::query::Query;
//!
//! let query = Query::new()
//!     .eq("store_id", "store-1")
//!     .gte("sale_date", "2026-03-01T00:00:00Z")
//!     .lte("sale_date", "2026-03-31T23:59:59Z")
//!     .order_desc("sale_date")
//!     .limit(100)
//!     .embed("sale_items");
//! ```
//!
//! ## Wire Encoding
//! `to_params` encodes for the REST gateway's query string
//! (`col=eq.value`, `order=col.desc`, `limit=100`,
//! `select=*,sale_items(*)`); the in-memory backend evaluates the same
//! structure directly against JSON rows.

use serde_json::Value;

// =============================================================================
// Filters
// =============================================================================

/// Comparison operator of one filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Exact equality.
    Eq,
    /// Case-insensitive pattern match; `%` is the wildcard.
    Ilike,
    /// Greater than or equal.
    Gte,
    /// Less than or equal.
    Lte,
}

impl FilterOp {
    /// Wire name of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ilike => "ilike",
            FilterOp::Gte => "gte",
            FilterOp::Lte => "lte",
        }
    }
}

/// One column filter.
#[derive(Debug, Clone)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

/// Result ordering.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

// =============================================================================
// Query
// =============================================================================

/// A filtered collection operation. Built once, consumed by whichever
/// backend executes it.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<u64>,
    /// Child table whose rows are attached to each result row.
    pub embed: Option<String>,
}

impl Query {
    /// Creates an empty query (matches every row).
    pub fn new() -> Self {
        Query::default()
    }

    fn filter(mut self, column: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    /// Adds an equality filter.
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Eq, value)
    }

    /// Adds a case-insensitive pattern filter (`%` wildcards).
    pub fn ilike(self, column: &str, pattern: impl Into<String>) -> Self {
        self.filter(column, FilterOp::Ilike, Value::String(pattern.into()))
    }

    /// Adds a greater-than-or-equal filter.
    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Gte, value)
    }

    /// Adds a less-than-or-equal filter.
    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Lte, value)
    }

    /// Orders results ascending by a column.
    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            ascending: true,
        });
        self
    }

    /// Orders results descending by a column.
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            ascending: false,
        });
        self
    }

    /// Caps the number of returned rows.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Attaches each row's child rows from `child_table` (the child's
    /// foreign key is derived from the parent table name).
    pub fn embed(mut self, child_table: &str) -> Self {
        self.embed = Some(child_table.to_string());
        self
    }

    /// Encodes only the filters (used by update/delete, which take no
    /// ordering, limit, or embedding).
    pub fn filter_params(&self) -> Vec<(String, String)> {
        self.filters
            .iter()
            .map(|f| {
                (
                    f.column.clone(),
                    format!("{}.{}", f.op.as_str(), encode_value(&f.value)),
                )
            })
            .collect()
    }

    /// Encodes the full query string for a select.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        let select = match &self.embed {
            Some(child) => format!("*,{child}(*)"),
            None => "*".to_string(),
        };
        params.push(("select".to_string(), select));

        params.extend(self.filter_params());

        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }

        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }
}

/// Encodes a filter value for the query string. Strings go raw (the HTTP
/// layer percent-encodes them); everything else uses its JSON rendering.
fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_encoding() {
        let query = Query::new()
            .eq("store_id", "store-1")
            .gte("sale_date", "2026-03-01T00:00:00Z")
            .order_desc("sale_date")
            .limit(100);

        let params = query.to_params();
        assert_eq!(
            params,
            vec![
                ("select".to_string(), "*".to_string()),
                ("store_id".to_string(), "eq.store-1".to_string()),
                ("sale_date".to_string(), "gte.2026-03-01T00:00:00Z".to_string()),
                ("order".to_string(), "sale_date.desc".to_string()),
                ("limit".to_string(), "100".to_string()),
            ]
        );
    }

    #[test]
    fn test_embed_select_clause() {
        let params = Query::new().embed("sale_items").to_params();
        assert_eq!(params[0], ("select".to_string(), "*,sale_items(*)".to_string()));
    }

    #[test]
    fn test_non_string_values() {
        let params = Query::new()
            .eq("active", true)
            .lte("stock_quantity", 5)
            .filter_params();

        assert_eq!(
            params,
            vec![
                ("active".to_string(), "eq.true".to_string()),
                ("stock_quantity".to_string(), "lte.5".to_string()),
            ]
        );
    }

    #[test]
    fn test_ilike_pattern() {
        let params = Query::new().ilike("name", "%coffee%").filter_params();
        assert_eq!(params[0].1, "ilike.%coffee%");
    }
}
