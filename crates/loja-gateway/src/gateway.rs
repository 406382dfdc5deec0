//! # Gateway Contract
//!
//! The abstract contract every storage backend must honor, split into an
//! identity surface and a data surface.
//!
//! ## Why Traits Here?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Gateway Seam                                       │
//! │                                                                         │
//! │            IdentityGateway  +  DataGateway (dyn traits)                 │
//! │                     ▲                  ▲                                │
//! │            ┌────────┴──────┐  ┌────────┴────────┐                       │
//! │            │  RestGateway  │  │  MemoryGateway  │                       │
//! │            │  (hosted      │  │  (in-process    │                       │
//! │            │   backend)    │  │   tables)       │                       │
//! │            └───────────────┘  └─────────────────┘                       │
//! │                                                                         │
//! │  Workflows in loja-app hold Arc<dyn ...> and never know which           │
//! │  implementation is behind the calls.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::error::GatewayResult;
use crate::query::Query;

// =============================================================================
// Identity Types
// =============================================================================

/// The authenticated identity as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: Option<String>,
}

/// An authenticated session: the bearer token plus the identity it belongs
/// to. Held in memory only; nothing is persisted on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub identity: Identity,
}

// =============================================================================
// Identity Gateway
// =============================================================================

/// Identity operations of the hosted backend.
///
/// Identity changes are delivered through a `watch` channel: subscribers
/// always observe the latest value and are woken on every transition
/// (sign-in, sign-out, expiry).
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Returns the current session, if any.
    async fn session(&self) -> GatewayResult<Option<AuthSession>>;

    /// Returns the current identity, if any.
    async fn current_identity(&self) -> GatewayResult<Option<Identity>>;

    /// Subscribes to identity changes.
    fn subscribe_identity(&self) -> watch::Receiver<Option<Identity>>;

    /// Authenticates with email + password and opens a session.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> GatewayResult<AuthSession>;

    /// Ends the current session. Local session state is cleared even when
    /// the remote call fails.
    async fn sign_out(&self) -> GatewayResult<()>;

    /// Connectivity probe with a short bounded wait. Returns the HTTP
    /// status of the identity service's settings endpoint.
    async fn probe(&self) -> GatewayResult<u16>;
}

// =============================================================================
// Data Gateway
// =============================================================================

/// Generic table operations. Rows travel as JSON objects; typed decoding
/// happens at the application layer.
#[async_trait]
pub trait DataGateway: Send + Sync {
    /// Reads rows matching the query (filters, order, limit, embedding).
    async fn select(&self, table: &str, query: &Query) -> GatewayResult<Vec<Value>>;

    /// Inserts one or many rows, returning them with server-generated
    /// columns filled in.
    async fn insert(&self, table: &str, rows: Vec<Value>) -> GatewayResult<Vec<Value>>;

    /// Patches all rows matching the query's filters, returning the
    /// affected rows. An empty result means nothing matched.
    async fn update(&self, table: &str, query: &Query, patch: Value) -> GatewayResult<Vec<Value>>;

    /// Deletes all rows matching the query's filters, returning the count.
    async fn delete(&self, table: &str, query: &Query) -> GatewayResult<u64>;
}
