//! # Application Error Type
//!
//! Unified error type for application workflows.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Error Flow in Loja                                 │
//! │                                                                         │
//! │  ValidationError ──┐                                                    │
//! │  CheckoutError ────┼──► AppError ──► surfaced as a plain-language       │
//! │  GatewayError ─────┘                 failure notice by the UI           │
//! │                                                                         │
//! │  Failures are handled at the workflow step that issued the call.        │
//! │  They never propagate as a panic, and local mirrors are only mutated    │
//! │  after the corresponding remote write succeeded.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use loja_core::error::{CheckoutError, ValidationError};
use loja_gateway::GatewayError;

/// Application-level error, the type every workflow returns.
#[derive(Debug, Error)]
pub enum AppError {
    /// The operation requires an authenticated identity.
    #[error("Not signed in")]
    NotSignedIn,

    /// The operation is tenant-scoped but no store is active. Writes
    /// guarded by this never reach the gateway.
    #[error("No active store")]
    NoActiveStore,

    /// Local input validation failed; nothing was sent remotely.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Checkout planning failed; nothing was sent remotely.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The guarded stock decrement matched no row: another session consumed
    /// the stock after this cart snapshotted it. Earlier checkout writes
    /// remain committed (there is no rollback); remaining steps are
    /// aborted.
    #[error("Stock changed for product {product_id} during checkout")]
    StockConflict { product_id: String },

    /// A remote gateway call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A remote row did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

/// Result type for application workflows.
pub type AppResult<T> = Result<T, AppError>;
