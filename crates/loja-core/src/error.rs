//! # Error Types
//!
//! Domain-specific error types for loja-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  loja-core errors (this file)                                          │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── CheckoutError    - Cart-to-sale planning failures                 │
//! │                                                                         │
//! │  loja-gateway errors (separate crate)                                  │
//! │  └── GatewayError     - Remote gateway failures                        │
//! │                                                                         │
//! │  loja-app errors                                                       │
//! │  └── AppError         - What the UI layer sees                         │
//! │                                                                         │
//! │  Flow: ValidationError / CheckoutError / GatewayError → AppError       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These block a submission locally, before any remote call is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g. malformed tax id).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Checkout Error
// =============================================================================

/// Failures while planning a checkout from the current cart.
///
/// The stock and discount variants only occur when the corresponding
/// [`crate::checkout::CheckoutPolicy`] guard is enabled; both guards are
/// off by default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// Checkout requires a non-empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Requested quantity exceeds the stock snapshot.
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Line discount exceeds the line subtotal.
    #[error("Discount on {name} ({discount_cents}c) exceeds line subtotal ({subtotal_cents}c)")]
    DiscountExceedsLine {
        name: String,
        discount_cents: i64,
        subtotal_cents: i64,
    },
}

// =============================================================================
// Unit Tests
// =============================================================================
