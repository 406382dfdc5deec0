//! # loja-gateway: Remote Data Gateway Client
//!
//! This crate provides access to the hosted backend for Loja: identity
//! operations and generic per-table CRUD with a filter language.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Loja Data Flow                                   │
//! │                                                                         │
//! │  loja-app workflow (checkout commit, report fetch, ...)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  loja-gateway (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    Query      │    │  RestGateway  │    │ MemoryGateway│  │   │
//! │  │   │  (query.rs)   │    │  (rest.rs)    │    │ (memory.rs)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ eq/ilike/gte/ │───►│ reqwest, 30s  │    │ JSON tables, │  │   │
//! │  │   │ lte/order/    │    │ timeout, 8s   │    │ same filter  │  │   │
//! │  │   │ limit/embed   │───►│ probe         │    │ semantics    │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────┬───────┘  │   │
//! │  │                                │                   │          │   │
//! │  │            both implement IdentityGateway + DataGateway       │   │
//! │  └────────────────────────────────┼───────────────────┼──────────┘   │
//! │                                   ▼                   ▼               │
//! │                          hosted backend        in-process tables      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - endpoint + API key configuration from environment
//! - [`query`] - the filter language and its wire encoding
//! - [`gateway`] - the abstract contract (traits + identity types)
//! - [`rest`] - hosted-backend implementation over HTTP
//! - [`memory`] - in-process implementation for tests and development
//! - [`error`] - gateway error taxonomy

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod query;
pub mod rest;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, GatewayConfig};
pub use error::{GatewayError, GatewayResult};
pub use gateway::{AuthSession, DataGateway, Identity, IdentityGateway};
pub use memory::MemoryGateway;
pub use query::Query;
pub use rest::RestGateway;
