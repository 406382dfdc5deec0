//! # loja-app: Application Layer for Loja
//!
//! The headless orchestration layer a UI sits on.
//!
//! ## Module Organization
//! ```text
//! loja_app/
//! ├── lib.rs          ◄─── You are here (wiring + tracing setup)
//! ├── state.rs        ◄─── AppState: session slot + catalog mirrors
//! ├── session.rs      ◄─── Session & tenant resolution
//! ├── catalog.rs      ◄─── Customers / products / expenses CRUD
//! ├── categories.rs   ◄─── Category directory (dedicated | derived)
//! ├── checkout.rs     ◄─── Cart state + the commit write sequence
//! ├── reports.rs      ◄─── Report and dashboard fetch + fold
//! ├── tables.rs       ◄─── Remote collection names
//! ├── rows.rs         ◄─── Row decoding + tenant stamping helpers
//! └── error.rs        ◄─── AppError
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Application Startup                                │
//! │                                                                         │
//! │  1. Initialize Logging ───────────────────────────────────────────────► │
//! │     • tracing-subscriber with env filter (RUST_LOG)                     │
//! │                                                                         │
//! │  2. Read Gateway Configuration ───────────────────────────────────────► │
//! │     • LOJA_GATEWAY_URL + LOJA_GATEWAY_ANON_KEY                          │
//! │     • missing/invalid ⇒ visible ConfigError, startup blocked            │
//! │                                                                         │
//! │  3. Build Services ───────────────────────────────────────────────────► │
//! │     • one AppState container injected into every service                │
//! │                                                                         │
//! │  4. Resolve Session ──────────────────────────────────────────────────► │
//! │     • session.start() + spawn_watcher() for identity changes            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod categories;
pub mod checkout;
pub mod error;
pub mod reports;
pub mod session;
pub mod state;
pub mod tables;

mod rows;

// =============================================================================
// Re-exports
// =============================================================================

pub use catalog::CatalogService;
pub use categories::{CategoryDirectory, CategorySource};
pub use checkout::CheckoutService;
pub use error::{AppError, AppResult};
pub use reports::ReportService;
pub use session::SessionService;
pub use state::{AppState, AuthPhase};

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use loja_gateway::{DataGateway, GatewayError, IdentityGateway, RestGateway};

// =============================================================================
// Application Wiring
// =============================================================================

/// The fully wired application: one shared state container and the services
/// operating on it.
pub struct Loja {
    pub state: Arc<AppState>,
    pub session: Arc<SessionService>,
    pub catalog: CatalogService,
    pub categories: CategoryDirectory,
    pub checkout: CheckoutService,
    pub reports: ReportService,
}

impl std::fmt::Debug for Loja {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loja").finish_non_exhaustive()
    }
}

impl Loja {
    /// Wires the services against any pair of gateway implementations.
    pub fn new(auth: Arc<dyn IdentityGateway>, data: Arc<dyn DataGateway>) -> Self {
        let state = Arc::new(AppState::new());
        Loja {
            session: Arc::new(SessionService::new(auth, data.clone(), state.clone())),
            catalog: CatalogService::new(data.clone(), state.clone()),
            categories: CategoryDirectory::new(data.clone(), state.clone()),
            checkout: CheckoutService::new(data.clone(), state.clone()),
            reports: ReportService::new(data, state.clone()),
            state,
        }
    }

    /// Wires against the hosted backend configured by the environment.
    /// A missing endpoint or key surfaces here, before any I/O happens.
    pub fn from_env() -> Result<Self, GatewayError> {
        let gateway = Arc::new(RestGateway::from_env()?);
        Ok(Loja::new(gateway.clone(), gateway))
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - show debug messages
/// - `RUST_LOG=loja=trace` - trace for loja crates only
/// - Default: INFO level
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,loja=debug"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// =============================================================================
// Unit Tests
// =============================================================================
