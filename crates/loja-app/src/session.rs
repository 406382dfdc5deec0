//! # Session & Tenant Resolution
//!
//! Resolves "who is signed in" and "which store do they own" - on startup
//! and again on every identity change pushed by the gateway.
//!
//! ## Resolution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Session & Tenant Resolution                           │
//! │                                                                         │
//! │  start() / identity change                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  identity present? ──no──► clear state, phase = SignedOut               │
//! │       │ yes                                                             │
//! │       ▼                                                                 │
//! │  select stores where owner_id = identity                                │
//! │         order by created_at asc, limit 1                                │
//! │       │                                                                 │
//! │       ├── one row ──► that IS the store, phase = SignedIn               │
//! │       ├── no rows ──► signed in, tenant-less: every tenant-scoped       │
//! │       │               write is refused by the store guard               │
//! │       └── failure ──► logged, treated identically to "no identity"      │
//! │                       (never a hang - all gateway calls have bounded    │
//! │                        waits)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use loja_core::types::{Store, StoreProfile};
use loja_core::validation::validate_store_profile;
use loja_gateway::{DataGateway, Identity, IdentityGateway, Query};

use crate::error::AppResult;
use crate::rows::decode_single;
use crate::state::{AppState, AuthPhase};
use crate::tables;

/// Resolves and maintains the session slot of [`AppState`].
pub struct SessionService {
    auth: Arc<dyn IdentityGateway>,
    data: Arc<dyn DataGateway>,
    state: Arc<AppState>,
}

impl SessionService {
    pub fn new(
        auth: Arc<dyn IdentityGateway>,
        data: Arc<dyn DataGateway>,
        state: Arc<AppState>,
    ) -> Self {
        SessionService { auth, data, state }
    }

    /// Startup resolution: read the current identity and resolve its store.
    /// A failure here is treated as "no identity" so startup never hangs on
    /// a dead backend.
    pub async fn start(&self) {
        let identity = match self.auth.current_identity().await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "identity resolution failed, treating as signed out");
                None
            }
        };
        self.apply_identity(identity).await;
    }

    /// Spawns the listener that re-resolves on every identity change pushed
    /// by the gateway. The task ends when the gateway drops its sender.
    pub fn spawn_watcher(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let service = Arc::clone(self);
        let mut rx = service.auth.subscribe_identity();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let identity = rx.borrow_and_update().clone();
                service.apply_identity(identity).await;
            }
            debug!("identity watcher stopped");
        })
    }

    /// Applies one observed identity value to the application state.
    pub(crate) async fn apply_identity(&self, identity: Option<Identity>) {
        let Some(identity) = identity else {
            self.state.clear_session();
            self.state.set_phase(AuthPhase::SignedOut);
            info!("signed out, session cleared");
            return;
        };

        match self.resolve_store(&identity).await {
            Ok(store) => {
                if let Some(store) = &store {
                    info!(store_id = %store.id, "store resolved");
                } else {
                    warn!(identity = %identity.id, "identity owns no store");
                }
                self.state.set_identity(Some(identity));
                self.state.set_store(store);
                self.state.set_phase(AuthPhase::SignedIn);
            }
            Err(e) => {
                warn!(error = %e, "store resolution failed, treating as signed out");
                self.state.clear_session();
                self.state.set_phase(AuthPhase::SignedOut);
            }
        }
    }

    /// Looks up the store owned by an identity: first match in a stable
    /// order (oldest row wins).
    async fn resolve_store(&self, identity: &Identity) -> AppResult<Option<Store>> {
        let rows = self
            .data
            .select(
                tables::STORES,
                &Query::new()
                    .eq("owner_id", identity.id.as_str())
                    .order_asc("created_at")
                    .limit(1),
            )
            .await?;

        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    /// Authenticates and resolves the session in one step.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        let session = self.auth.sign_in_with_password(email, password).await?;
        self.apply_identity(Some(session.identity.clone())).await;
        Ok(session.identity)
    }

    /// Ends the session: remote sign-out, then clear identity, store, and
    /// all catalog mirrors.
    pub async fn sign_out(&self) -> AppResult<()> {
        self.auth.sign_out().await?;
        self.state.clear_session();
        self.state.set_phase(AuthPhase::SignedOut);
        Ok(())
    }

    /// Connectivity probe with a short bounded wait; returns the identity
    /// service's HTTP status.
    pub async fn probe(&self) -> AppResult<u16> {
        Ok(self.auth.probe().await?)
    }

    /// Creates the store for a first-run identity and makes it active.
    pub async fn create_store(&self, profile: StoreProfile) -> AppResult<Store> {
        let identity = self.state.require_identity()?;
        validate_store_profile(&profile)?;

        let mut row = serde_json::to_value(&profile)?;
        if let Some(object) = row.as_object_mut() {
            object.insert(
                "owner_id".to_string(),
                serde_json::Value::String(identity.id.clone()),
            );
        }

        let inserted = self.data.insert(tables::STORES, vec![row]).await?;
        let store: Store = decode_single(inserted)?;

        info!(store_id = %store.id, "store created");
        self.state.set_store(Some(store.clone()));
        Ok(store)
    }

    /// Updates the active store's profile (settings screen) and the
    /// in-memory tenant.
    pub async fn update_store_settings(&self, profile: StoreProfile) -> AppResult<Store> {
        let store = self.state.require_store()?;
        validate_store_profile(&profile)?;

        let patch = serde_json::to_value(&profile)?;
        let affected = self
            .data
            .update(
                tables::STORES,
                &Query::new().eq("id", store.id.as_str()),
                patch,
            )
            .await?;
        let updated: Store = decode_single(affected)?;

        info!(store_id = %updated.id, "store settings updated");
        self.state.set_store(Some(updated.clone()));
        Ok(updated)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use loja_gateway::MemoryGateway;
    use serde_json::json;

    fn service() -> (Arc<MemoryGateway>, Arc<AppState>, Arc<SessionService>) {
        let gateway = Arc::new(MemoryGateway::new());
        let state = Arc::new(AppState::new());
        let service = Arc::new(SessionService::new(
            gateway.clone(),
            gateway.clone(),
            state.clone(),
        ));
        (gateway, state, service)
    }

    fn identity(id: &str) -> Identity {
        Identity {
            id: id.to_string(),
            email: Some(format!("{id}@example.com")),
        }
    }

    fn store_row(id: &str, owner: &str, created_at: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": format!("Store {id}"),
            "tax_id": null,
            "address": null,
            "phone": null,
            "owner_id": owner,
            "created_at": created_at,
        })
    }

    #[tokio::test]
    async fn test_start_without_identity_signs_out() {
        let (_, state, service) = service();

        service.start().await;

        assert_eq!(state.phase(), AuthPhase::SignedOut);
        assert!(state.identity().is_none());
    }

    #[tokio::test]
    async fn test_resolution_picks_first_store_by_created_at() {
        let (gateway, state, service) = service();
        gateway.seed(
            tables::STORES,
            vec![
                store_row("newer", "user-1", "2026-02-01T00:00:00Z"),
                store_row("older", "user-1", "2025-01-01T00:00:00Z"),
                store_row("other", "user-2", "2024-01-01T00:00:00Z"),
            ],
        );
        gateway.push_identity(Some(identity("user-1")));

        service.start().await;

        assert_eq!(state.phase(), AuthPhase::SignedIn);
        assert_eq!(state.store().unwrap().id, "older");
    }

    #[tokio::test]
    async fn test_tenant_less_identity_stays_signed_in_without_store() {
        let (gateway, state, service) = service();
        gateway.push_identity(Some(identity("user-1")));

        service.start().await;

        assert_eq!(state.phase(), AuthPhase::SignedIn);
        assert!(state.identity().is_some());
        assert!(state.store().is_none());
        // and the store guard refuses tenant-scoped work
        assert!(state.require_store().is_err());
    }

    #[tokio::test]
    async fn test_resolution_failure_is_treated_as_signed_out() {
        let (gateway, state, service) = service();
        gateway.fail_table(tables::STORES);
        gateway.push_identity(Some(identity("user-1")));

        service.start().await;

        assert_eq!(state.phase(), AuthPhase::SignedOut);
        assert!(state.identity().is_none());
    }

    #[tokio::test]
    async fn test_watcher_reacts_to_identity_changes() {
        let (gateway, state, service) = service();
        gateway.seed(
            tables::STORES,
            vec![store_row("store-1", "user-1", "2026-01-01T00:00:00Z")],
        );

        let mut phases = state.subscribe_phase();
        let _watcher = service.spawn_watcher();

        gateway.push_identity(Some(identity("user-1")));
        phases.changed().await.unwrap();
        assert_eq!(*phases.borrow_and_update(), AuthPhase::SignedIn);
        assert_eq!(state.store().unwrap().id, "store-1");

        gateway.push_identity(None);
        phases.changed().await.unwrap();
        assert_eq!(*phases.borrow_and_update(), AuthPhase::SignedOut);
        assert!(state.store().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_everything() {
        let (gateway, state, service) = service();
        gateway.seed(
            tables::STORES,
            vec![store_row("store-1", "user-1", "2026-01-01T00:00:00Z")],
        );
        gateway.push_identity(Some(identity("user-1")));
        service.start().await;
        assert_eq!(state.phase(), AuthPhase::SignedIn);

        service.sign_out().await.unwrap();

        assert_eq!(state.phase(), AuthPhase::SignedOut);
        assert!(state.identity().is_none());
        assert!(state.store().is_none());
    }

    #[tokio::test]
    async fn test_create_store_requires_identity() {
        let (_, _, service) = service();

        let err = service
            .create_store(StoreProfile {
                name: "Corner Shop".to_string(),
                tax_id: None,
                address: None,
                phone: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, crate::error::AppError::NotSignedIn));
    }

    #[tokio::test]
    async fn test_update_store_settings() {
        let (gateway, state, service) = service();
        gateway.seed(
            tables::STORES,
            vec![store_row("store-1", "user-1", "2026-01-01T00:00:00Z")],
        );
        gateway.push_identity(Some(identity("user-1")));
        service.start().await;

        let updated = service
            .update_store_settings(StoreProfile {
                name: "Renamed Shop".to_string(),
                tax_id: Some("12345678000195".to_string()),
                address: Some("Main St 1".to_string()),
                phone: None,
            })
            .await
            .unwrap();

        assert_eq!(updated.name, "Renamed Shop");
        assert_eq!(state.store().unwrap().name, "Renamed Shop");
        assert_eq!(
            gateway.rows(tables::STORES)[0]["name"],
            "Renamed Shop"
        );
    }

    #[tokio::test]
    async fn test_update_store_settings_rejects_bad_tax_id_locally() {
        let (gateway, _, service) = service();
        gateway.seed(
            tables::STORES,
            vec![store_row("store-1", "user-1", "2026-01-01T00:00:00Z")],
        );
        gateway.push_identity(Some(identity("user-1")));
        service.start().await;

        let err = service
            .update_store_settings(StoreProfile {
                name: "Shop".to_string(),
                tax_id: Some("123".to_string()),
                address: None,
                phone: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, crate::error::AppError::Validation(_)));
        // nothing was written remotely
        assert_eq!(gateway.rows(tables::STORES)[0]["name"], "Store store-1");
    }
}
