//! # REST Gateway
//!
//! The hosted-backend implementation of the gateway contract: table CRUD
//! against the REST data API and identity operations against the auth API.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       REST Gateway Surface                              │
//! │                                                                         │
//! │  Data:      {base}/rest/v1/{table}?col=eq.v&order=col.desc&limit=n      │
//! │             GET     select   (select=*,child(*) for embedding)          │
//! │             POST    insert   (Prefer: return=representation)            │
//! │             PATCH   update   (filters in query string)                  │
//! │             DELETE  delete                                              │
//! │                                                                         │
//! │  Identity:  POST {base}/auth/v1/token?grant_type=password               │
//! │             POST {base}/auth/v1/logout                                  │
//! │             GET  {base}/auth/v1/settings   (connectivity probe, 8 s)    │
//! │                                                                         │
//! │  Headers:   apikey: <anon key>                                          │
//! │             authorization: Bearer <session token, else anon key>        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bounded Waits
//! Every data call inherits the 30 s client timeout; the connectivity probe
//! overrides it with 8 s. A hung backend therefore surfaces as
//! [`GatewayError::Timeout`], never as an indefinite wait.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{AuthSession, DataGateway, Identity, IdentityGateway};
use crate::query::Query;

/// Client-wide timeout for data operations.
const DATA_TIMEOUT: Duration = Duration::from_secs(30);

/// Short timeout for the connectivity probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(8);

// =============================================================================
// Rest Gateway
// =============================================================================

/// Gateway client for the hosted backend.
#[derive(Debug)]
pub struct RestGateway {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: RwLock<Option<AuthSession>>,
    identity_tx: watch::Sender<Option<Identity>>,
}

impl RestGateway {
    /// Creates a gateway client from a validated configuration.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(DATA_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let (identity_tx, _) = watch::channel(None);

        Ok(RestGateway {
            http,
            base_url: config.url,
            anon_key: config.anon_key,
            session: RwLock::new(None),
            identity_tx,
        })
    }

    /// Creates a gateway client configured from the environment.
    pub fn from_env() -> GatewayResult<Self> {
        RestGateway::new(GatewayConfig::from_env()?)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Bearer token: the session token when signed in, the anon key
    /// otherwise.
    fn bearer(&self) -> String {
        let session = self.session.read().expect("session lock poisoned");
        match session.as_ref() {
            Some(s) => s.access_token.clone(),
            None => self.anon_key.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
    }

    fn set_session(&self, new: Option<AuthSession>) {
        let identity = new.as_ref().map(|s| s.identity.clone());
        *self.session.write().expect("session lock poisoned") = new;
        // send_replace never fails, even with no live subscribers
        self.identity_tx.send_replace(identity);
    }

    /// Decodes a row-set response, mapping non-2xx bodies to structured
    /// remote errors.
    async fn handle_rows(response: reqwest::Response) -> GatewayResult<Vec<Value>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(remote_error(status.as_u16(), &body));
        }

        // Writes without representation come back empty
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<Value> = serde_json::from_str(&body)?;
        Ok(rows)
    }
}

/// Maps a non-2xx response body to a [`GatewayError`]. The REST API reports
/// failures as `{"message": ..., "code": ...}`; the auth API uses
/// `error_description` / `msg`.
fn remote_error(status: u16, body: &str) -> GatewayError {
    #[derive(Deserialize, Default)]
    struct ErrorBody {
        message: Option<String>,
        msg: Option<String>,
        error_description: Option<String>,
        code: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.msg)
        .or(parsed.error_description)
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        401 | 403 => GatewayError::Unauthorized(message),
        _ => GatewayError::Remote {
            status,
            code: parsed.code,
            message,
        },
    }
}

// =============================================================================
// Data Surface
// =============================================================================

#[async_trait]
impl DataGateway for RestGateway {
    async fn select(&self, table: &str, query: &Query) -> GatewayResult<Vec<Value>> {
        debug!(table, filters = query.filters.len(), "gateway select");

        let response = self
            .request(reqwest::Method::GET, self.table_url(table))
            .query(&query.to_params())
            .send()
            .await?;

        Self::handle_rows(response).await
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> GatewayResult<Vec<Value>> {
        debug!(table, count = rows.len(), "gateway insert");

        let response = self
            .request(reqwest::Method::POST, self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;

        Self::handle_rows(response).await
    }

    async fn update(&self, table: &str, query: &Query, patch: Value) -> GatewayResult<Vec<Value>> {
        debug!(table, filters = query.filters.len(), "gateway update");

        let response = self
            .request(reqwest::Method::PATCH, self.table_url(table))
            .header("Prefer", "return=representation")
            .query(&query.filter_params())
            .json(&patch)
            .send()
            .await?;

        Self::handle_rows(response).await
    }

    async fn delete(&self, table: &str, query: &Query) -> GatewayResult<u64> {
        debug!(table, filters = query.filters.len(), "gateway delete");

        let response = self
            .request(reqwest::Method::DELETE, self.table_url(table))
            .header("Prefer", "return=representation")
            .query(&query.filter_params())
            .send()
            .await?;

        let rows = Self::handle_rows(response).await?;
        Ok(rows.len() as u64)
    }
}

// =============================================================================
// Identity Surface
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: RemoteUser,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: String,
    email: Option<String>,
}

#[async_trait]
impl IdentityGateway for RestGateway {
    async fn session(&self) -> GatewayResult<Option<AuthSession>> {
        Ok(self.session.read().expect("session lock poisoned").clone())
    }

    async fn current_identity(&self) -> GatewayResult<Option<Identity>> {
        Ok(self
            .session
            .read()
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
        let response = self
            .http
            .post(self.auth_url("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(remote_error(status.as_u16(), &body));
        }

        let token: TokenResponse = response.json().await?;
        let session = AuthSession {
            access_token: token.access_token,
            identity: Identity {
                id: token.user.id,
                email: token.user.email,
            },
        };

        self.set_session(Some(session.clone()));
        debug!(identity = %session.identity.id, "signed in");
        Ok(session)
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        let result = self
            .request(reqwest::Method::POST, self.auth_url("logout"))
            .send()
            .await;

        // The local session is gone no matter what the backend said.
        self.set_session(None);

        match result {
            Ok(response) if !response.status().is_success() => {
                warn!(status = %response.status(), "remote sign-out rejected");
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(error = %e, "remote sign-out failed");
                Ok(())
            }
        }
    }

    async fn probe(&self) -> GatewayResult<u16> {
        let response = self
            .http
            .get(self.auth_url("settings"))
            .header("apikey", &self.anon_key)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await?;

        Ok(response.status().as_u16())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
