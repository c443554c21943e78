//! Hosted backend client
//!
//! One `SupabaseClient` serves as identity provider, profile store and admin
//! store. It owns the current session and publishes session changes on a
//! broadcast channel, the way the hosted JavaScript client notifies its
//! auth-state listeners.

use fc_auth::ProviderEvent;
use fc_common::AuthSession;
use fc_config::BackendConfig;
use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::BackendError;
use crate::persistence::SessionFile;

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub struct SupabaseClient {
    pub(crate) http: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_role_key: Option<String>,
    session: RwLock<Option<AuthSession>>,
    events: broadcast::Sender<ProviderEvent>,
    storage: Option<SessionFile>,
    pub(crate) shutdown_tx: broadcast::Sender<()>,
}

impl SupabaseClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        if config.url.is_empty() {
            return Err(BackendError::Config("backend url is required".to_string()));
        }
        if config.anon_key.is_empty() {
            return Err(BackendError::Config("anon key is required".to_string()));
        }
        if config.timeout_secs == 0 {
            return Err(BackendError::Config("timeout must be greater than zero".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown_tx, _) = broadcast::channel(1);

        let service_role_key = Some(config.service_role_key.clone()).filter(|k| !k.is_empty());
        let storage = Some(config.session_file.as_str())
            .filter(|p| !p.is_empty())
            .map(SessionFile::new);

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            service_role_key,
            session: RwLock::new(None),
            events,
            storage,
            shutdown_tx,
        })
    }

    /// Persist the session to `file` from now on.
    pub fn with_session_file(mut self, file: SessionFile) -> Self {
        self.storage = Some(file);
        self
    }

    /// Session currently held by the client.
    pub fn session(&self) -> Option<AuthSession> {
        self.session.read().clone()
    }

    /// Stop background tasks started by this client.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    pub(crate) fn anon_key(&self) -> &str {
        &self.anon_key
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request carrying the public key and the caller's token (or the public
    /// key again when nobody is signed in).
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let bearer = self
            .session
            .read()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone());
        self.request_as(method, path, &bearer)
    }

    pub(crate) fn request_as(&self, method: Method, path: &str, bearer: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    /// Request authorised with the service-role key, if one is configured.
    pub(crate) fn admin_request(&self, method: Method, path: &str) -> Option<RequestBuilder> {
        let key = self.service_role_key.as_ref()?;
        Some(
            self.http
                .request(method, self.url(path))
                .header("apikey", key)
                .bearer_auth(key),
        )
    }

    pub(crate) fn store_session(&self, session: AuthSession) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save(&session) {
                warn!(path = %storage.path().display(), error = %e, "Failed to persist session");
            }
        }
        *self.session.write() = Some(session);
    }

    pub(crate) fn drop_session(&self) -> Option<AuthSession> {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.clear() {
                warn!(path = %storage.path().display(), error = %e, "Failed to remove persisted session");
            }
        }
        self.session.write().take()
    }

    pub(crate) fn persisted_session(&self) -> Option<AuthSession> {
        self.storage.as_ref().and_then(|s| s.load())
    }

    pub(crate) fn emit(&self, event: ProviderEvent) {
        debug!(kind = %event.kind, "Auth state change");
        // No receivers is fine: nobody is listening yet.
        let _ = self.events.send(event);
    }

    pub(crate) fn event_receiver(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
