//! Test doubles shared by the fc-auth integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Notify};

use fc_auth::{IdentityProvider, ProfileLoader, ProfileStore, ProviderError, ProviderEvent, SessionStore};
use fc_common::{AuthSession, Company, Identity, Profile, Role, StoreError, StoreResult};

pub fn auth(id: &str) -> AuthSession {
    AuthSession::new(format!("token-{id}"), Identity::new(id, format!("{id}@exemplo.com")))
}

pub fn company(owner: &str, active: bool) -> Company {
    Company {
        id: format!("company-{owner}"),
        owning_identity_id: owner.to_string(),
        name: "Sorveteria Gelato".to_string(),
        email: format!("{owner}@exemplo.com"),
        whatsapp: "21998765432".to_string(),
        address: Some("Rua das Flores, 10".to_string()),
        plan_id: None,
        active,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Provider that records calls and emits events like the hosted service.
pub struct MockProvider {
    events: broadcast::Sender<ProviderEvent>,
    pub current: parking_lot::Mutex<Option<AuthSession>>,
    pub current_error: parking_lot::Mutex<Option<ProviderError>>,
    pub sign_in_error: parking_lot::Mutex<Option<ProviderError>>,
    pub sign_out_error: parking_lot::Mutex<Option<ProviderError>>,
    pub recovery_error: parking_lot::Mutex<Option<ProviderError>>,
    pub update_error: parking_lot::Mutex<Option<ProviderError>>,
    pub sign_in_emails: parking_lot::Mutex<Vec<String>>,
    pub recovery_requests: parking_lot::Mutex<Vec<(String, String)>>,
    pub sign_out_calls: AtomicU32,
}

impl MockProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            events,
            current: parking_lot::Mutex::new(None),
            current_error: parking_lot::Mutex::new(None),
            sign_in_error: parking_lot::Mutex::new(None),
            sign_out_error: parking_lot::Mutex::new(None),
            recovery_error: parking_lot::Mutex::new(None),
            update_error: parking_lot::Mutex::new(None),
            sign_in_emails: parking_lot::Mutex::new(Vec::new()),
            recovery_requests: parking_lot::Mutex::new(Vec::new()),
            sign_out_calls: AtomicU32::new(0),
        }
    }

    pub fn with_session(session: AuthSession) -> Self {
        let provider = Self::new();
        *provider.current.lock() = Some(session);
        provider
    }

    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    pub fn sign_outs(&self) -> u32 {
        self.sign_out_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn current_session(&self) -> Result<Option<AuthSession>, ProviderError> {
        if let Some(err) = self.current_error.lock().clone() {
            return Err(err);
        }
        Ok(self.current.lock().clone())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        _password: &str,
    ) -> Result<AuthSession, ProviderError> {
        self.sign_in_emails.lock().push(email.to_string());
        if let Some(err) = self.sign_in_error.lock().clone() {
            return Err(err);
        }
        let session = auth("u-1");
        *self.current.lock() = Some(session.clone());
        self.emit(ProviderEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        *self.current.lock() = None;
        self.emit(ProviderEvent::signed_out());
        match self.sign_out_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn send_password_recovery(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), ProviderError> {
        self.recovery_requests
            .lock()
            .push((email.to_string(), redirect_to.to_string()));
        match self.recovery_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn update_password(&self, _new_password: &str) -> Result<(), ProviderError> {
        match self.update_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

/// In-memory profile store; lookups for gated identities wait for `release`.
pub struct MockStore {
    pub profiles: parking_lot::Mutex<HashMap<String, StoreResult<Option<Profile>>>>,
    pub companies: parking_lot::Mutex<HashMap<String, StoreResult<Option<Company>>>>,
    pub gated: parking_lot::Mutex<HashSet<String>>,
    pub entered: Notify,
    pub release: Notify,
    pub profile_calls: AtomicU32,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            profiles: parking_lot::Mutex::new(HashMap::new()),
            companies: parking_lot::Mutex::new(HashMap::new()),
            gated: parking_lot::Mutex::new(HashSet::new()),
            entered: Notify::new(),
            release: Notify::new(),
            profile_calls: AtomicU32::new(0),
        }
    }

    pub fn super_admin(self, id: &str) -> Self {
        self.profiles
            .lock()
            .insert(id.to_string(), Ok(Some(Profile::new(id, Role::SuperAdmin))));
        self
    }

    pub fn company_admin(self, id: &str, company: Option<Company>) -> Self {
        self.profiles
            .lock()
            .insert(id.to_string(), Ok(Some(Profile::new(id, Role::CompanyAdmin))));
        self.companies.lock().insert(id.to_string(), Ok(company));
        self
    }

    pub fn failing(self, id: &str, error: StoreError) -> Self {
        self.profiles.lock().insert(id.to_string(), Err(error));
        self
    }

    pub fn gate(&self, id: &str) {
        self.gated.lock().insert(id.to_string());
    }

    pub fn profile_calls(&self) -> u32 {
        self.profile_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for MockStore {
    async fn find_profile(&self, identity_id: &str) -> StoreResult<Option<Profile>> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let gated = self.gated.lock().contains(identity_id);
        if gated {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.profiles
            .lock()
            .get(identity_id)
            .cloned()
            .unwrap_or(Ok(None))
    }

    async fn find_company_by_owner(&self, identity_id: &str) -> StoreResult<Option<Company>> {
        self.companies
            .lock()
            .get(identity_id)
            .cloned()
            .unwrap_or(Ok(None))
    }
}

pub fn spawn_store(provider: Arc<MockProvider>, store: Arc<MockStore>) -> Arc<SessionStore> {
    Arc::new(SessionStore::spawn(provider, Arc::new(ProfileLoader::new(store))))
}
