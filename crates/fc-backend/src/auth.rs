//! Identity provider over the hosted auth service (`/auth/v1`)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fc_auth::{IdentityProvider, ProviderError, ProviderEvent};
use fc_common::{AuthSession, Identity};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::client::SupabaseClient;
use crate::error::{provider_ok, provider_transport};

/// Upper bound between two expiry checks of the auto-refresh task.
const MAX_REFRESH_TICK: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub(crate) struct UserResponse {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<UserResponse> for Identity {
    fn from(user: UserResponse) -> Self {
        Identity {
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    user: UserResponse,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_at: expiry(self.expires_at, self.expires_in, now),
            user: self.user.into(),
        }
    }
}

fn expiry(expires_at: Option<i64>, expires_in: Option<i64>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match (expires_at, expires_in) {
        (Some(at), _) => DateTime::from_timestamp(at, 0),
        (None, Some(secs)) => Some(now + chrono::Duration::seconds(secs)),
        (None, None) => None,
    }
}

impl SupabaseClient {
    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<AuthSession, ProviderError> {
        let response = self
            .request_as(Method::POST, "/auth/v1/token", self.anon_key())
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await
            .map_err(provider_transport)?;

        let token: TokenResponse = provider_ok(response)
            .await?
            .json()
            .await
            .map_err(provider_transport)?;
        Ok(token.into_session(Utc::now()))
    }

    /// User owning `access_token`.
    pub(crate) async fn fetch_user(&self, access_token: &str) -> Result<Identity, ProviderError> {
        let response = self
            .request_as(Method::GET, "/auth/v1/user", access_token)
            .send()
            .await
            .map_err(provider_transport)?;

        let user: UserResponse = provider_ok(response)
            .await?
            .json()
            .await
            .map_err(provider_transport)?;
        Ok(user.into())
    }

    /// Exchange the refresh token for a new session. Emits `TOKEN_REFRESHED`.
    pub async fn refresh_session(&self) -> Result<AuthSession, ProviderError> {
        let refresh_token = self
            .session()
            .and_then(|s| s.refresh_token)
            .ok_or_else(|| ProviderError::new(Some(401), "Auth session missing!"))?;

        let session = self
            .token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await?;

        debug!(identity_id = %session.user.id, "Access token refreshed");
        self.store_session(session.clone());
        self.emit(ProviderEvent::token_refreshed(session.clone()));
        Ok(session)
    }

    /// Adopt a session obtained elsewhere (e.g. persisted by a previous run),
    /// refreshing it first when it is already expired. Emits `SIGNED_IN`.
    pub async fn restore_session(&self, session: AuthSession) -> Result<AuthSession, ProviderError> {
        let expired = session.expires_within(Utc::now(), chrono::Duration::zero());
        self.store_session(session.clone());

        let session = if expired {
            info!(identity_id = %session.user.id, "Restored session expired, refreshing");
            match self.refresh_session().await {
                Ok(session) => session,
                Err(e) => {
                    self.drop_session();
                    return Err(e);
                }
            }
        } else {
            session
        };

        self.emit(ProviderEvent::signed_in(session.clone()));
        Ok(session)
    }

    /// Restore the session left in the session file, if any.
    pub async fn restore_persisted_session(&self) -> Result<Option<AuthSession>, ProviderError> {
        match self.persisted_session() {
            Some(session) => self.restore_session(session).await.map(Some),
            None => Ok(None),
        }
    }

    /// Pick up a session delivered in a redirect URL fragment (recovery and
    /// confirmation links). Returns `None` when the URL carries no tokens.
    pub async fn detect_session_in_url(&self, url: &str) -> Result<Option<AuthSession>, ProviderError> {
        let params = url_params(url);

        if let Some(description) = params.get("error_description") {
            warn!(error = %description, "Redirect URL carries an auth error");
            return Err(ProviderError::new(None, description.clone()));
        }

        let Some(access_token) = params.get("access_token") else {
            return Ok(None);
        };

        let user = self.fetch_user(access_token).await?;
        let now = Utc::now();
        let session = AuthSession {
            access_token: access_token.clone(),
            refresh_token: params.get("refresh_token").cloned(),
            token_type: params
                .get("token_type")
                .cloned()
                .unwrap_or_else(|| "bearer".to_string()),
            expires_at: expiry(
                params.get("expires_at").and_then(|v| v.parse().ok()),
                params.get("expires_in").and_then(|v| v.parse().ok()),
                now,
            ),
            user,
        };

        info!(
            identity_id = %session.user.id,
            link_type = params.get("type").map(String::as_str).unwrap_or("unknown"),
            "Session detected in URL"
        );
        self.store_session(session.clone());
        self.emit(ProviderEvent::signed_in(session.clone()));
        Ok(Some(session))
    }

    /// Keep the access token fresh in the background until [`SupabaseClient::shutdown`].
    ///
    /// A refresh rejected by the service ends the session (`SIGNED_OUT`);
    /// transport failures are retried on the next tick.
    pub fn spawn_auto_refresh(self: &Arc<Self>, margin: Duration) -> JoinHandle<()> {
        let client = Arc::clone(self);
        let mut shutdown = self.shutdown_tx.subscribe();
        let tick = (margin / 2).clamp(Duration::from_millis(100), MAX_REFRESH_TICK);
        let margin = chrono::Duration::from_std(margin).unwrap_or(chrono::Duration::zero());

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            info!(tick_ms = tick.as_millis() as u64, "Auto refresh started");

            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        info!("Auto refresh stopped");
                        break;
                    }
                    _ = interval.tick() => {}
                }

                let due = client
                    .session()
                    .is_some_and(|s| s.refresh_token.is_some() && s.expires_within(Utc::now(), margin));
                if !due {
                    continue;
                }

                match client.refresh_session().await {
                    Ok(_) => {}
                    Err(e) if e.status.is_some() => {
                        error!(error = %e, "Refresh token rejected, ending session");
                        client.drop_session();
                        client.emit(ProviderEvent::signed_out());
                    }
                    Err(e) => warn!(error = %e, "Token refresh failed, will retry"),
                }
            }
        })
    }
}

/// Key/value pairs of the URL fragment, falling back to the query string.
fn url_params(url: &str) -> HashMap<String, String> {
    let raw = match url.split_once('#') {
        Some((_, fragment)) => fragment,
        None => url.split_once('?').map(|(_, query)| query).unwrap_or(""),
    };

    raw.split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| {
            let value = value.replace('+', " ");
            let value = urlencoding::decode(&value)
                .map(|v| v.into_owned())
                .unwrap_or(value);
            (key.to_string(), value)
        })
        .collect()
}

#[async_trait]
impl IdentityProvider for SupabaseClient {
    async fn current_session(&self) -> Result<Option<AuthSession>, ProviderError> {
        Ok(self.session())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ProviderError> {
        let session = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;

        info!(identity_id = %session.user.id, "Password sign-in succeeded");
        self.store_session(session.clone());
        self.emit(ProviderEvent::signed_in(session.clone()));
        Ok(session)
    }

    /// The local session is dropped and `SIGNED_OUT` emitted whatever the
    /// outcome of the network call.
    async fn sign_out(&self) -> Result<(), ProviderError> {
        let previous = self.drop_session();
        self.emit(ProviderEvent::signed_out());

        let Some(previous) = previous else {
            return Ok(());
        };

        let response = self
            .request_as(Method::POST, "/auth/v1/logout", &previous.access_token)
            .send()
            .await
            .map_err(provider_transport)?;
        provider_ok(response).await?;
        Ok(())
    }

    async fn send_password_recovery(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), ProviderError> {
        let response = self
            .request(Method::POST, "/auth/v1/recover")
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(provider_transport)?;
        provider_ok(response).await?;
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<(), ProviderError> {
        let session = self
            .session()
            .ok_or_else(|| ProviderError::new(Some(401), "Auth session missing!"))?;

        let response = self
            .request_as(Method::PUT, "/auth/v1/user", &session.access_token)
            .json(&json!({ "password": new_password }))
            .send()
            .await
            .map_err(provider_transport)?;
        provider_ok(response).await?;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.event_receiver()
    }
}
