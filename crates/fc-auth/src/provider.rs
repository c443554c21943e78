//! Identity provider seam
//!
//! The hosted identity service is an external collaborator. The core only
//! needs the credential operations below and a stream of session-changed
//! events, delivered over a `broadcast` channel in provider order.

use async_trait::async_trait;
use fc_common::AuthSession;
use std::fmt;
use tokio::sync::broadcast;

use crate::error::ProviderError;

/// Kind of session change reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

impl fmt::Display for AuthEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthEventKind::SignedIn => "SIGNED_IN",
            AuthEventKind::SignedOut => "SIGNED_OUT",
            AuthEventKind::TokenRefreshed => "TOKEN_REFRESHED",
        };
        f.write_str(name)
    }
}

/// Session-changed notification with its session payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEvent {
    pub kind: AuthEventKind,
    pub session: Option<AuthSession>,
}

impl ProviderEvent {
    pub fn signed_in(session: AuthSession) -> Self {
        Self {
            kind: AuthEventKind::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            kind: AuthEventKind::SignedOut,
            session: None,
        }
    }

    pub fn token_refreshed(session: AuthSession) -> Self {
        Self {
            kind: AuthEventKind::TokenRefreshed,
            session: Some(session),
        }
    }
}

/// Credential operations offered by the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Session the provider already holds (persisted login, recovery link).
    async fn current_session(&self) -> Result<Option<AuthSession>, ProviderError>;

    /// Exchange e-mail and password for a session. Emits `SIGNED_IN` on success.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ProviderError>;

    /// End the provider session. Emits `SIGNED_OUT`.
    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Send a password-recovery e-mail whose link lands on `redirect_to`.
    async fn send_password_recovery(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), ProviderError>;

    /// Change the password of the identity owning the ambient session.
    async fn update_password(&self, new_password: &str) -> Result<(), ProviderError>;

    /// Subscribe to session-changed events.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}
