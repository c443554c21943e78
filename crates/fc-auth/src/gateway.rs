//! Auth Gateway
//!
//! Credential operations exposed to the login and password screens. The
//! gateway never writes the session on sign-in: the provider's `SIGNED_IN`
//! event does. Sign-out is the exception and clears locally first.

use fc_config::SiteConfig;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AuthErrorKind, ProviderError};
use crate::provider::IdentityProvider;
use crate::session::SessionStore;

pub struct AuthGateway {
    provider: Arc<dyn IdentityProvider>,
    session: Arc<SessionStore>,
    recovery_redirect: String,
}

impl AuthGateway {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        session: Arc<SessionStore>,
        site: &SiteConfig,
    ) -> Self {
        Self {
            provider,
            session,
            recovery_redirect: site.password_change_url(),
        }
    }

    /// URL the recovery e-mail links back to.
    pub fn recovery_redirect(&self) -> &str {
        &self.recovery_redirect
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthErrorKind> {
        let email = email.trim();
        match self.provider.sign_in_with_password(email, password).await {
            Ok(session) => {
                info!(identity_id = %session.user.id, "Signed in");
                Ok(())
            }
            Err(e) => Err(categorise("sign_in", &e)),
        }
    }

    /// Local state is cleared before the provider is contacted, so a failed
    /// network call never leaves the portal looking signed in.
    pub async fn sign_out(&self) {
        if let Err(e) = self.session.clear().await {
            warn!(error = %e, "Session store unavailable during sign-out");
        }

        match self.provider.sign_out().await {
            Ok(()) => info!("Signed out"),
            Err(e) => warn!(error = %e, status = ?e.status, "Provider sign-out failed"),
        }
    }

    pub async fn reset_password(&self, email: &str) -> Result<(), AuthErrorKind> {
        let email = email.trim();
        self.provider
            .send_password_recovery(email, &self.recovery_redirect)
            .await
            .map_err(|e| categorise("reset_password", &e))?;

        info!(redirect_to = %self.recovery_redirect, "Password recovery requested");
        Ok(())
    }

    pub async fn update_password(&self, new_password: &str) -> Result<(), AuthErrorKind> {
        self.provider
            .update_password(new_password)
            .await
            .map_err(|e| categorise("update_password", &e))?;

        info!("Password updated");
        Ok(())
    }
}

fn categorise(operation: &'static str, error: &ProviderError) -> AuthErrorKind {
    let kind = AuthErrorKind::from(error);
    warn!(
        operation,
        status = ?error.status,
        error = %error,
        kind = ?kind,
        "Provider rejected credential operation"
    );
    kind
}
