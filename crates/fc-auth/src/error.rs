//! Error types for the auth core

use thiserror::Error;

/// Failure reported by the identity provider, before categorisation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    /// HTTP status when the provider answered; `None` for transport failures
    pub status: Option<u16>,
    pub message: String,
}

impl ProviderError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }
}

/// Closed taxonomy of credential-operation failures shown to users.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email not confirmed")]
    EmailNotConfirmed,

    #[error("Rate limited")]
    RateLimited,

    #[error("Unexpected authentication error")]
    Unexpected,
}

const INVALID_CREDENTIALS_MARKERS: &[&str] = &[
    "invalid login credentials",
    "invalid_grant",
    "invalid credentials",
];

const EMAIL_NOT_CONFIRMED_MARKERS: &[&str] = &["email not confirmed"];

const RATE_LIMIT_MARKERS: &[&str] = &[
    "rate limit",
    "too many requests",
    "security purposes",
    "cooldown",
    "only request this after",
];

impl AuthErrorKind {
    /// Categorise a provider failure by status and message substrings.
    pub fn from_provider(error: &ProviderError) -> Self {
        let message = error.message.to_lowercase();
        let contains_any = |markers: &[&str]| markers.iter().any(|m| message.contains(m));

        if contains_any(EMAIL_NOT_CONFIRMED_MARKERS) {
            AuthErrorKind::EmailNotConfirmed
        } else if error.status == Some(429) || contains_any(RATE_LIMIT_MARKERS) {
            AuthErrorKind::RateLimited
        } else if contains_any(INVALID_CREDENTIALS_MARKERS) {
            AuthErrorKind::InvalidCredentials
        } else {
            AuthErrorKind::Unexpected
        }
    }

    /// Message rendered inline on the form or in the error banner.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthErrorKind::InvalidCredentials => "Email ou senha incorretos.",
            AuthErrorKind::EmailNotConfirmed => {
                "Confirme seu email antes de entrar. Verifique sua caixa de entrada."
            }
            AuthErrorKind::RateLimited => {
                "Muitas tentativas em pouco tempo. Aguarde alguns instantes e tente novamente."
            }
            AuthErrorKind::Unexpected => "Não foi possível concluir a operação. Tente novamente.",
        }
    }
}

impl From<&ProviderError> for AuthErrorKind {
    fn from(error: &ProviderError) -> Self {
        AuthErrorKind::from_provider(error)
    }
}

/// Why an identity could not be resolved to a usable profile.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Profile not found for identity")]
    ProfileMissing,

    #[error("Company not found for company admin")]
    CompanyMissing,

    #[error("Transport failure while loading profile: {0}")]
    TransportFailure(String),
}

/// Session store lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session store already initialized")]
    AlreadyInitialized,

    #[error("Session store is shut down")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(status: Option<u16>, message: &str) -> AuthErrorKind {
        AuthErrorKind::from_provider(&ProviderError::new(status, message))
    }

    #[test]
    fn test_provider_messages_are_categorised() {
        assert_eq!(classify(Some(400), "Invalid login credentials"), AuthErrorKind::InvalidCredentials);
        assert_eq!(classify(Some(400), "invalid_grant"), AuthErrorKind::InvalidCredentials);
        assert_eq!(classify(Some(400), "Email not confirmed"), AuthErrorKind::EmailNotConfirmed);
        assert_eq!(
            classify(
                Some(400),
                "For security purposes, you can only request this after 42 seconds."
            ),
            AuthErrorKind::RateLimited
        );
        assert_eq!(classify(Some(400), "Security cooldown active"), AuthErrorKind::RateLimited);
        assert_eq!(classify(Some(429), "slow down"), AuthErrorKind::RateLimited);
        assert_eq!(classify(None, "connection reset by peer"), AuthErrorKind::Unexpected);
        assert_eq!(classify(Some(500), "Database error"), AuthErrorKind::Unexpected);
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let kinds = [
            AuthErrorKind::InvalidCredentials,
            AuthErrorKind::EmailNotConfirmed,
            AuthErrorKind::RateLimited,
            AuthErrorKind::Unexpected,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a.user_message(), b.user_message());
            }
        }
        assert!(AuthErrorKind::RateLimited.user_message().contains("Aguarde"));
    }
}
