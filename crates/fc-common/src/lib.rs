use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod formatting;
pub mod logging;
pub mod validation;

// ============================================================================
// Identity & Session Types
// ============================================================================

/// An authenticated principal as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: Some(email.into()),
        }
    }
}

/// Raw provider session: the tokens plus the user they were issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: Identity,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl AuthSession {
    pub fn new(access_token: impl Into<String>, user: Identity) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            token_type: default_token_type(),
            expires_at: None,
            user,
        }
    }

    /// True when the token expires within `margin` of `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - margin <= now,
            None => false,
        }
    }
}

// ============================================================================
// Roles & Profiles
// ============================================================================

/// Portal role. Stored as `super_admin` / `empresa_admin` in the profiles table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "super_admin")]
    SuperAdmin,
    #[serde(rename = "empresa_admin", alias = "company_admin")]
    CompanyAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::CompanyAdmin => "empresa_admin",
        }
    }

    /// Company-scoped roles must have exactly one company record.
    pub fn requires_company(&self) -> bool {
        match self {
            Role::SuperAdmin => false,
            Role::CompanyAdmin => true,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "empresa_admin" | "company_admin" => Ok(Role::CompanyAdmin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            created_at: None,
            updated_at: None,
        }
    }
}

// ============================================================================
// Tenants & Plans
// ============================================================================

/// Business tenant owned by a company admin identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    #[serde(rename = "user_id")]
    pub owning_identity_id: String,
    pub name: String,
    pub email: String,
    pub whatsapp: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Store Errors
// ============================================================================

/// Failure reported by a relational store (profiles, companies, plans).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The store answered but refused the request (RLS, constraint, bad filter).
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Transport and decode failures say nothing about whether the record exists.
    pub fn is_transport(&self) -> bool {
        matches!(self, StoreError::Transport(_) | StoreError::Decode(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
