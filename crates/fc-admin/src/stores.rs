//! Store seams used by the admin services, and the records they exchange.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fc_common::{Company, Identity, Plan, Profile, Role, StoreResult};
use serde::{Deserialize, Serialize};

// ============================================================================
// Companies
// ============================================================================

/// Input of the "new company" form: the owner account plus the company.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewCompanyAccount {
    pub name: String,
    pub email: String,
    pub whatsapp: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
    pub password: String,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Row written to `companies`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyRecord {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub whatsapp: String,
    pub address: Option<String>,
    pub plan_id: Option<String>,
    pub active: bool,
}

/// Partial update of a company. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CompanyPatch {
    pub fn active(active: bool) -> Self {
        Self {
            active: Some(active),
            ..Self::default()
        }
    }

    /// Apply the set fields to a cached company.
    pub fn apply_to(&self, company: &mut Company) {
        if let Some(name) = &self.name {
            company.name = name.clone();
        }
        if let Some(email) = &self.email {
            company.email = email.clone();
        }
        if let Some(whatsapp) = &self.whatsapp {
            company.whatsapp = whatsapp.clone();
        }
        if let Some(address) = &self.address {
            company.address = Some(address.clone());
        }
        if let Some(plan_id) = &self.plan_id {
            company.plan_id = Some(plan_id.clone());
        }
        if let Some(active) = self.active {
            company.active = active;
        }
        if let Some(updated_at) = self.updated_at {
            company.updated_at = updated_at;
        }
    }
}

#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// All companies, newest first.
    async fn list_companies(&self) -> StoreResult<Vec<Company>>;

    async fn get_company(&self, id: &str) -> StoreResult<Option<Company>>;

    async fn insert_profile(&self, profile: &Profile) -> StoreResult<()>;

    async fn insert_company(&self, record: &CompanyRecord) -> StoreResult<Company>;

    async fn update_company(&self, id: &str, patch: &CompanyPatch) -> StoreResult<()>;
}

// ============================================================================
// Accounts
// ============================================================================

/// Metadata attached to accounts created by the back office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountMetadata {
    pub role: Role,
    pub company_name: String,
}

/// Account created through the provider's admin API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub email_confirm: bool,
    pub user_metadata: AccountMetadata,
}

/// Privileged account management on the identity provider.
#[async_trait]
pub trait AccountAdmin: Send + Sync {
    async fn create_account(&self, account: &NewAccount) -> StoreResult<Identity>;

    /// Deleting an account cascades to its profile and company.
    async fn delete_account(&self, identity_id: &str) -> StoreResult<()>;

    async fn send_password_recovery(&self, email: &str, redirect_to: &str) -> StoreResult<()>;
}

// ============================================================================
// Plans
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewPlan {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Row written to `plans`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRecord {
    pub name: String,
    pub price: f64,
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl PlanPatch {
    pub fn active(active: bool) -> Self {
        Self {
            active: Some(active),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, plan: &mut Plan) {
        if let Some(name) = &self.name {
            plan.name = name.clone();
        }
        if let Some(price) = self.price {
            plan.price = price;
        }
        if let Some(active) = self.active {
            plan.active = active;
        }
    }
}

#[async_trait]
pub trait PlanStore: Send + Sync {
    /// All plans, newest first.
    async fn list_plans(&self) -> StoreResult<Vec<Plan>>;

    /// Active plans, cheapest first.
    async fn list_active_plans(&self) -> StoreResult<Vec<Plan>>;

    async fn insert_plan(&self, record: &PlanRecord) -> StoreResult<Plan>;

    async fn update_plan(&self, id: &str, patch: &PlanPatch) -> StoreResult<()>;

    async fn delete_plan(&self, id: &str) -> StoreResult<()>;

    /// True when any company references the plan.
    async fn plan_in_use(&self, id: &str) -> StoreResult<bool>;
}
