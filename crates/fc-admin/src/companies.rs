//! Company Directory
//!
//! Back-office management of tenant companies. A company is always created
//! together with its owner account and `empresa_admin` profile; the three are
//! written in sequence with the account deleted again if a later step fails.

use chrono::Utc;
use fc_common::validation::{clean_whatsapp, validate_email, validate_whatsapp, PasswordPolicy};
use fc_common::{Company, Profile, Role};
use fc_config::SiteConfig;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::cache::{ListCache, ListView};
use crate::error::{AdminError, Result};
use crate::stores::{
    AccountAdmin, AccountMetadata, CompanyPatch, CompanyRecord, CompanyStore, NewAccount,
    NewCompanyAccount,
};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 100;
const EMAIL_MAX: usize = 100;
const ADDRESS_MAX: usize = 200;

pub struct CompanyDirectory {
    companies: Arc<dyn CompanyStore>,
    accounts: Arc<dyn AccountAdmin>,
    cache: ListCache<Company>,
    recovery_redirect: String,
}

impl CompanyDirectory {
    pub fn new(
        companies: Arc<dyn CompanyStore>,
        accounts: Arc<dyn AccountAdmin>,
        site: &SiteConfig,
    ) -> Self {
        Self {
            companies,
            accounts,
            cache: ListCache::new(),
            recovery_redirect: site.password_change_url(),
        }
    }

    pub fn view(&self) -> ListView<Company> {
        self.cache.view()
    }

    pub fn companies(&self) -> Vec<Company> {
        self.cache.items()
    }

    /// Reload the list from the store, newest first.
    pub async fn fetch(&self) -> Result<Vec<Company>> {
        self.cache.begin_load();
        match self.companies.list_companies().await {
            Ok(companies) => {
                debug!(count = companies.len(), "Companies loaded");
                self.cache.loaded(companies.clone());
                Ok(companies)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load companies");
                let error = AdminError::from(e);
                self.cache.failed(error.user_message());
                Err(error)
            }
        }
    }

    pub async fn get(&self, id: &str) -> Result<Company> {
        self.companies
            .get_company(id)
            .await?
            .ok_or_else(|| AdminError::not_found("Company", id))
    }

    pub async fn create(&self, input: NewCompanyAccount) -> Result<Company> {
        validate_new_company(&input)?;

        let email = input.email.trim().to_string();
        let name = input.name.trim().to_string();
        info!(company = %name, "Creating company");

        let identity = self
            .accounts
            .create_account(&NewAccount {
                email: email.clone(),
                password: input.password.clone(),
                email_confirm: true,
                user_metadata: AccountMetadata {
                    role: Role::CompanyAdmin,
                    company_name: name.clone(),
                },
            })
            .await?;
        debug!(identity_id = %identity.id, "Owner account created");

        if let Err(e) = self
            .companies
            .insert_profile(&Profile::new(identity.id.clone(), Role::CompanyAdmin))
            .await
        {
            self.compensate(&identity.id, "profile").await;
            return Err(e.into());
        }

        let record = CompanyRecord {
            user_id: identity.id.clone(),
            name,
            email,
            whatsapp: clean_whatsapp(&input.whatsapp),
            address: input.address.filter(|a| !a.trim().is_empty()),
            plan_id: input.plan_id,
            active: input.active.unwrap_or(true),
        };

        let company = match self.companies.insert_company(&record).await {
            Ok(company) => company,
            Err(e) => {
                self.compensate(&identity.id, "company").await;
                return Err(e.into());
            }
        };

        info!(company_id = %company.id, identity_id = %identity.id, "Company created");
        self.refetch().await;
        Ok(company)
    }

    pub async fn update(&self, id: &str, mut patch: CompanyPatch) -> Result<()> {
        validate_patch(&patch)?;
        if let Some(whatsapp) = &patch.whatsapp {
            patch.whatsapp = Some(clean_whatsapp(whatsapp));
        }
        patch.updated_at = Some(Utc::now());

        self.companies.update_company(id, &patch).await?;
        info!(company_id = id, "Company updated");
        self.refetch().await;
        Ok(())
    }

    /// Delete the owner account; profile and company cascade with it.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let company = self
            .companies
            .get_company(id)
            .await?
            .ok_or_else(|| AdminError::not_found("Company", id))?;

        self.accounts
            .delete_account(&company.owning_identity_id)
            .await?;
        info!(company_id = id, identity_id = %company.owning_identity_id, "Company deleted");
        self.refetch().await;
        Ok(())
    }

    /// Flip the cached flag at once and undo it if the store refuses.
    pub async fn set_active(&self, id: &str, active: bool) -> Result<()> {
        let now = Utc::now();
        let previous = self.cache.modify(id, |company| {
            company.active = active;
            company.updated_at = now;
        });

        let patch = CompanyPatch {
            updated_at: Some(now),
            ..CompanyPatch::active(active)
        };
        if let Err(e) = self.companies.update_company(id, &patch).await {
            warn!(company_id = id, active, error = %e, "Status change failed, reverting");
            if let Some(previous) = previous {
                self.cache.restore(previous);
            }
            return Err(e.into());
        }

        info!(company_id = id, active, "Company status changed");
        self.refetch().await;
        Ok(())
    }

    /// Send the owner a recovery e-mail pointing at the change-password page.
    pub async fn reset_password(&self, email: &str) -> Result<()> {
        let email = email.trim();
        if !validate_email(email) {
            return Err(AdminError::validation("Email inválido"));
        }

        self.accounts
            .send_password_recovery(email, &self.recovery_redirect)
            .await?;
        info!(redirect_to = %self.recovery_redirect, "Company password recovery sent");
        Ok(())
    }

    async fn compensate(&self, identity_id: &str, failed_step: &'static str) {
        warn!(identity_id, failed_step, "Company creation failed, removing owner account");
        if let Err(e) = self.accounts.delete_account(identity_id).await {
            error!(identity_id, error = %e, "Could not remove orphaned owner account");
        }
    }

    async fn refetch(&self) {
        if let Err(e) = self.fetch().await {
            warn!(error = %e, "Refresh after write failed");
        }
    }
}

fn validate_new_company(input: &NewCompanyAccount) -> Result<()> {
    let mut errors = Vec::new();

    check_name(&input.name, &mut errors);
    check_email(&input.email, &mut errors);
    check_whatsapp(&input.whatsapp, &mut errors);
    if let Some(address) = &input.address {
        check_address(address, &mut errors);
    }
    if input.plan_id.as_deref().map_or(true, |p| p.trim().is_empty()) {
        errors.push("Plano é obrigatório".to_string());
    }

    let policy = PasswordPolicy {
        require_lowercase: false,
        require_uppercase: false,
        require_digit: false,
        ..PasswordPolicy::default()
    };
    if input.password.is_empty() {
        errors.push("Senha é obrigatória".to_string());
    } else if let Err(password_errors) = policy.validate(&input.password) {
        errors.extend(password_errors);
    }

    finish(errors)
}

fn validate_patch(patch: &CompanyPatch) -> Result<()> {
    let mut errors = Vec::new();

    if let Some(name) = &patch.name {
        check_name(name, &mut errors);
    }
    if let Some(email) = &patch.email {
        check_email(email, &mut errors);
    }
    if let Some(whatsapp) = &patch.whatsapp {
        check_whatsapp(whatsapp, &mut errors);
    }
    if let Some(address) = &patch.address {
        check_address(address, &mut errors);
    }

    finish(errors)
}

fn check_name(name: &str, errors: &mut Vec<String>) {
    let length = name.trim().chars().count();
    if length == 0 {
        errors.push("Nome da empresa é obrigatório".to_string());
    } else if length < NAME_MIN {
        errors.push(format!("Nome deve ter pelo menos {NAME_MIN} caracteres"));
    } else if length > NAME_MAX {
        errors.push(format!("Nome deve ter no máximo {NAME_MAX} caracteres"));
    }
}

fn check_email(email: &str, errors: &mut Vec<String>) {
    let email = email.trim();
    if email.is_empty() {
        errors.push("Email é obrigatório".to_string());
    } else if !validate_email(email) {
        errors.push("Email inválido".to_string());
    } else if email.chars().count() > EMAIL_MAX {
        errors.push(format!("Email deve ter no máximo {EMAIL_MAX} caracteres"));
    }
}

fn check_whatsapp(whatsapp: &str, errors: &mut Vec<String>) {
    if whatsapp.trim().is_empty() {
        errors.push("WhatsApp é obrigatório".to_string());
    } else if !validate_whatsapp(whatsapp) {
        errors.push("WhatsApp deve estar no formato (99) 99999-9999".to_string());
    }
}

fn check_address(address: &str, errors: &mut Vec<String>) {
    if address.chars().count() > ADDRESS_MAX {
        errors.push(format!("Endereço deve ter no máximo {ADDRESS_MAX} caracteres"));
    }
}

fn finish(errors: Vec<String>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AdminError::Validation(errors))
    }
}
