//! Profile Loader
//!
//! Resolves an identity to its role and, for company-scoped roles, to the
//! company it owns. No retries: the caller decides what a failure means.

use fc_common::{Company, Profile, StoreError};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::store::ProfileStore;

/// Profile plus the company required by its role.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedProfile {
    pub profile: Profile,
    pub company: Option<Company>,
}

pub struct ProfileLoader {
    store: Arc<dyn ProfileStore>,
}

impl ProfileLoader {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self, identity_id: &str) -> Result<LoadedProfile, LoadError> {
        let profile = match self.store.find_profile(identity_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                warn!(identity_id, "No profile row for identity");
                return Err(LoadError::ProfileMissing);
            }
            Err(e) => return Err(classify(e, LoadError::ProfileMissing, identity_id)),
        };

        if !profile.role.requires_company() {
            debug!(identity_id, role = %profile.role, "Profile loaded");
            return Ok(LoadedProfile {
                profile,
                company: None,
            });
        }

        match self.store.find_company_by_owner(identity_id).await {
            Ok(Some(company)) => {
                debug!(
                    identity_id,
                    company_id = %company.id,
                    active = company.active,
                    "Profile and company loaded"
                );
                Ok(LoadedProfile {
                    profile,
                    company: Some(company),
                })
            }
            Ok(None) => {
                warn!(identity_id, "Company admin without company record");
                Err(LoadError::CompanyMissing)
            }
            Err(e) => Err(classify(e, LoadError::CompanyMissing, identity_id)),
        }
    }
}

fn classify(error: StoreError, missing: LoadError, identity_id: &str) -> LoadError {
    if error.is_transport() {
        warn!(identity_id, error = %error, "Store unreachable while loading profile");
        LoadError::TransportFailure(error.to_string())
    } else {
        warn!(identity_id, error = %error, "Store rejected profile lookup");
        missing
    }
}
