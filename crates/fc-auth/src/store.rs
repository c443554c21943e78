//! Read access to the profile and company tables

use async_trait::async_trait;
use fc_common::{Company, Profile, StoreResult};

/// Lookups the session core performs against the relational store.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// `profiles` row keyed by identity id.
    async fn find_profile(&self, identity_id: &str) -> StoreResult<Option<Profile>>;

    /// `companies` row keyed by owning identity id.
    async fn find_company_by_owner(&self, identity_id: &str) -> StoreResult<Option<Company>>;
}
