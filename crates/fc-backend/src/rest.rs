//! Relational stores over the hosted REST layer (`/rest/v1`)
//!
//! Filters use the REST layer's operator syntax (`id=eq.{value}`); reads ask
//! for arrays and take the first row so an absent record is `None`, not an
//! error.

use async_trait::async_trait;
use fc_admin::{CompanyPatch, CompanyRecord, CompanyStore, PlanPatch, PlanRecord, PlanStore};
use fc_auth::ProfileStore;
use fc_common::{Company, Plan, Profile, StoreError, StoreResult};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::client::SupabaseClient;
use crate::error::{store_ok, store_transport};

const PROFILES: &str = "/rest/v1/user_profiles";
const COMPANIES: &str = "/rest/v1/companies";
const PLANS: &str = "/rest/v1/plans";

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

impl SupabaseClient {
    async fn select<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<Vec<T>> {
        let response = request.send().await.map_err(store_transport)?;
        store_ok(response).await?.json().await.map_err(store_transport)
    }

    async fn select_one<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<Option<T>> {
        Ok(self.select(request).await?.into_iter().next())
    }

    async fn insert_returning<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> StoreResult<T> {
        let request = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(body);
        self.select_one(request)
            .await?
            .ok_or_else(|| StoreError::Decode(format!("{table}: insert returned no row")))
    }

    async fn execute(&self, request: RequestBuilder) -> StoreResult<()> {
        let response = request.send().await.map_err(store_transport)?;
        store_ok(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for SupabaseClient {
    async fn find_profile(&self, identity_id: &str) -> StoreResult<Option<Profile>> {
        debug!(identity_id, "Fetching profile");
        let request = self
            .request(Method::GET, PROFILES)
            .query(&[("id", eq(identity_id).as_str()), ("select", "*")]);
        self.select_one(request).await
    }

    async fn find_company_by_owner(&self, identity_id: &str) -> StoreResult<Option<Company>> {
        debug!(identity_id, "Fetching company by owner");
        let request = self
            .request(Method::GET, COMPANIES)
            .query(&[("user_id", eq(identity_id).as_str()), ("select", "*")]);
        self.select_one(request).await
    }
}

#[async_trait]
impl CompanyStore for SupabaseClient {
    async fn list_companies(&self) -> StoreResult<Vec<Company>> {
        let request = self
            .request(Method::GET, COMPANIES)
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        self.select(request).await
    }

    async fn get_company(&self, id: &str) -> StoreResult<Option<Company>> {
        let request = self
            .request(Method::GET, COMPANIES)
            .query(&[("id", eq(id).as_str()), ("select", "*")]);
        self.select_one(request).await
    }

    async fn insert_profile(&self, profile: &Profile) -> StoreResult<()> {
        // Timestamps are filled in by the database.
        let request = self
            .request(Method::POST, PROFILES)
            .header("Prefer", "return=minimal")
            .json(&json!({ "id": profile.id, "role": profile.role }));
        self.execute(request).await
    }

    async fn insert_company(&self, record: &CompanyRecord) -> StoreResult<Company> {
        self.insert_returning(COMPANIES, record).await
    }

    async fn update_company(&self, id: &str, patch: &CompanyPatch) -> StoreResult<()> {
        let request = self
            .request(Method::PATCH, COMPANIES)
            .query(&[("id", eq(id))])
            .json(patch);
        self.execute(request).await
    }
}

#[async_trait]
impl PlanStore for SupabaseClient {
    async fn list_plans(&self) -> StoreResult<Vec<Plan>> {
        let request = self
            .request(Method::GET, PLANS)
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        self.select(request).await
    }

    async fn list_active_plans(&self) -> StoreResult<Vec<Plan>> {
        let request = self.request(Method::GET, PLANS).query(&[
            ("select", "*"),
            ("active", "eq.true"),
            ("order", "price.asc"),
        ]);
        self.select(request).await
    }

    async fn insert_plan(&self, record: &PlanRecord) -> StoreResult<Plan> {
        self.insert_returning(PLANS, record).await
    }

    async fn update_plan(&self, id: &str, patch: &PlanPatch) -> StoreResult<()> {
        let request = self
            .request(Method::PATCH, PLANS)
            .query(&[("id", eq(id))])
            .json(patch);
        self.execute(request).await
    }

    async fn delete_plan(&self, id: &str) -> StoreResult<()> {
        let request = self.request(Method::DELETE, PLANS).query(&[("id", eq(id))]);
        self.execute(request).await
    }

    async fn plan_in_use(&self, id: &str) -> StoreResult<bool> {
        let request = self.request(Method::GET, COMPANIES).query(&[
            ("select", "id"),
            ("plan_id", eq(id).as_str()),
            ("limit", "1"),
        ]);
        let rows: Vec<serde_json::Value> = self.select(request).await?;
        Ok(!rows.is_empty())
    }
}
