//! Account administration over `/auth/v1/admin` (service-role key)

use async_trait::async_trait;
use fc_admin::{AccountAdmin, NewAccount};
use fc_auth::IdentityProvider;
use fc_common::{Identity, StoreError, StoreResult};
use reqwest::{Method, RequestBuilder};
use tracing::info;

use crate::auth::UserResponse;
use crate::client::SupabaseClient;
use crate::error::{provider_to_store, store_ok, store_transport};

impl SupabaseClient {
    fn require_admin(&self, method: Method, path: &str) -> StoreResult<RequestBuilder> {
        self.admin_request(method, path)
            .ok_or_else(|| StoreError::rejected(403, "service role key not configured"))
    }
}

#[async_trait]
impl AccountAdmin for SupabaseClient {
    async fn create_account(&self, account: &NewAccount) -> StoreResult<Identity> {
        let response = self
            .require_admin(Method::POST, "/auth/v1/admin/users")?
            .json(account)
            .send()
            .await
            .map_err(store_transport)?;

        let user: UserResponse = store_ok(response)
            .await?
            .json()
            .await
            .map_err(store_transport)?;
        info!(identity_id = %user.id, "Account created");
        Ok(user.into())
    }

    async fn delete_account(&self, identity_id: &str) -> StoreResult<()> {
        let path = format!(
            "/auth/v1/admin/users/{}",
            urlencoding::encode(identity_id)
        );
        let response = self
            .require_admin(Method::DELETE, &path)?
            .send()
            .await
            .map_err(store_transport)?;
        store_ok(response).await?;
        info!(identity_id, "Account deleted");
        Ok(())
    }

    async fn send_password_recovery(&self, email: &str, redirect_to: &str) -> StoreResult<()> {
        IdentityProvider::send_password_recovery(self, email, redirect_to)
            .await
            .map_err(provider_to_store)
    }
}
