use async_trait::async_trait;
use serde_json::json;

use crate::{
    backend::{Access, BackendClient},
    errors::AppResult,
    models::domain::{GeoLocation, UserProfile},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Role label stored on the profile, if the profile exists.
    async fn get_role(&self, user_id: &str, access: &Access) -> AppResult<Option<String>>;
    async fn get_profile(&self, user_id: &str, access: &Access) -> AppResult<Option<UserProfile>>;
    async fn update_location(&self, user_id: &str, location: &GeoLocation, access: &Access) -> AppResult<()>;
    async fn list_pending_approvals(&self, access: &Access) -> AppResult<Vec<UserProfile>>;
    async fn set_approval(
        &self,
        user_id: &str,
        approved: bool,
        approved_by: &str,
        access: &Access,
    ) -> AppResult<()>;
    async fn get_admin_emails(&self) -> AppResult<Vec<String>>;
    /// Copies `role` into the auth user's `app_metadata` so sessions carry it.
    async fn set_session_role(&self, user_id: &str, role: &str) -> AppResult<()>;
}

pub struct RpcProfileRepository {
    client: BackendClient,
}

impl RpcProfileRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProfileRepository for RpcProfileRepository {
    async fn get_role(&self, user_id: &str, access: &Access) -> AppResult<Option<String>> {
        self.client
            .rpc("get_user_role", &json!({ "p_user_id": user_id }), access)
            .await
    }

    async fn get_profile(&self, user_id: &str, access: &Access) -> AppResult<Option<UserProfile>> {
        self.client
            .rpc("get_user_profile", &json!({ "p_user_id": user_id }), access)
            .await
    }

    async fn update_location(&self, user_id: &str, location: &GeoLocation, access: &Access) -> AppResult<()> {
        self.client
            .rpc(
                "update_profile_location",
                &json!({
                    "p_user_id": user_id,
                    "p_country": location.country,
                    "p_region": location.region,
                    "p_city": location.city,
                    "p_latitude": location.latitude,
                    "p_longitude": location.longitude,
                }),
                access,
            )
            .await
    }

    async fn list_pending_approvals(&self, access: &Access) -> AppResult<Vec<UserProfile>> {
        self.client
            .rpc("get_pending_approvals", &json!({}), access)
            .await
    }

    async fn set_approval(
        &self,
        user_id: &str,
        approved: bool,
        approved_by: &str,
        access: &Access,
    ) -> AppResult<()> {
        self.client
            .rpc(
                "set_user_approval",
                &json!({
                    "p_user_id": user_id,
                    "p_approved": approved,
                    "p_approved_by": approved_by,
                }),
                access,
            )
            .await
    }

    async fn get_admin_emails(&self) -> AppResult<Vec<String>> {
        self.client
            .rpc("get_admin_emails", &json!({}), &Access::Service)
            .await
    }

    async fn set_session_role(&self, user_id: &str, role: &str) -> AppResult<()> {
        self.client
            .update_user_app_metadata(user_id, json!({ "role": role }))
            .await
    }
}
