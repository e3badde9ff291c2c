use async_trait::async_trait;
use serde_json::json;

use crate::{
    backend::{Access, BackendClient},
    errors::AppResult,
    models::domain::DemographicsRecord,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DemographicsRepository: Send + Sync {
    async fn has_demographics(&self, user_id: &str, access: &Access) -> AppResult<bool>;
    async fn save_demographics(&self, record: &DemographicsRecord, access: &Access) -> AppResult<()>;
}

pub struct RpcDemographicsRepository {
    client: BackendClient,
}

impl RpcDemographicsRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DemographicsRepository for RpcDemographicsRepository {
    async fn has_demographics(&self, user_id: &str, access: &Access) -> AppResult<bool> {
        let found: Option<bool> = self
            .client
            .rpc("has_demographics", &json!({ "p_user_id": user_id }), access)
            .await?;
        Ok(found.unwrap_or(false))
    }

    async fn save_demographics(&self, record: &DemographicsRecord, access: &Access) -> AppResult<()> {
        self.client
            .rpc("save_demographics", &json!({ "p_record": record }), access)
            .await
    }
}
