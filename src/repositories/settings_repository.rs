use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    backend::{Access, BackendClient},
    errors::AppResult,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Stored overrides, `None` when nothing has been saved yet.
    async fn get_settings(&self) -> AppResult<Option<Value>>;
    async fn save_settings(&self, settings: &Value, updated_by: &str, access: &Access) -> AppResult<()>;
}

pub struct RpcSettingsRepository {
    client: BackendClient,
}

impl RpcSettingsRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SettingsRepository for RpcSettingsRepository {
    async fn get_settings(&self) -> AppResult<Option<Value>> {
        // Settings are global; read them once with the service credential so
        // the cache is the same for every caller.
        self.client
            .rpc("get_app_settings", &json!({}), &Access::Service)
            .await
    }

    async fn save_settings(&self, settings: &Value, updated_by: &str, access: &Access) -> AppResult<()> {
        self.client
            .rpc(
                "update_app_settings",
                &json!({ "p_settings": settings, "p_updated_by": updated_by }),
                access,
            )
            .await
    }
}
