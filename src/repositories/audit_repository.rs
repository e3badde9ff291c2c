use async_trait::async_trait;
use serde_json::json;

use crate::{
    backend::{Access, BackendClient},
    errors::AppResult,
    models::domain::{AuditLogEntry, NewAuditEntry},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn log_action(&self, entry: &NewAuditEntry, access: &Access) -> AppResult<()>;
    async fn list(
        &self,
        action: Option<String>,
        offset: i64,
        limit: i64,
        access: &Access,
    ) -> AppResult<Vec<AuditLogEntry>>;
}

pub struct RpcAuditRepository {
    client: BackendClient,
}

impl RpcAuditRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuditRepository for RpcAuditRepository {
    async fn log_action(&self, entry: &NewAuditEntry, access: &Access) -> AppResult<()> {
        self.client
            .rpc(
                "log_admin_action",
                &json!({
                    "p_actor_id": entry.actor_id,
                    "p_action": entry.action,
                    "p_target_id": entry.target_id,
                    "p_details": entry.details,
                }),
                access,
            )
            .await
    }

    async fn list(
        &self,
        action: Option<String>,
        offset: i64,
        limit: i64,
        access: &Access,
    ) -> AppResult<Vec<AuditLogEntry>> {
        self.client
            .rpc(
                "get_audit_logs",
                &json!({ "p_action": action, "p_offset": offset, "p_limit": limit }),
                access,
            )
            .await
    }
}
