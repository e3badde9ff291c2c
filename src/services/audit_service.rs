use std::sync::Arc;

use crate::{
    backend::Access,
    errors::AppResult,
    models::{
        domain::{AuditLogEntry, NewAuditEntry},
        dto::{request::AuditLogQuery, response::PaginatedResponse},
    },
    repositories::AuditRepository,
};

pub struct AuditService {
    repository: Arc<dyn AuditRepository>,
}

impl AuditService {
    pub fn new(repository: Arc<dyn AuditRepository>) -> Self {
        Self { repository }
    }

    /// Writes an audit entry. A failed write is logged and swallowed so that
    /// the audited action itself still succeeds.
    pub async fn record(&self, entry: NewAuditEntry, access: &Access) {
        if let Err(e) = self.repository.log_action(&entry, access).await {
            log::warn!(
                "Failed to write audit entry {} by {}: {}",
                entry.action,
                entry.actor_id,
                e
            );
        }
    }

    pub async fn list(
        &self,
        query: &AuditLogQuery,
        access: &Access,
    ) -> AppResult<PaginatedResponse<AuditLogEntry>> {
        let pagination = query.pagination();
        let (offset, limit) = (pagination.offset(), pagination.limit());

        let items = self
            .repository
            .list(query.action.clone(), offset, limit, access)
            .await?;

        Ok(PaginatedResponse::from_page(items, offset, limit))
    }
}
