use std::sync::Arc;

use serde_json::json;

use crate::{
    auth::{
        permissions::{require_permission, MANAGE_ROLES},
        AuthenticatedUser,
    },
    backend::Access,
    errors::{AppError, AppResult},
    models::{
        domain::{AuditAction, NewAuditEntry, UserRole},
        dto::response::RoleSyncResponse,
    },
    repositories::ProfileRepository,
    services::{audit_service::AuditService, profile_service::ProfileService},
};

/// Copies the profile role into the auth user's `app_metadata`, which is
/// where session tokens (and the page gate) read it from.
pub struct RoleSyncService {
    profiles: Arc<dyn ProfileRepository>,
    profile_service: Arc<ProfileService>,
    audit: Arc<AuditService>,
}

impl RoleSyncService {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        profile_service: Arc<ProfileService>,
        audit: Arc<AuditService>,
    ) -> Self {
        Self {
            profiles,
            profile_service,
            audit,
        }
    }

    pub async fn sync(
        &self,
        caller: &AuthenticatedUser,
        target: Option<&str>,
    ) -> AppResult<RoleSyncResponse> {
        let target = target.unwrap_or(caller.id());
        let syncing_other = target != caller.id();

        if syncing_other {
            let caller_role = self
                .profile_service
                .resolve_role(&caller.claims, &caller.access)
                .await?;
            require_permission(caller_role, MANAGE_ROLES)?;
        }

        let label = self
            .profiles
            .get_role(target, &Access::Service)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No profile for user '{}'", target)))?;
        let role = UserRole::from_label(&label);

        self.profiles.set_session_role(target, role.as_str()).await?;
        log::info!("Synced role {} for {}", role, target);

        if syncing_other {
            self.audit
                .record(
                    NewAuditEntry::new(caller.id(), AuditAction::RoleSynced)
                        .with_target(target)
                        .with_details(json!({ "role": role })),
                    &caller.access,
                )
                .await;
        }

        Ok(RoleSyncResponse {
            user_id: target.to_string(),
            role,
        })
    }
}
