use std::sync::Arc;

use serde_json::json;
use validator::Validate;

use crate::{
    auth::AuthenticatedUser,
    backend::Access,
    errors::AppResult,
    models::{
        domain::{AuditAction, NewAuditEntry, UserProfile},
        dto::request::ApprovalDecisionRequest,
    },
    repositories::ProfileRepository,
    services::audit_service::AuditService,
};

pub struct ApprovalService {
    profiles: Arc<dyn ProfileRepository>,
    audit: Arc<AuditService>,
}

impl ApprovalService {
    pub fn new(profiles: Arc<dyn ProfileRepository>, audit: Arc<AuditService>) -> Self {
        Self { profiles, audit }
    }

    pub async fn pending(&self, access: &Access) -> AppResult<Vec<UserProfile>> {
        self.profiles.list_pending_approvals(access).await
    }

    pub async fn decide(
        &self,
        actor: &AuthenticatedUser,
        user_id: &str,
        decision: &ApprovalDecisionRequest,
    ) -> AppResult<()> {
        decision.validate()?;

        self.profiles
            .set_approval(user_id, decision.approved, actor.id(), &actor.access)
            .await?;

        let action = if decision.approved {
            AuditAction::UserApproved
        } else {
            AuditAction::UserRejected
        };
        log::info!("{} {} by {}", action, user_id, actor.id());

        self.audit
            .record(
                NewAuditEntry::new(actor.id(), action)
                    .with_target(user_id)
                    .with_details(json!({ "reason": decision.reason })),
                &actor.access,
            )
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::AppError,
        repositories::{
            audit_repository::MockAuditRepository, profile_repository::MockProfileRepository,
        },
        test_utils::fixtures,
    };
    use mockall::predicate::*;

    #[tokio::test]
    async fn rejection_is_stored_and_audited() {
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_set_approval()
            .with(eq("user-7"), eq(false), eq("manager-1"), always())
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let mut audit = MockAuditRepository::new();
        audit
            .expect_log_action()
            .withf(|entry, _| {
                entry.action == AuditAction::UserRejected
                    && entry.details["reason"] == "duplicate account"
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = ApprovalService::new(
            Arc::new(profiles),
            Arc::new(AuditService::new(Arc::new(audit))),
        );
        let actor = fixtures::authenticated_user("manager-1", Some("manager"));

        service
            .decide(
                &actor,
                "user-7",
                &ApprovalDecisionRequest {
                    approved: false,
                    reason: Some("duplicate account".to_string()),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failed_update_is_not_audited() {
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_set_approval()
            .returning(|_, _, _, _| Err(AppError::Forbidden("rls".into())));

        let mut audit = MockAuditRepository::new();
        audit.expect_log_action().never();

        let service = ApprovalService::new(
            Arc::new(profiles),
            Arc::new(AuditService::new(Arc::new(audit))),
        );
        let actor = fixtures::authenticated_user("manager-1", Some("manager"));

        let result = service
            .decide(
                &actor,
                "user-7",
                &ApprovalDecisionRequest {
                    approved: true,
                    reason: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
