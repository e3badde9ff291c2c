use async_graphql::{Context, Object};

use crate::{
    app_state::AppState,
    auth::permissions::EDIT_SETTINGS,
    errors::AppResult,
    graphql::schema_impl::require_caller_permission,
    models::domain::{AuditAction, NewAuditEntry},
};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn clear_settings_cache(&self, ctx: &Context<'_>) -> AppResult<bool> {
        let state = ctx.data::<AppState>()?;
        let (claims, access, _) = require_caller_permission(ctx, EDIT_SETTINGS).await?;

        state.settings_service.clear_cache().await;
        state
            .audit_service
            .record(
                NewAuditEntry::new(&claims.sub, AuditAction::SettingsCacheCleared),
                &access,
            )
            .await;

        Ok(true)
    }
}
