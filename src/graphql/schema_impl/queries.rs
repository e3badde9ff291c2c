use async_graphql::{Context, Object};

use crate::{
    app_state::AppState,
    auth::{permissions::VIEW_AUDIT_LOGS, AuthenticatedUser},
    errors::AppResult,
    graphql::schema_impl::{caller, require_caller_permission},
    models::{
        domain::{AppSettings, AuditLogEntry, Gift, QuizQuestion, QuizResult},
        dto::{request::AuditLogQuery, response::MeResponse},
    },
};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn me(&self, ctx: &Context<'_>) -> AppResult<MeResponse> {
        let state = ctx.data::<AppState>()?;
        let (claims, access) = caller(ctx)?;

        state.profile_service.me(&claims, &access).await
    }

    async fn gifts(&self, ctx: &Context<'_>, locale: Option<String>) -> AppResult<Vec<Gift>> {
        let state = ctx.data::<AppState>()?;
        let (_, access) = caller(ctx)?;

        state.quiz_service.get_gifts(locale.as_deref(), &access).await
    }

    async fn questions(
        &self,
        ctx: &Context<'_>,
        locale: Option<String>,
    ) -> AppResult<Vec<QuizQuestion>> {
        let state = ctx.data::<AppState>()?;
        let (_, access) = caller(ctx)?;

        state
            .quiz_service
            .get_questions(locale.as_deref(), &access)
            .await
    }

    async fn my_results(&self, ctx: &Context<'_>) -> AppResult<Vec<QuizResult>> {
        let state = ctx.data::<AppState>()?;
        let (claims, access) = caller(ctx)?;

        state
            .quiz_service
            .list_results(&AuthenticatedUser { claims, access })
            .await
    }

    async fn settings(&self, ctx: &Context<'_>) -> AppResult<AppSettings> {
        let state = ctx.data::<AppState>()?;
        caller(ctx)?;

        Ok(state.settings_service.get_settings().await)
    }

    async fn audit_logs(
        &self,
        ctx: &Context<'_>,
        offset: Option<i64>,
        limit: Option<i64>,
        action: Option<String>,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let state = ctx.data::<AppState>()?;
        let (_, access, _) = require_caller_permission(ctx, VIEW_AUDIT_LOGS).await?;

        let query = AuditLogQuery {
            offset,
            limit,
            action,
        };
        let page = state.audit_service.list(&query, &access).await?;
        Ok(page.items)
    }
}
