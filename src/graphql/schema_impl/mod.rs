pub mod mutations;
pub mod queries;

use async_graphql::{Context, EmptySubscription, Schema as GraphQLSchema};

use crate::{
    app_state::AppState,
    auth::{extract_claims_from_context, require_permission, Claims},
    backend::Access,
    errors::{AppError, AppResult},
    models::domain::UserRole,
};

pub use mutations::MutationRoot;
pub use queries::QueryRoot;

pub type Schema = GraphQLSchema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn create_schema(app_state: AppState) -> Schema {
    GraphQLSchema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(app_state)
        .finish()
}

/// Session claims and backend access attached by the HTTP handler.
pub(crate) fn caller(ctx: &Context<'_>) -> AppResult<(Claims, Access)> {
    let claims = extract_claims_from_context(ctx)?;
    let access = ctx
        .data::<Access>()
        .cloned()
        .map_err(|_| AppError::Unauthorized("Authentication required".to_string()))?;
    Ok((claims, access))
}

pub(crate) async fn require_caller_permission(
    ctx: &Context<'_>,
    permission: &str,
) -> AppResult<(Claims, Access, UserRole)> {
    let state = ctx.data::<AppState>()?;
    let (claims, access) = caller(ctx)?;

    let role = state.profile_service.resolve_role(&claims, &access).await?;
    require_permission(role, permission)?;
    Ok((claims, access, role))
}
