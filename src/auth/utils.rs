use async_graphql::Context;

use crate::{
    auth::{permissions::has_permission, Claims},
    errors::{AppError, AppResult},
    models::domain::UserRole,
};

pub fn require_role(role: UserRole, minimum: UserRole) -> AppResult<()> {
    if role < minimum {
        return Err(AppError::Forbidden(format!(
            "This action requires the {} role",
            minimum
        )));
    }
    Ok(())
}

/// Allows the resource owner, or anyone holding `permission`.
pub fn require_owner_or_permission(
    claims: &Claims,
    role: UserRole,
    resource_owner: &str,
    permission: &str,
) -> AppResult<()> {
    if claims.sub != resource_owner && !has_permission(role, permission) {
        return Err(AppError::Forbidden(
            "You can only access your own resources".to_string(),
        ));
    }
    Ok(())
}

pub fn extract_claims_from_context(ctx: &Context<'_>) -> AppResult<Claims> {
    ctx.data::<Claims>()
        .cloned()
        .map_err(|_| AppError::Unauthorized("Authentication required".to_string()))
}
