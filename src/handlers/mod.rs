pub mod admin_handler;
pub mod auth_handler;
pub mod demographics_handler;
pub mod graphql_handler;
pub mod health_handler;
pub mod page_handler;
pub mod profile_handler;
pub mod quiz_handler;
pub mod settings_handler;

use actix_web::web;

use crate::{
    app_state::AppState,
    auth::{require_permission, AuthenticatedUser},
    errors::AppResult,
    models::domain::UserRole,
};

pub use health_handler::{health_check, health_check_live, health_check_ready};

/// Routes mounted under the authenticated `/api` scope.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(quiz_handler::get_gifts)
        .service(quiz_handler::get_questions)
        .service(quiz_handler::start_session)
        .service(quiz_handler::submit_answers)
        .service(quiz_handler::complete_session)
        .service(quiz_handler::list_results)
        .service(quiz_handler::get_result)
        .service(quiz_handler::analyze_result)
        .service(settings_handler::get_settings)
        .service(settings_handler::update_settings)
        .service(settings_handler::clear_settings_cache)
        .service(profile_handler::me)
        .service(profile_handler::auto_geolocation)
        .service(profile_handler::sync_role)
        .service(demographics_handler::check_demographics)
        .service(demographics_handler::collect_demographics)
        .service(admin_handler::list_pending_approvals)
        .service(admin_handler::decide_approval)
        .service(admin_handler::analytics_report)
        .service(admin_handler::audit_logs)
        .service(admin_handler::send_admin_notification)
        .service(admin_handler::notify_signup);
}

/// Resolves the caller's role and checks it grants `permission`.
pub(crate) async fn authorize(
    state: &AppState,
    user: &AuthenticatedUser,
    permission: &str,
) -> AppResult<UserRole> {
    let role = state
        .profile_service
        .resolve_role(&user.claims, &user.access)
        .await?;
    require_permission(role, permission)?;
    Ok(role)
}
