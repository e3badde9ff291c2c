use actix_web::{get, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::{
        permissions::{APPROVE_USERS, SEND_NOTIFICATIONS, VIEW_ANALYTICS, VIEW_AUDIT_LOGS},
        AuthenticatedUser,
    },
    errors::AppError,
    handlers::authorize,
    i18n::{self, Locale},
    models::dto::request::{
        AdminNotificationRequest, AnalyticsQuery, ApprovalDecisionRequest, AuditLogQuery,
        NotificationKind,
    },
    services::notification_service::NotificationEvent,
};

#[get("/admin/approvals")]
pub async fn list_pending_approvals(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    authorize(&state, &user, APPROVE_USERS).await?;

    let pending = state.approval_service.pending(&user.access).await?;
    Ok(HttpResponse::Ok().json(pending))
}

#[post("/admin/approvals/{user_id}")]
pub async fn decide_approval(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    user_id: web::Path<String>,
    decision: web::Json<ApprovalDecisionRequest>,
) -> Result<HttpResponse, AppError> {
    authorize(&state, &user, APPROVE_USERS).await?;

    state
        .approval_service
        .decide(&user, &user_id, &decision)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "user_id": user_id.into_inner(),
        "approved": decision.approved,
    })))
}

#[get("/admin/analytics")]
pub async fn analytics_report(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<AnalyticsQuery>,
) -> Result<HttpResponse, AppError> {
    authorize(&state, &user, VIEW_ANALYTICS).await?;

    let report = state
        .analytics_service
        .report(&query, &user.access)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

#[get("/admin/audit-logs")]
pub async fn audit_logs(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<AuditLogQuery>,
) -> Result<HttpResponse, AppError> {
    authorize(&state, &user, VIEW_AUDIT_LOGS).await?;
    query.validate()?;

    let page = state.audit_service.list(&query, &user.access).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/admin/notifications")]
pub async fn send_admin_notification(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    request: web::Json<AdminNotificationRequest>,
) -> Result<HttpResponse, AppError> {
    authorize(&state, &user, SEND_NOTIFICATIONS).await?;
    request.validate()?;

    let request = request.into_inner();
    let locale = request
        .locale
        .as_deref()
        .and_then(Locale::from_tag)
        .unwrap_or_else(|| i18n::request_locale(&req));
    let event = match request.kind {
        NotificationKind::NewSignup => NotificationEvent::NewSignup {
            email: request.email,
            name: request.name,
        },
        NotificationKind::PendingApproval => NotificationEvent::PendingApproval {
            email: request.email,
            name: request.name,
        },
    };

    let outcome = state
        .notification_service
        .notify_admins(&event, locale, user.id())
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Announces the caller's own signup to the admins.
#[post("/notifications/signup")]
pub async fn notify_signup(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let email = user
        .claims
        .email
        .clone()
        .ok_or_else(|| AppError::BadRequest("Session has no email address".to_string()))?;

    // A missing profile means the backend has not finished creating it yet.
    let profile = state
        .profile_service
        .get_profile(user.id(), &user.access)
        .await?;
    if profile.is_some_and(|p| !p.may_announce_signup(Utc::now())) {
        log::warn!("Repeated signup notification refused for {}", user.id());
        return Err(AppError::Forbidden(
            "Signup notifications are only sent for new accounts".to_string(),
        ));
    }

    let event = NotificationEvent::NewSignup {
        email,
        name: user.claims.full_name(),
    };
    let outcome = state
        .notification_service
        .notify_admins(&event, i18n::request_locale(&req), user.id())
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}
