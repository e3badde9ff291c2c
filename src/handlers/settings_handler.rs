use actix_web::{get, post, put, web, HttpResponse};
use serde_json::Value;

use crate::{
    app_state::AppState,
    auth::{permissions::EDIT_SETTINGS, AuthenticatedUser},
    errors::AppError,
    handlers::authorize,
    i18n::{DEFAULT_LOCALE, SUPPORTED_LOCALES},
    models::{
        domain::{AuditAction, NewAuditEntry},
        dto::response::{ApiResponse, PublicConfig},
    },
};

#[get("/settings")]
pub async fn get_settings(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let settings = state.settings_service.get_settings().await;
    Ok(HttpResponse::Ok().json(settings))
}

#[put("/settings")]
pub async fn update_settings(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    patch: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    authorize(&state, &user, EDIT_SETTINGS).await?;

    let settings = state
        .settings_service
        .update_settings(&patch, user.id(), &user.access)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(settings, "Settings updated")))
}

#[post("/settings/cache/clear")]
pub async fn clear_settings_cache(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    authorize(&state, &user, EDIT_SETTINGS).await?;

    state.settings_service.clear_cache().await;
    state
        .audit_service
        .record(
            NewAuditEntry::new(user.id(), AuditAction::SettingsCacheCleared),
            &user.access,
        )
        .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "cleared": true })))
}

/// Client-visible configuration; needs no session.
#[get("/api/config/public")]
pub async fn public_config(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(PublicConfig {
        site_url: state.config.site_url.clone(),
        measurement_id: state.config.measurement_id.clone(),
        locales: SUPPORTED_LOCALES.to_vec(),
        default_locale: DEFAULT_LOCALE,
    })
}
