use actix_web::{get, post, web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::{AutoGeolocationRequest, RoleSyncRequest},
    services::geolocation::ClientContext,
};

#[get("/me")]
pub async fn me(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let me = state.profile_service.me(&user.claims, &user.access).await?;
    Ok(HttpResponse::Ok().json(me))
}

#[post("/profile/auto-geolocation")]
pub async fn auto_geolocation(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: Option<web::Json<AutoGeolocationRequest>>,
) -> Result<HttpResponse, AppError> {
    let request = body.map(|b| b.into_inner()).unwrap_or_default();
    let context = ClientContext::from_request(&req);

    let outcome = state
        .profile_service
        .auto_geolocate(user.id(), &request, &context, &user.access)
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[post("/roles/sync")]
pub async fn sync_role(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: Option<web::Json<RoleSyncRequest>>,
) -> Result<HttpResponse, AppError> {
    let request = body.map(|b| b.into_inner()).unwrap_or_default();
    request.validate()?;

    let response = state
        .role_sync_service
        .sync(&user, request.user_id.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}
