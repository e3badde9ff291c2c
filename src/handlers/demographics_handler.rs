use actix_web::{get, post, web, HttpRequest, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::DemographicsRequest,
    services::geolocation::ClientContext,
};

#[get("/demographics")]
pub async fn check_demographics(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let status = state
        .demographics_service
        .check(user.id(), &user.access)
        .await?;
    Ok(HttpResponse::Ok().json(status))
}

#[post("/demographics")]
pub async fn collect_demographics(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    request: web::Json<DemographicsRequest>,
) -> Result<HttpResponse, AppError> {
    let context = ClientContext::from_request(&req);
    let record = state
        .demographics_service
        .collect(user.id(), &request, &context, &user.access)
        .await?;
    Ok(HttpResponse::Created().json(record))
}
