use actix_web::{get, post, web, HttpRequest, HttpResponse};

use crate::{
    app_state::AppState,
    auth::{permissions::VIEW_OWN_RESULTS, AuthenticatedUser},
    errors::AppError,
    handlers::authorize,
    i18n::{self, Locale},
    models::dto::{
        request::{LocaleQuery, StartSessionRequest, SubmitAnswersRequest},
        response::SessionCreated,
    },
};

#[get("/quiz/gifts")]
pub async fn get_gifts(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<LocaleQuery>,
) -> Result<HttpResponse, AppError> {
    let gifts = state
        .quiz_service
        .get_gifts(query.locale.as_deref(), &user.access)
        .await?;
    Ok(HttpResponse::Ok().json(gifts))
}

#[get("/quiz/questions")]
pub async fn get_questions(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<LocaleQuery>,
) -> Result<HttpResponse, AppError> {
    let questions = state
        .quiz_service
        .get_questions(query.locale.as_deref(), &user.access)
        .await?;
    Ok(HttpResponse::Ok().json(questions))
}

#[post("/quiz/sessions")]
pub async fn start_session(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: Option<web::Json<StartSessionRequest>>,
) -> Result<HttpResponse, AppError> {
    let request = body.map(|b| b.into_inner()).unwrap_or_default();

    let session = state
        .quiz_service
        .start_session(&user, request.locale.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(SessionCreated {
        session_id: session.id,
    }))
}

#[post("/quiz/sessions/{id}/answers")]
pub async fn submit_answers(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<String>,
    request: web::Json<SubmitAnswersRequest>,
) -> Result<HttpResponse, AppError> {
    state
        .quiz_service
        .submit_answers(&user, &id, &request)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/quiz/sessions/{id}/complete")]
pub async fn complete_session(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let result = state.quiz_service.complete_session(&user, &id).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[get("/quiz/results")]
pub async fn list_results(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let results = state.quiz_service.list_results(&user).await?;
    Ok(HttpResponse::Ok().json(results))
}

#[get("/quiz/results/{id}")]
pub async fn get_result(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let role = authorize(&state, &user, VIEW_OWN_RESULTS).await?;
    let result = state.quiz_service.get_result(&user, role, &id).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[post("/quiz/results/{id}/analysis")]
pub async fn analyze_result(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<String>,
    query: web::Query<LocaleQuery>,
) -> Result<HttpResponse, AppError> {
    let role = authorize(&state, &user, VIEW_OWN_RESULTS).await?;
    let locale = query
        .locale
        .as_deref()
        .and_then(Locale::from_tag)
        .unwrap_or_else(|| i18n::request_locale(&req));

    let analysis = state
        .analysis_service
        .analyze_result(&user, role, &id, locale)
        .await?;
    Ok(HttpResponse::Ok().json(analysis))
}
