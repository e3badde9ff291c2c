use actix_web::{get, http::header::LOCATION, post, web, HttpRequest, HttpResponse};

use crate::{
    app_state::AppState,
    auth::session::{
        removal_cookie, session_cookies, ACCESS_TOKEN_COOKIE, CODE_VERIFIER_COOKIE,
        REFRESH_TOKEN_COOKIE,
    },
    i18n::{self, Locale},
    models::dto::request::AuthCallbackParams,
};

/// Only same-site absolute paths are accepted as a post-login target.
pub fn safe_next_path(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => "/",
    }
}

fn redirect(location: String) -> actix_web::HttpResponseBuilder {
    let mut builder = HttpResponse::Found();
    builder.insert_header((LOCATION, location));
    builder
}

fn error_redirect(state: &AppState, locale: Locale) -> HttpResponse {
    redirect(format!(
        "{}/{}/auth/auth-code-error",
        state.config.site_url, locale
    ))
    .finish()
}

#[get("/auth/callback")]
pub async fn auth_callback(
    req: HttpRequest,
    state: web::Data<AppState>,
    web::Query(params): web::Query<AuthCallbackParams>,
) -> HttpResponse {
    let locale = i18n::request_locale(&req);

    if let Some(error) = &params.error {
        log::warn!(
            "Auth provider returned {}: {}",
            error,
            params.error_description.as_deref().unwrap_or_default()
        );
        return error_redirect(&state, locale);
    }

    let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
        log::warn!("Auth callback without a code");
        return error_redirect(&state, locale);
    };

    let Some(verifier) = req.cookie(CODE_VERIFIER_COOKIE) else {
        log::warn!("Auth callback without a code verifier cookie");
        return error_redirect(&state, locale);
    };

    let session = match state
        .backend
        .exchange_code_for_session(code, verifier.value())
        .await
    {
        Ok(session) => session,
        Err(e) => {
            log::warn!("Code exchange failed: {}", e);
            return error_redirect(&state, locale);
        }
    };

    let secure = state.config.secure_cookies();
    let next = safe_next_path(params.next.as_deref());
    let mut response = redirect(format!("{}{}", state.config.site_url, next));
    for cookie in session_cookies(&session, secure) {
        response.cookie(cookie);
    }
    response.cookie(removal_cookie(CODE_VERIFIER_COOKIE, secure));

    log::info!("Session established, redirecting to {}", next);
    response.finish()
}

#[post("/auth/signout")]
pub async fn sign_out(state: web::Data<AppState>) -> HttpResponse {
    let secure = state.config.secure_cookies();
    HttpResponse::Ok()
        .cookie(removal_cookie(ACCESS_TOKEN_COOKIE, secure))
        .cookie(removal_cookie(REFRESH_TOKEN_COOKIE, secure))
        .json(serde_json::json!({ "signed_out": true }))
}
