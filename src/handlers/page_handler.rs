use actix_web::{get, HttpMessage, HttpRequest, HttpResponse};

use crate::{
    auth::{MaybeUser, Permissions},
    errors::AppError,
    i18n::Locale,
    models::dto::response::{PageContext, PageUser},
};

fn page_context(req: &HttpRequest, segment: &str, user: MaybeUser) -> Result<PageContext, AppError> {
    // The gate stores the locale it resolved; without it, trust only the path.
    let stored = req.extensions().get::<Locale>().copied();
    let locale = stored
        .or_else(|| Locale::from_tag(segment).filter(|l| l.as_str() == segment))
        .ok_or_else(|| AppError::NotFound(format!("No page at '{}'", req.path())))?;

    let (user, permissions) = match user.0 {
        Some(claims) => {
            let role = claims.role_or_default();
            let user = PageUser {
                name: claims.full_name(),
                id: claims.sub,
                email: claims.email,
                role,
            };
            (Some(user), Some(Permissions::for_role(role)))
        }
        None => (None, None),
    };

    Ok(PageContext {
        locale,
        path: req.path().to_string(),
        user,
        permissions,
    })
}

#[get("/{locale}")]
pub async fn locale_root(req: HttpRequest, user: MaybeUser) -> Result<HttpResponse, AppError> {
    let segment = req.match_info().get("locale").unwrap_or_default().to_string();
    Ok(HttpResponse::Ok().json(page_context(&req, &segment, user)?))
}

#[get("/{locale}/{tail:.*}")]
pub async fn page(req: HttpRequest, user: MaybeUser) -> Result<HttpResponse, AppError> {
    let segment = req.match_info().get("locale").unwrap_or_default().to_string();
    Ok(HttpResponse::Ok().json(page_context(&req, &segment, user)?))
}
