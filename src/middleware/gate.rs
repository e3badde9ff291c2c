use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::LOCATION,
    Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;

use crate::{
    auth::{middleware::authenticate, require_role, Claims},
    i18n::{self, Locale},
    models::domain::UserRole,
};

/// First path segments (after the locale) that need a session.
pub const PROTECTED_SECTIONS: [&str; 5] = ["quiz", "results", "profile", "admin", "dashboard"];

/// Prefixes the gate never touches.
const BYPASS_PREFIXES: [&str; 7] = [
    "/api", "/auth", "/graphql", "/graphiql", "/health", "/_next", "/static",
];

#[derive(Debug, PartialEq)]
pub enum GateDecision {
    Redirect(String),
    Continue {
        locale: Locale,
        claims: Option<Claims>,
    },
    Bypass,
}

fn has_prefix(path: &str, prefix: &str) -> bool {
    path == prefix || path.starts_with(&format!("{}/", prefix))
}

/// Static files carry an extension in their last segment.
fn is_asset(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|last| last.contains('.'))
}

fn with_query(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    }
}

/// Routing decision for a page request. `session` is only consulted for
/// protected sections.
pub fn decide(
    path: &str,
    query: &str,
    fallback: Locale,
    session: impl FnOnce() -> Option<Claims>,
) -> GateDecision {
    if BYPASS_PREFIXES.iter().any(|p| has_prefix(path, p)) || is_asset(path) {
        return GateDecision::Bypass;
    }

    let Some(locale) = i18n::locale_from_path(path) else {
        let target = if path == "/" {
            format!("/{}", fallback)
        } else {
            format!("/{}{}", fallback, path)
        };
        return GateDecision::Redirect(with_query(&target, query));
    };

    let rest = i18n::strip_locale(path);
    let section = rest.trim_start_matches('/').split('/').next().unwrap_or_default();

    if !PROTECTED_SECTIONS.contains(&section) {
        return GateDecision::Continue {
            locale,
            claims: None,
        };
    }

    let Some(claims) = session() else {
        let redirect_to = urlencoding::encode(&with_query(path, query)).into_owned();
        return GateDecision::Redirect(format!("/{}/login?redirectTo={}", locale, redirect_to));
    };

    if section == "admin" && require_role(claims.role_or_default(), UserRole::Manager).is_err() {
        return GateDecision::Redirect(format!("/{}/dashboard", locale));
    }

    GateDecision::Continue {
        locale,
        claims: Some(claims),
    }
}

/// Locale prefixing and session/role gating for page routes.
pub struct GateMiddleware;

impl<S, B> Transform<S, ServiceRequest> for GateMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = GateMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(GateMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct GateMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for GateMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let fallback = i18n::request_locale(req.request());
            let decision = decide(req.path(), req.query_string(), fallback, || {
                authenticate(req.request()).ok().map(|(claims, _)| claims)
            });

            match decision {
                GateDecision::Bypass => {}
                GateDecision::Redirect(location) => {
                    log::debug!("Gate redirect {} -> {}", req.path(), location);
                    let response = HttpResponse::TemporaryRedirect()
                        .insert_header((LOCATION, location))
                        .finish();
                    return Ok(req.into_response(response).map_into_right_body());
                }
                GateDecision::Continue { locale, claims } => {
                    req.extensions_mut().insert(locale);
                    if let Some(claims) = claims {
                        req.extensions_mut().insert(claims);
                    }
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;

    fn no_session() -> Option<Claims> {
        None
    }

    #[test]
    fn non_page_paths_bypass() {
        for path in ["/api/quiz/gifts", "/auth/callback", "/health", "/favicon.ico", "/graphql"] {
            assert_eq!(decide(path, "", Locale::En, no_session), GateDecision::Bypass);
        }
        assert_ne!(decide("/apiary", "", Locale::En, no_session), GateDecision::Bypass);
    }

    #[test]
    fn missing_locale_redirects_with_query() {
        assert_eq!(
            decide("/", "", Locale::Es, no_session),
            GateDecision::Redirect("/es".to_string())
        );
        assert_eq!(
            decide("/quiz", "step=2", Locale::Pt, no_session),
            GateDecision::Redirect("/pt/quiz?step=2".to_string())
        );
    }

    #[test]
    fn protected_section_without_session_goes_to_login() {
        assert_eq!(
            decide("/es/results/abc", "", Locale::En, no_session),
            GateDecision::Redirect("/es/login?redirectTo=%2Fes%2Fresults%2Fabc".to_string())
        );
    }

    #[test]
    fn public_pages_skip_session_lookup() {
        let decision = decide("/en/about", "", Locale::En, || {
            panic!("session should not be read for public pages")
        });
        assert_eq!(
            decision,
            GateDecision::Continue {
                locale: Locale::En,
                claims: None
            }
        );
    }

    #[test]
    fn admin_requires_manager() {
        let user = || Some(fixtures::claims("user-1", Some("user")));
        assert_eq!(
            decide("/pt/admin/settings", "", Locale::En, user),
            GateDecision::Redirect("/pt/dashboard".to_string())
        );

        let manager = || Some(fixtures::claims("manager-1", Some("manager")));
        assert!(matches!(
            decide("/pt/admin", "", Locale::En, manager),
            GateDecision::Continue { locale: Locale::Pt, claims: Some(_) }
        ));
    }
}
