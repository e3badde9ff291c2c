use actix_web::{
    cookie::{time::Duration, Cookie, SameSite},
    http::header::Header,
    HttpRequest,
};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use serde::Deserialize;

pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";
pub const CODE_VERIFIER_COOKIE: &str = "sb-code-verifier";

const REFRESH_COOKIE_MAX_AGE_DAYS: i64 = 30;

/// Session returned by the auth service's code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

fn default_expires_in() -> i64 {
    3600
}

/// Session token from the access-token cookie, falling back to a bearer
/// `Authorization` header for non-browser clients.
pub fn extract_session_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(ACCESS_TOKEN_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    Authorization::<Bearer>::parse(req)
        .ok()
        .map(|auth| auth.into_scheme().token().to_string())
        .filter(|token| !token.is_empty())
}

fn base_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .finish()
}

pub fn session_cookies(session: &Session, secure: bool) -> Vec<Cookie<'static>> {
    let mut access = base_cookie(ACCESS_TOKEN_COOKIE, session.access_token.clone(), secure);
    access.set_max_age(Duration::seconds(session.expires_in.max(0)));

    let mut refresh = base_cookie(REFRESH_TOKEN_COOKIE, session.refresh_token.clone(), secure);
    refresh.set_max_age(Duration::days(REFRESH_COOKIE_MAX_AGE_DAYS));

    vec![access, refresh]
}

pub fn removal_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(name, String::new(), secure);
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn cookie_token_takes_precedence() {
        let req = TestRequest::default()
            .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, "cookie-token"))
            .insert_header(("Authorization", "Bearer header-token"))
            .to_http_request();

        assert_eq!(extract_session_token(&req).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn bearer_header_is_a_fallback() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer header-token"))
            .to_http_request();

        assert_eq!(extract_session_token(&req).as_deref(), Some("header-token"));
    }

    #[test]
    fn missing_token_is_none() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_http_request();

        assert!(extract_session_token(&req).is_none());
    }

    #[test]
    fn session_cookies_are_http_only() {
        let session = Session {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_in: 3600,
            user: None,
        };

        let cookies = session_cookies(&session, true);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.http_only() == Some(true)));
        assert!(cookies.iter().all(|c| c.secure() == Some(true)));
        assert_eq!(cookies[0].max_age(), Some(Duration::seconds(3600)));
    }
}
