use std::env;
use secrecy::SecretString;

const DEV_JWT_SECRET: &str = "dev_jwt_secret_change_in_production_0000";
const DEV_SERVICE_ROLE_KEY: &str = "service-role-key";

#[derive(Clone, Debug)]
pub struct Config {
    pub backend_url: String,
    pub backend_anon_key: SecretString,
    pub backend_service_role_key: SecretString,
    pub backend_jwt_secret: SecretString,
    pub site_url: String,
    pub measurement_id: Option<String>,
    pub openai_api_key: Option<SecretString>,
    pub openai_model: String,
    pub email_api_url: Option<String>,
    pub email_api_key: Option<SecretString>,
    pub email_from: String,
    pub geolocation_api_url: String,
    pub reverse_geocode_url: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub settings_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            backend_url: env::var("BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:54321".to_string())
                .trim_end_matches('/')
                .to_string(),
            backend_anon_key: SecretString::from(
                env::var("BACKEND_ANON_KEY").unwrap_or_else(|_| "anon-key".to_string()),
            ),
            backend_service_role_key: SecretString::from(
                env::var("BACKEND_SERVICE_ROLE_KEY")
                    .unwrap_or_else(|_| DEV_SERVICE_ROLE_KEY.to_string()),
            ),
            backend_jwt_secret: SecretString::from(
                env::var("BACKEND_JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string()),
            ),
            site_url: resolve_site_url(
                env::var("SITE_URL").ok(),
                env::var("NEXT_PUBLIC_SITE_URL").ok(),
                env::var("VERCEL_URL").ok(),
            ),
            measurement_id: non_empty_var("GA_MEASUREMENT_ID"),
            openai_api_key: non_empty_var("OPENAI_API_KEY").map(SecretString::from),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            email_api_url: non_empty_var("EMAIL_API_URL"),
            email_api_key: non_empty_var("EMAIL_API_KEY").map(SecretString::from),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Spiritual Gifts <no-reply@localhost>".to_string()),
            geolocation_api_url: env::var("GEOLOCATION_API_URL")
                .unwrap_or_else(|_| "https://ipapi.co".to_string())
                .trim_end_matches('/')
                .to_string(),
            reverse_geocode_url: env::var("REVERSE_GEOCODE_URL").unwrap_or_else(|_| {
                "https://nominatim.openstreetmap.org/reverse".to_string()
            }),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            settings_cache_ttl_secs: env::var("SETTINGS_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        }
    }

    /// Whether cookies set by this server should carry the `Secure` flag.
    pub fn secure_cookies(&self) -> bool {
        self.site_url.starts_with("https://")
    }

    /// Validate that production-critical configuration is set
    /// Panics if required secrets are using default values
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        let jwt_secret = self.backend_jwt_secret.expose_secret();

        if jwt_secret == DEV_JWT_SECRET {
            panic!(
                "FATAL: BACKEND_JWT_SECRET is using default value! Set it to the backend's JWT secret."
            );
        }

        if jwt_secret.len() < 32 {
            panic!(
                "FATAL: BACKEND_JWT_SECRET is too short ({}). Must be at least 32 characters.",
                jwt_secret.len()
            );
        }

        if self.backend_service_role_key.expose_secret() == DEV_SERVICE_ROLE_KEY {
            panic!(
                "FATAL: BACKEND_SERVICE_ROLE_KEY is using default value! Set BACKEND_SERVICE_ROLE_KEY."
            );
        }

        if self.site_url.starts_with("http://localhost") {
            panic!("FATAL: SITE_URL points at localhost in production.");
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            backend_url: "http://127.0.0.1:1".to_string(),
            backend_anon_key: SecretString::from("anon-key".to_string()),
            backend_service_role_key: SecretString::from("service-key".to_string()),
            backend_jwt_secret: SecretString::from("test_jwt_secret_key_for_sessions".to_string()),
            site_url: "http://localhost:3000".to_string(),
            measurement_id: Some("G-TEST".to_string()),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            email_api_url: None,
            email_api_key: None,
            email_from: "test@example.com".to_string(),
            geolocation_api_url: "http://127.0.0.1:1".to_string(),
            reverse_geocode_url: "http://127.0.0.1:1/reverse".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            settings_cache_ttl_secs: 300,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// First configured site URL variant wins. `VERCEL_URL` carries no scheme.
pub fn resolve_site_url(
    site_url: Option<String>,
    public_site_url: Option<String>,
    vercel_url: Option<String>,
) -> String {
    let url = site_url
        .filter(|v| !v.is_empty())
        .or_else(|| public_site_url.filter(|v| !v.is_empty()))
        .or_else(|| {
            vercel_url
                .filter(|v| !v.is_empty())
                .map(|host| format!("https://{}", host))
        })
        .unwrap_or_else(|| "http://localhost:3000".to_string());

    url.trim_end_matches('/').to_string()
}
