#[cfg(test)]
pub mod fixtures {
    use std::{collections::BTreeMap, sync::Arc};

    use chrono::Utc;
    use serde_json::json;

    use crate::{
        app_state::{AppState, Integrations, Repositories},
        auth::{jwt::sign_test_token, AuthenticatedUser, Claims, JwtService},
        backend::{Access, BackendClient},
        config::Config,
        models::domain::{Answer, Gift, QuizResult, RankedGift},
        repositories::{
            analytics_repository::MockAnalyticsRepository, audit_repository::MockAuditRepository,
            demographics_repository::MockDemographicsRepository,
            profile_repository::MockProfileRepository, quiz_repository::MockQuizRepository,
            settings_repository::MockSettingsRepository,
        },
        services::{geolocation::MockGeoLookup, notification_service::MockEmailSender},
    };

    pub fn jwt_service() -> JwtService {
        JwtService::new(&Config::test_config().backend_jwt_secret)
    }

    /// Signed session token as the auth service would mint it.
    pub fn session_token(sub: &str, role: Option<&str>) -> String {
        let now = Utc::now().timestamp();
        let claims = json!({
            "sub": sub,
            "email": format!("{}@example.com", sub),
            "aud": "authenticated",
            "app_metadata": { "role": role, "provider": "email" },
            "user_metadata": {},
            "iat": now,
            "exp": now + 3600,
        });
        sign_test_token(&Config::test_config().backend_jwt_secret, &claims)
    }

    pub fn claims(sub: &str, role: Option<&str>) -> Claims {
        serde_json::from_value(json!({
            "sub": sub,
            "email": format!("{}@example.com", sub),
            "aud": "authenticated",
            "app_metadata": { "role": role },
            "exp": 4102444800u64,
        }))
        .expect("fixture claims should deserialize")
    }

    pub fn authenticated_user(sub: &str, role: Option<&str>) -> AuthenticatedUser {
        AuthenticatedUser {
            claims: claims(sub, role),
            access: Access::User(format!("token-{}", sub)),
        }
    }

    /// The seven gifts in catalogue order.
    pub fn gifts() -> Vec<Gift> {
        vec![
            Gift::new("A_PROPHECY", "Prophecy"),
            Gift::new("B_SERVICE", "Service"),
            Gift::new("C_TEACHING", "Teaching"),
            Gift::new("D_EXHORTATION", "Exhortation"),
            Gift::new("E_GIVING", "Giving"),
            Gift::new("F_LEADERSHIP", "Leadership"),
            Gift::new("G_MERCY", "Mercy"),
        ]
    }

    /// One answer per `(gift_key, value)` pair, numbered questions.
    pub fn answers(pairs: &[(&str, i32)]) -> Vec<Answer> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, (key, value))| Answer::new(&format!("q{}", i + 1), key, *value))
            .collect()
    }

    pub fn result(session_id: &str, user_id: &str) -> QuizResult {
        QuizResult {
            session_id: session_id.to_string(),
            user_id: Some(user_id.to_string()),
            scores: BTreeMap::from([
                ("C_TEACHING".to_string(), 12),
                ("G_MERCY".to_string(), 9),
            ]),
            ranked: vec![
                RankedGift {
                    key: "C_TEACHING".to_string(),
                    name: "Teaching".to_string(),
                    score: 12,
                },
                RankedGift {
                    key: "G_MERCY".to_string(),
                    name: "Mercy".to_string(),
                    score: 9,
                },
            ],
            top_gifts: vec!["Teaching".to_string(), "Mercy".to_string()],
            analysis: None,
            completed_at: Some(Utc::now()),
        }
    }

    /// Repositories backed by expectation-free mocks; tests replace the
    /// fields they exercise.
    pub fn repositories() -> Repositories {
        let mut settings = MockSettingsRepository::new();
        settings.expect_get_settings().returning(|| Ok(None));

        Repositories {
            quiz: Arc::new(MockQuizRepository::new()),
            settings: Arc::new(settings),
            profiles: Arc::new(MockProfileRepository::new()),
            demographics: Arc::new(MockDemographicsRepository::new()),
            audit: Arc::new(MockAuditRepository::new()),
            analytics: Arc::new(MockAnalyticsRepository::new()),
        }
    }

    pub fn integrations() -> Integrations {
        let mut email = MockEmailSender::new();
        email.expect_is_configured().return_const(false);

        Integrations {
            geo: Arc::new(MockGeoLookup::new()),
            email: Arc::new(email),
            analysis: None,
        }
    }

    pub fn state(repositories: Repositories) -> AppState {
        let config = Config::test_config();
        let backend = BackendClient::new(&config).expect("test backend client");
        AppState::with_parts(config, backend, repositories, integrations())
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn session_token_round_trips_through_verifier() {
        let claims = jwt_service()
            .validate_token(&session_token("user-1", Some("manager")))
            .unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(
            claims.session_role(),
            Some(crate::models::domain::UserRole::Manager)
        );
    }

    #[test]
    fn answers_are_numbered() {
        let answers = answers(&[("A_PROPHECY", 3), ("B_SERVICE", 1)]);
        assert_eq!(answers[1].question_id, "q2");
        assert_eq!(answers[1].gift_key, "B_SERVICE");
    }
}
