use std::sync::Arc;

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use crate::{
    auth::{permissions::VIEW_USERS, require_owner_or_permission, AuthenticatedUser},
    constants::analysis_prompt::GIFT_ANALYSIS_PROMPT,
    errors::{AppError, AppResult},
    i18n::Locale,
    models::domain::{GiftAnalysis, RankedGift, UserRole},
    repositories::QuizRepository,
    services::settings_service::SettingsService,
};

#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisRequest {
    pub ranked: Vec<RankedGift>,
    pub top_gifts: Vec<String>,
    pub locale: Locale,
    pub model: String,
    pub max_tokens: u32,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisModel: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> AppResult<GiftAnalysis>;
}

pub struct OpenAiAnalysisModel {
    client: Client<OpenAIConfig>,
}

impl OpenAiAnalysisModel {
    pub fn new(api_key: &SecretString) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key.expose_secret());
        Self {
            client: Client::with_config(config),
        }
    }
}

/// JSON schema of [`GiftAnalysis`] in the shape strict structured outputs
/// accept.
pub fn analysis_schema() -> AppResult<Value> {
    let mut schema = serde_json::to_value(schemars::schema_for!(GiftAnalysis))?;
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }
    Ok(schema)
}

fn user_message(request: &AnalysisRequest) -> String {
    let scores: Vec<Value> = request
        .ranked
        .iter()
        .map(|gift| json!({ "gift": gift.name, "score": gift.score }))
        .collect();

    json!({
        "language": request.locale.language_name(),
        "top_gifts": request.top_gifts,
        "ranked_scores": scores,
    })
    .to_string()
}

/// Pulls the assistant's JSON answer out of a chat completion response.
fn parse_completion(response: &Value) -> AppResult<GiftAnalysis> {
    let message = &response["choices"][0]["message"];

    if let Some(refusal) = message["refusal"].as_str() {
        return Err(AppError::ExternalServiceError(format!(
            "Model refused the analysis: {}",
            refusal
        )));
    }

    let content = message["content"].as_str().ok_or_else(|| {
        AppError::ExternalServiceError("Model returned no analysis content".to_string())
    })?;

    serde_json::from_str(content).map_err(|e| {
        AppError::ExternalServiceError(format!("Model returned malformed analysis: {}", e))
    })
}

#[async_trait]
impl AnalysisModel for OpenAiAnalysisModel {
    async fn analyze(&self, request: &AnalysisRequest) -> AppResult<GiftAnalysis> {
        let body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "messages": [
                { "role": "system", "content": GIFT_ANALYSIS_PROMPT },
                { "role": "user", "content": user_message(request) },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "gift_analysis",
                    "strict": true,
                    "schema": analysis_schema()?,
                },
            },
        });

        let response: Value = self
            .client
            .chat()
            .create_byot(body)
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("OpenAI request failed: {}", e)))?;

        parse_completion(&response)
    }
}

pub struct AnalysisService {
    model: Option<Arc<dyn AnalysisModel>>,
    default_model: String,
    quiz: Arc<dyn QuizRepository>,
    settings: Arc<SettingsService>,
}

impl AnalysisService {
    /// `model` is `None` when no API key is configured.
    pub fn new(
        model: Option<Arc<dyn AnalysisModel>>,
        default_model: String,
        quiz: Arc<dyn QuizRepository>,
        settings: Arc<SettingsService>,
    ) -> Self {
        Self {
            model,
            default_model,
            quiz,
            settings,
        }
    }

    pub async fn analyze_result(
        &self,
        user: &AuthenticatedUser,
        role: UserRole,
        session_id: &str,
        locale: Locale,
    ) -> AppResult<GiftAnalysis> {
        let settings = self.settings.get_settings().await;
        if !settings.ai.enabled {
            return Err(AppError::BadRequest("AI analysis is disabled".to_string()));
        }
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("AI analysis is not configured".to_string()))?;

        let result = self
            .quiz
            .get_result(session_id, &user.access)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Result '{}' not found", session_id)))?;
        require_owner_or_permission(
            &user.claims,
            role,
            result.user_id.as_deref().unwrap_or_default(),
            VIEW_USERS,
        )?;

        let request = AnalysisRequest {
            ranked: result.ranked,
            top_gifts: result.top_gifts,
            locale,
            model: if settings.ai.model.trim().is_empty() {
                self.default_model.clone()
            } else {
                settings.ai.model.clone()
            },
            max_tokens: settings.ai.max_tokens,
        };

        let analysis = model.analyze(&request).await?;
        self.quiz
            .save_analysis(session_id, &analysis, &user.access)
            .await?;

        log::info!("AI analysis stored for result {}", session_id);
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        repositories::{
            audit_repository::MockAuditRepository, quiz_repository::MockQuizRepository,
            settings_repository::MockSettingsRepository,
        },
        services::audit_service::AuditService,
        test_utils::fixtures,
    };
    use std::time::Duration;

    fn settings(overrides: Value) -> Arc<SettingsService> {
        let mut repo = MockSettingsRepository::new();
        repo.expect_get_settings()
            .returning(move || Ok(Some(overrides.clone())));
        Arc::new(SettingsService::new(
            Arc::new(repo),
            Arc::new(AuditService::new(Arc::new(MockAuditRepository::new()))),
            Duration::from_secs(300),
        ))
    }

    fn analysis() -> GiftAnalysis {
        GiftAnalysis {
            summary: "A caring mentor.".to_string(),
            strengths: vec!["Explaining clearly".to_string()],
            growth_areas: vec!["Leading groups".to_string()],
            ministry_suggestions: vec!["Small group leader".to_string()],
        }
    }

    #[test]
    fn schema_is_strict_object() {
        let schema = analysis_schema().unwrap();
        assert!(schema.get("$schema").is_none());
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["required"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn completion_content_is_parsed() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": serde_json::to_string(&analysis()).unwrap(),
                    "refusal": null
                }
            }]
        });
        assert_eq!(parse_completion(&response).unwrap(), analysis());
    }

    #[test]
    fn refusal_is_an_external_error() {
        let response = json!({
            "choices": [{ "message": { "content": null, "refusal": "cannot help" } }]
        });
        assert!(matches!(
            parse_completion(&response),
            Err(AppError::ExternalServiceError(_))
        ));
    }

    #[test]
    fn user_message_names_the_language() {
        let request = AnalysisRequest {
            ranked: vec![RankedGift {
                key: "C_TEACHING".to_string(),
                name: "Ensino".to_string(),
                score: 12,
            }],
            top_gifts: vec!["Ensino".to_string()],
            locale: Locale::Pt,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 500,
        };
        let message: Value = serde_json::from_str(&user_message(&request)).unwrap();
        assert_eq!(message["language"], "Portuguese");
        assert_eq!(message["ranked_scores"][0]["score"], 12);
    }

    #[tokio::test]
    async fn disabled_ai_is_a_bad_request() {
        let service = AnalysisService::new(
            Some(Arc::new(MockAnalysisModel::new())),
            "gpt-4o-mini".to_string(),
            Arc::new(MockQuizRepository::new()),
            settings(json!({ "ai": { "enabled": false } })),
        );
        let user = fixtures::authenticated_user("user-1", None);

        let result = service
            .analyze_result(&user, UserRole::User, "s-1", Locale::En)
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn missing_api_key_is_a_bad_request() {
        let service = AnalysisService::new(
            None,
            "gpt-4o-mini".to_string(),
            Arc::new(MockQuizRepository::new()),
            settings(json!({})),
        );
        let user = fixtures::authenticated_user("user-1", None);

        let result = service
            .analyze_result(&user, UserRole::User, "s-1", Locale::En)
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn analysis_is_generated_and_saved() {
        let mut quiz = MockQuizRepository::new();
        quiz.expect_get_result()
            .returning(|id, _| Ok(Some(fixtures::result(id, "user-1"))));
        quiz.expect_save_analysis()
            .withf(|id, analysis, _| id == "s-1" && analysis.summary == "A caring mentor.")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut model = MockAnalysisModel::new();
        model
            .expect_analyze()
            .withf(|request| {
                request.locale == Locale::Es && request.model == "gpt-4o" && request.max_tokens == 800
            })
            .times(1)
            .returning(|_| Ok(analysis()));

        let service = AnalysisService::new(
            Some(Arc::new(model)),
            "gpt-4o-mini".to_string(),
            Arc::new(quiz),
            settings(json!({ "ai": { "model": "gpt-4o", "max_tokens": 800 } })),
        );
        let user = fixtures::authenticated_user("user-1", None);

        let result = service
            .analyze_result(&user, UserRole::User, "s-1", Locale::Es)
            .await
            .unwrap();
        assert_eq!(result, analysis());
    }
}
