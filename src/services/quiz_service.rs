use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    auth::{permissions::VIEW_USERS, require_owner_or_permission, AuthenticatedUser},
    backend::Access,
    errors::{AppError, AppResult},
    i18n::Locale,
    models::{
        domain::{AppSettings, Gift, QuizQuestion, QuizResult, QuizSession, UserRole},
        dto::request::SubmitAnswersRequest,
    },
    repositories::QuizRepository,
    services::{
        scoring::{calculate_scores, get_top_gifts, rank_gifts},
        settings_service::SettingsService,
    },
};

pub struct QuizService {
    repository: Arc<dyn QuizRepository>,
    settings: Arc<SettingsService>,
}

impl QuizService {
    pub fn new(repository: Arc<dyn QuizRepository>, settings: Arc<SettingsService>) -> Self {
        Self {
            repository,
            settings,
        }
    }

    /// Requested locale when supported, else the configured default.
    pub async fn locale_or_default(&self, requested: Option<&str>) -> Locale {
        if let Some(locale) = requested.and_then(Locale::from_tag) {
            return locale;
        }
        let settings = self.settings.get_settings().await;
        Locale::from_tag(&settings.general.default_locale).unwrap_or_default()
    }

    pub async fn get_gifts(&self, locale: Option<&str>, access: &Access) -> AppResult<Vec<Gift>> {
        let locale = self.locale_or_default(locale).await;
        self.repository.get_gifts(locale.as_str(), access).await
    }

    pub async fn get_questions(
        &self,
        locale: Option<&str>,
        access: &Access,
    ) -> AppResult<Vec<QuizQuestion>> {
        let locale = self.locale_or_default(locale).await;
        let mut questions = self.repository.get_questions(locale.as_str(), access).await?;
        questions.sort_by_key(|q| q.order);
        Ok(questions)
    }

    pub async fn start_session(
        &self,
        user: &AuthenticatedUser,
        locale: Option<&str>,
    ) -> AppResult<QuizSession> {
        let settings = self.settings.get_settings().await;
        self.ensure_retake_allowed(user, &settings).await?;

        let locale = self.locale_or_default(locale).await;
        let session = self
            .repository
            .start_session(user.id(), locale.as_str(), &user.access)
            .await?;

        log::info!("Quiz session {} started by {}", session.id, user.id());
        Ok(session)
    }

    /// With retakes off, a user who already holds a result may neither start
    /// nor finish another session.
    async fn ensure_retake_allowed(
        &self,
        user: &AuthenticatedUser,
        settings: &AppSettings,
    ) -> AppResult<()> {
        if settings.quiz.allow_retake {
            return Ok(());
        }
        let previous = self.repository.list_results(user.id(), &user.access).await?;
        if !previous.is_empty() {
            return Err(AppError::BadRequest(
                "Retaking the quiz is disabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads a session the caller owns that is still open.
    async fn open_session(&self, user: &AuthenticatedUser, session_id: &str) -> AppResult<QuizSession> {
        let session = self
            .repository
            .get_session(session_id, &user.access)
            .await?
            .filter(|s| s.user_id == user.id())
            .ok_or_else(|| AppError::NotFound(format!("Quiz session '{}' not found", session_id)))?;

        if session.completed {
            return Err(AppError::BadRequest(format!(
                "Quiz session '{}' is already completed",
                session_id
            )));
        }
        Ok(session)
    }

    pub async fn submit_answers(
        &self,
        user: &AuthenticatedUser,
        session_id: &str,
        request: &SubmitAnswersRequest,
    ) -> AppResult<()> {
        request.validate()?;
        self.open_session(user, session_id).await?;

        self.repository
            .save_answers(session_id, &request.answers, &user.access)
            .await?;

        log::debug!("Saved {} answers for session {}", request.answers.len(), session_id);
        Ok(())
    }

    /// Scores the session's answers, stores the result and closes the session.
    pub async fn complete_session(
        &self,
        user: &AuthenticatedUser,
        session_id: &str,
    ) -> AppResult<QuizResult> {
        let session = self.open_session(user, session_id).await?;
        let settings = self.settings.get_settings().await;
        self.ensure_retake_allowed(user, &settings).await?;

        let answers = self.repository.get_answers(session_id, &user.access).await?;
        if answers.is_empty() {
            return Err(AppError::BadRequest(
                "Cannot complete a quiz without answers".to_string(),
            ));
        }

        let locale = self.locale_or_default(session.locale.as_deref()).await;
        let gifts = self.repository.get_gifts(locale.as_str(), &user.access).await?;

        let scores = calculate_scores(&answers, &gifts);
        let ranked = rank_gifts(&scores, &gifts);
        let top_gifts = get_top_gifts(&scores, &gifts, settings.quiz.top_gifts_count as usize);

        self.repository
            .complete_session(session_id, &scores, &ranked, &top_gifts, &user.access)
            .await?;

        log::info!(
            "Quiz session {} completed by {} with top gifts {:?}",
            session_id,
            user.id(),
            top_gifts
        );

        Ok(QuizResult {
            session_id: session_id.to_string(),
            user_id: Some(user.id().to_string()),
            scores,
            ranked,
            top_gifts,
            analysis: None,
            completed_at: Some(Utc::now()),
        })
    }

    pub async fn list_results(&self, user: &AuthenticatedUser) -> AppResult<Vec<QuizResult>> {
        self.repository.list_results(user.id(), &user.access).await
    }

    /// A result the caller owns, or any result for roles that can view users.
    pub async fn get_result(
        &self,
        user: &AuthenticatedUser,
        role: UserRole,
        session_id: &str,
    ) -> AppResult<QuizResult> {
        let result = self
            .repository
            .get_result(session_id, &user.access)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Result '{}' not found", session_id)))?;

        let owner = result.user_id.as_deref().unwrap_or_default();
        require_owner_or_permission(&user.claims, role, owner, VIEW_USERS)?;

        Ok(result)
    }
}
