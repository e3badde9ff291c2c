use std::{sync::Arc, time::Duration};

use crate::{
    auth::JwtService,
    backend::BackendClient,
    config::Config,
    errors::AppResult,
    repositories::{
        AnalyticsRepository, AuditRepository, DemographicsRepository, ProfileRepository,
        QuizRepository, RpcAnalyticsRepository, RpcAuditRepository, RpcDemographicsRepository,
        RpcProfileRepository, RpcQuizRepository, RpcSettingsRepository, SettingsRepository,
    },
    services::{
        analysis_service::{AnalysisModel, AnalysisService, OpenAiAnalysisModel},
        analytics_service::AnalyticsService,
        approval_service::ApprovalService,
        audit_service::AuditService,
        demographics_service::DemographicsService,
        geolocation::{GeoLookup, GeolocationService, HttpGeoLookup},
        notification_service::{EmailSender, HttpEmailSender, NotificationService},
        profile_service::ProfileService,
        quiz_service::QuizService,
        role_sync_service::RoleSyncService,
        settings_service::SettingsService,
    },
};

/// Data access, one trait object per concern.
pub struct Repositories {
    pub quiz: Arc<dyn QuizRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub demographics: Arc<dyn DemographicsRepository>,
    pub audit: Arc<dyn AuditRepository>,
    pub analytics: Arc<dyn AnalyticsRepository>,
}

impl Repositories {
    pub fn rpc(backend: &BackendClient) -> Self {
        Self {
            quiz: Arc::new(RpcQuizRepository::new(backend.clone())),
            settings: Arc::new(RpcSettingsRepository::new(backend.clone())),
            profiles: Arc::new(RpcProfileRepository::new(backend.clone())),
            demographics: Arc::new(RpcDemographicsRepository::new(backend.clone())),
            audit: Arc::new(RpcAuditRepository::new(backend.clone())),
            analytics: Arc::new(RpcAnalyticsRepository::new(backend.clone())),
        }
    }
}

/// Third-party services outside the backend.
pub struct Integrations {
    pub geo: Arc<dyn GeoLookup>,
    pub email: Arc<dyn EmailSender>,
    /// `None` when no AI key is configured.
    pub analysis: Option<Arc<dyn AnalysisModel>>,
}

impl Integrations {
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let analysis = config
            .openai_api_key
            .as_ref()
            .map(|key| Arc::new(OpenAiAnalysisModel::new(key)) as Arc<dyn AnalysisModel>);

        Ok(Self {
            geo: Arc::new(HttpGeoLookup::new(config)?),
            email: Arc::new(HttpEmailSender::new(config)?),
            analysis,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backend: BackendClient,
    pub jwt_service: JwtService,
    pub settings_service: Arc<SettingsService>,
    pub audit_service: Arc<AuditService>,
    pub quiz_service: Arc<QuizService>,
    pub analysis_service: Arc<AnalysisService>,
    pub profile_service: Arc<ProfileService>,
    pub demographics_service: Arc<DemographicsService>,
    pub notification_service: Arc<NotificationService>,
    pub role_sync_service: Arc<RoleSyncService>,
    pub approval_service: Arc<ApprovalService>,
    pub analytics_service: Arc<AnalyticsService>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let backend = BackendClient::new(&config)?;
        let repositories = Repositories::rpc(&backend);
        let integrations = Integrations::from_config(&config)?;

        if integrations.analysis.is_none() {
            log::warn!("OPENAI_API_KEY not set; AI analysis is unavailable");
        }

        Ok(Self::with_parts(config, backend, repositories, integrations))
    }

    pub fn with_parts(
        config: Config,
        backend: BackendClient,
        repositories: Repositories,
        integrations: Integrations,
    ) -> Self {
        let audit_service = Arc::new(AuditService::new(repositories.audit.clone()));
        let settings_service = Arc::new(SettingsService::new(
            repositories.settings.clone(),
            audit_service.clone(),
            Duration::from_secs(config.settings_cache_ttl_secs),
        ));
        let geolocation = Arc::new(GeolocationService::new(integrations.geo));

        let quiz_service = Arc::new(QuizService::new(
            repositories.quiz.clone(),
            settings_service.clone(),
        ));
        let analysis_service = Arc::new(AnalysisService::new(
            integrations.analysis,
            config.openai_model.clone(),
            repositories.quiz.clone(),
            settings_service.clone(),
        ));
        let profile_service = Arc::new(ProfileService::new(
            repositories.profiles.clone(),
            geolocation.clone(),
        ));
        let demographics_service = Arc::new(DemographicsService::new(
            repositories.demographics.clone(),
            geolocation,
        ));
        let notification_service = Arc::new(NotificationService::new(
            integrations.email,
            repositories.profiles.clone(),
            settings_service.clone(),
            audit_service.clone(),
            &config,
        ));
        let role_sync_service = Arc::new(RoleSyncService::new(
            repositories.profiles.clone(),
            profile_service.clone(),
            audit_service.clone(),
        ));
        let approval_service = Arc::new(ApprovalService::new(
            repositories.profiles.clone(),
            audit_service.clone(),
        ));
        let analytics_service = Arc::new(AnalyticsService::new(repositories.analytics.clone()));

        Self {
            jwt_service: JwtService::new(&config.backend_jwt_secret),
            config: Arc::new(config),
            backend,
            settings_service,
            audit_service,
            quiz_service,
            analysis_service,
            profile_service,
            demographics_service,
            notification_service,
            role_sync_service,
            approval_service,
            analytics_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_cloneable() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn missing_ai_key_leaves_analysis_unconfigured() {
        let integrations = Integrations::from_config(&Config::test_config()).unwrap();
        assert!(integrations.analysis.is_none());
    }
}
