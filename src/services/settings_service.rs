use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::{
    backend::Access,
    errors::{AppError, AppResult},
    models::domain::{
        settings::{merge_settings, merge_values},
        AppSettings, AuditAction, NewAuditEntry,
    },
    repositories::SettingsRepository,
    services::audit_service::AuditService,
};

struct CachedSettings {
    settings: AppSettings,
    /// Raw stored overrides, kept so updates merge onto what is persisted.
    overrides: Value,
    loaded_at: Instant,
}

pub struct SettingsService {
    repository: Arc<dyn SettingsRepository>,
    audit: Arc<AuditService>,
    cache: RwLock<Option<CachedSettings>>,
    ttl: Duration,
}

impl SettingsService {
    pub fn new(
        repository: Arc<dyn SettingsRepository>,
        audit: Arc<AuditService>,
        ttl: Duration,
    ) -> Self {
        Self {
            repository,
            audit,
            cache: RwLock::new(None),
            ttl,
        }
    }

    /// Effective settings. Served from cache while fresh; a failed read
    /// yields the defaults without caching them.
    pub async fn get_settings(&self) -> AppSettings {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if cached.loaded_at.elapsed() < self.ttl {
                return cached.settings.clone();
            }
        }

        match self.load().await {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Failed to load settings, serving defaults: {}", e);
                AppSettings::default()
            }
        }
    }

    async fn load(&self) -> AppResult<AppSettings> {
        let overrides = self.repository.get_settings().await?.unwrap_or(Value::Null);
        let settings = merge_settings(&AppSettings::default(), &overrides);

        *self.cache.write().await = Some(CachedSettings {
            settings: settings.clone(),
            overrides,
            loaded_at: Instant::now(),
        });

        Ok(settings)
    }

    /// Applies a partial patch on top of the stored overrides, persists it and
    /// drops the cache.
    pub async fn update_settings(
        &self,
        patch: &Value,
        actor_id: &str,
        access: &Access,
    ) -> AppResult<AppSettings> {
        if !patch.is_object() {
            return Err(AppError::ValidationError(
                "Settings patch must be a JSON object".to_string(),
            ));
        }

        let mut overrides = self.current_overrides().await?;
        if !overrides.is_object() {
            overrides = json!({});
        }
        merge_values(&mut overrides, patch);

        // Reject patches that do not fit the settings shape instead of
        // silently falling back to defaults on the next read.
        let mut candidate = serde_json::to_value(AppSettings::default())?;
        merge_values(&mut candidate, &overrides);
        let merged: AppSettings = serde_json::from_value(candidate)
            .map_err(|e| AppError::ValidationError(format!("Invalid settings: {}", e)))?;
        validate_settings(&merged)?;

        self.repository
            .save_settings(&overrides, actor_id, access)
            .await?;
        self.clear_cache().await;

        self.audit
            .record(
                NewAuditEntry::new(actor_id, AuditAction::SettingsUpdated)
                    .with_details(json!({ "patch": patch })),
                access,
            )
            .await;

        log::info!("Settings updated by {}", actor_id);
        Ok(merged)
    }

    async fn current_overrides(&self) -> AppResult<Value> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if cached.loaded_at.elapsed() < self.ttl {
                return Ok(cached.overrides.clone());
            }
        }
        Ok(self.repository.get_settings().await?.unwrap_or(Value::Null))
    }

    pub async fn clear_cache(&self) {
        *self.cache.write().await = None;
    }
}

fn validate_settings(settings: &AppSettings) -> AppResult<()> {
    if settings.quiz.top_gifts_count == 0 {
        return Err(AppError::ValidationError(
            "quiz.top_gifts_count must be at least 1".to_string(),
        ));
    }
    if settings.quiz.questions_per_page == 0 {
        return Err(AppError::ValidationError(
            "quiz.questions_per_page must be at least 1".to_string(),
        ));
    }
    if !crate::i18n::is_supported(&settings.general.default_locale) {
        return Err(AppError::ValidationError(format!(
            "Unsupported default locale '{}'",
            settings.general.default_locale
        )));
    }
    Ok(())
}
