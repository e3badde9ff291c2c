use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::json;

use crate::{
    backend::Access,
    config::Config,
    errors::{AppError, AppResult},
    i18n::Locale,
    models::{
        domain::{AuditAction, NewAuditEntry},
        dto::response::NotificationOutcome,
    },
    repositories::ProfileRepository,
    services::{audit_service::AuditService, settings_service::SettingsService},
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// False when no email API is configured; sends are then skipped.
    fn is_configured(&self) -> bool;
    async fn send(&self, message: &EmailMessage) -> AppResult<()>;
}

/// Transactional email API taking `{from, to, subject, html}` with a bearer key.
pub struct HttpEmailSender {
    http: reqwest::Client,
    api_url: Option<String>,
    api_key: Option<SecretString>,
}

impl HttpEmailSender {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_url: config.email_api_url.clone(),
            api_key: config.email_api_key.clone(),
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    fn is_configured(&self) -> bool {
        self.api_url.is_some() && self.api_key.is_some()
    }

    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        let (Some(url), Some(key)) = (&self.api_url, &self.api_key) else {
            return Err(AppError::InternalError("Email API is not configured".to_string()));
        };

        let response = self
            .http
            .post(url)
            .bearer_auth(key.expose_secret())
            .json(message)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Email send failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceError(format!(
                "Email API returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NotificationEvent {
    NewSignup { email: String, name: Option<String> },
    PendingApproval { email: String, name: Option<String> },
}

impl NotificationEvent {
    fn user(&self) -> (&str, Option<&str>) {
        match self {
            NotificationEvent::NewSignup { email, name }
            | NotificationEvent::PendingApproval { email, name } => (email, name.as_deref()),
        }
    }

    pub fn subject(&self, locale: Locale) -> String {
        let (email, _) = self.user();
        match (self, locale) {
            (NotificationEvent::NewSignup { .. }, Locale::En) => format!("New user signup: {}", email),
            (NotificationEvent::NewSignup { .. }, Locale::Es) => {
                format!("Nuevo registro de usuario: {}", email)
            }
            (NotificationEvent::NewSignup { .. }, Locale::Pt) => {
                format!("Novo cadastro de usuário: {}", email)
            }
            (NotificationEvent::PendingApproval { .. }, Locale::En) => {
                format!("User awaiting approval: {}", email)
            }
            (NotificationEvent::PendingApproval { .. }, Locale::Es) => {
                format!("Usuario pendiente de aprobación: {}", email)
            }
            (NotificationEvent::PendingApproval { .. }, Locale::Pt) => {
                format!("Usuário aguardando aprovação: {}", email)
            }
        }
    }

    fn body(&self, locale: Locale, site_url: &str) -> String {
        let (email, name) = self.user();
        let who = match name {
            Some(name) => format!("{} &lt;{}&gt;", escape_html(name), escape_html(email)),
            None => escape_html(email),
        };
        let admin_url = format!("{}/{}/admin", site_url, locale);

        let intro = match (self, locale) {
            (NotificationEvent::NewSignup { .. }, Locale::En) => "A new user has signed up:",
            (NotificationEvent::NewSignup { .. }, Locale::Es) => "Un nuevo usuario se ha registrado:",
            (NotificationEvent::NewSignup { .. }, Locale::Pt) => "Um novo usuário se cadastrou:",
            (NotificationEvent::PendingApproval { .. }, Locale::En) => {
                "A user is waiting for approval:"
            }
            (NotificationEvent::PendingApproval { .. }, Locale::Es) => {
                "Un usuario está esperando aprobación:"
            }
            (NotificationEvent::PendingApproval { .. }, Locale::Pt) => {
                "Um usuário está aguardando aprovação:"
            }
        };

        format!(
            "<p>{}</p><p><strong>{}</strong></p><p><a href=\"{}\">{}</a></p>",
            intro, who, admin_url, admin_url
        )
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub struct NotificationService {
    sender: Arc<dyn EmailSender>,
    profiles: Arc<dyn ProfileRepository>,
    settings: Arc<SettingsService>,
    audit: Arc<AuditService>,
    from: String,
    site_url: String,
}

impl NotificationService {
    pub fn new(
        sender: Arc<dyn EmailSender>,
        profiles: Arc<dyn ProfileRepository>,
        settings: Arc<SettingsService>,
        audit: Arc<AuditService>,
        config: &Config,
    ) -> Self {
        Self {
            sender,
            profiles,
            settings,
            audit,
            from: config.email_from.clone(),
            site_url: config.site_url.clone(),
        }
    }

    /// Emails every admin about `event`. Individual send failures are logged
    /// and counted out of `sent`; an unconfigured email API or disabled
    /// signup notifications report `skipped`.
    pub async fn notify_admins(
        &self,
        event: &NotificationEvent,
        locale: Locale,
        actor_id: &str,
    ) -> AppResult<NotificationOutcome> {
        let settings = self.settings.get_settings().await;
        if matches!(event, NotificationEvent::NewSignup { .. })
            && !settings.registration.notify_admins_on_signup
        {
            log::debug!("Signup notifications disabled in settings");
            return Ok(skipped(0));
        }

        let recipients = self.profiles.get_admin_emails().await?;

        if !self.sender.is_configured() {
            log::warn!("Email API not configured; skipping admin notification");
            return Ok(skipped(recipients.len()));
        }

        let subject = event.subject(locale);
        let html = event.body(locale, &self.site_url);
        let mut sent = 0;

        for recipient in &recipients {
            let message = EmailMessage {
                from: self.from.clone(),
                to: vec![recipient.clone()],
                subject: subject.clone(),
                html: html.clone(),
            };
            match self.sender.send(&message).await {
                Ok(()) => sent += 1,
                Err(e) => log::warn!("Failed to notify {}: {}", recipient, e),
            }
        }

        log::info!("Admin notification sent to {}/{} admins", sent, recipients.len());

        self.audit
            .record(
                NewAuditEntry::new(actor_id, AuditAction::AdminNotificationSent)
                    .with_details(json!({ "subject": subject, "sent": sent })),
                &Access::Service,
            )
            .await;

        Ok(NotificationOutcome {
            sent,
            skipped: false,
            recipients: recipients.len(),
        })
    }
}

fn skipped(recipients: usize) -> NotificationOutcome {
    NotificationOutcome {
        sent: 0,
        skipped: true,
        recipients,
    }
}
