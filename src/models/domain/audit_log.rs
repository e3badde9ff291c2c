use std::fmt;

use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    SettingsUpdated,
    SettingsCacheCleared,
    UserApproved,
    UserRejected,
    RoleSynced,
    AdminNotificationSent,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::SettingsUpdated => "settings_updated",
            AuditAction::SettingsCacheCleared => "settings_cache_cleared",
            AuditAction::UserApproved => "user_approved",
            AuditAction::UserRejected => "user_rejected",
            AuditAction::RoleSynced => "role_synced",
            AuditAction::AdminNotificationSent => "admin_notification_sent",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry to be written through `log_admin_action`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewAuditEntry {
    pub actor_id: String,
    pub action: AuditAction,
    pub target_id: Option<String>,
    pub details: Value,
}

impl NewAuditEntry {
    pub fn new(actor_id: &str, action: AuditAction) -> Self {
        NewAuditEntry {
            actor_id: actor_id.to_string(),
            action,
            target_id: None,
            details: Value::Null,
        }
    }

    pub fn with_target(mut self, target_id: &str) -> Self {
        self.target_id = Some(target_id.to_string());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// Stored audit row. `action` stays a string so rows written by older
/// clients still load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct AuditLogEntry {
    pub id: String,
    pub actor_id: Option<String>,
    #[serde(default)]
    pub actor_email: Option<String>,
    pub action: String,
    #[serde(default)]
    pub target_id: Option<String>,
    #[graphql(skip)]
    #[serde(default)]
    pub details: Value,
    pub created_at: DateTime<Utc>,
}
