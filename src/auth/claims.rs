use serde::{Deserialize, Serialize};

use crate::models::domain::UserRole;

/// Claims carried by a session token issued by the managed auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (auth user id)
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub aud: Option<String>,
    #[serde(default)]
    pub app_metadata: AppMetadata,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
}

/// Server-controlled metadata. `role` is written by role sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

impl Claims {
    /// Role recorded in the session, if role sync has run for this user.
    pub fn session_role(&self) -> Option<UserRole> {
        self.app_metadata.role.as_deref().map(UserRole::from_label)
    }

    pub fn role_or_default(&self) -> UserRole {
        self.session_role().unwrap_or_default()
    }

    pub fn full_name(&self) -> Option<String> {
        self.user_metadata
            .get("full_name")
            .or_else(|| self.user_metadata.get("name"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}
