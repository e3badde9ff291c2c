use std::{fmt, str::FromStr};

use async_graphql::{Enum, SimpleObject};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Manager,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Manager => "manager",
            UserRole::Admin => "admin",
        }
    }

    /// Lenient parse used for stored profile data; unknown labels are plain users.
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "manager" => Ok(UserRole::Manager),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, SimpleObject)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// How long after account creation an approved user may still announce the signup.
pub const SIGNUP_NOTICE_WINDOW_HOURS: i64 = 24;

impl UserProfile {
    /// Still pending approval, or created within the notice window.
    pub fn may_announce_signup(&self, now: DateTime<Utc>) -> bool {
        if !self.approved {
            return true;
        }
        self.created_at
            .is_some_and(|created| now - created < Duration::hours(SIGNUP_NOTICE_WINDOW_HOURS))
    }

    pub fn has_location(&self) -> bool {
        self.country
            .as_deref()
            .is_some_and(|c| !c.is_empty() && c != "Unknown")
    }
}

#[cfg(test)]
impl UserProfile {
    pub fn test_profile(id: &str, role: UserRole) -> Self {
        UserProfile {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            full_name: None,
            role,
            approved: true,
            locale: Some("en".to_string()),
            country: None,
            region: None,
            city: None,
            created_at: Some(Utc::now()),
        }
    }
}
