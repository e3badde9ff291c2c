use async_graphql::SimpleObject;
use serde::Serialize;

use crate::{
    auth::permissions::Permissions,
    i18n::Locale,
    models::domain::{GeoLocation, UserProfile, UserRole},
};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        ApiResponse {
            data,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationMetadata {
    pub offset: i64,
    pub limit: i64,
    pub count: usize,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: PaginationMetadata,
}

impl<T: Serialize> PaginatedResponse<T> {
    /// `has_more` is a guess from a full page; the backend returns no total.
    pub fn from_page(items: Vec<T>, offset: i64, limit: i64) -> Self {
        let count = items.len();
        PaginatedResponse {
            items,
            pagination: PaginationMetadata {
                offset,
                limit,
                count,
                has_more: count as i64 >= limit,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct MeResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub profile: Option<UserProfile>,
    pub role: UserRole,
    pub permissions: Permissions,
}

#[derive(Debug, Clone, Serialize)]
pub struct DemographicsStatus {
    pub has_demographics: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoGeolocationOutcome {
    /// False when the profile already had a location or nothing resolved.
    pub updated: bool,
    pub location: GeoLocation,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionCreated {
    pub session_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationOutcome {
    pub sent: usize,
    pub skipped: bool,
    pub recipients: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleSyncResponse {
    pub user_id: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicConfig {
    pub site_url: String,
    pub measurement_id: Option<String>,
    pub locales: Vec<&'static str>,
    pub default_locale: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageUser {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: UserRole,
}

/// Data the server-rendered shell needs for a localized page.
#[derive(Debug, Clone, Serialize)]
pub struct PageContext {
    pub locale: Locale,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PageUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
}
