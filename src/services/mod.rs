pub mod analysis_service;
pub mod analytics_service;
pub mod approval_service;
pub mod audit_service;
pub mod demographics_service;
pub mod geolocation;
pub mod notification_service;
pub mod profile_service;
pub mod quiz_service;
pub mod role_sync_service;
pub mod scoring;
pub mod settings_service;
