pub mod analytics_repository;
pub mod audit_repository;
pub mod demographics_repository;
pub mod profile_repository;
pub mod quiz_repository;
pub mod settings_repository;

pub use analytics_repository::{AnalyticsRepository, RpcAnalyticsRepository};
pub use audit_repository::{AuditRepository, RpcAuditRepository};
pub use demographics_repository::{DemographicsRepository, RpcDemographicsRepository};
pub use profile_repository::{ProfileRepository, RpcProfileRepository};
pub use quiz_repository::{QuizRepository, RpcQuizRepository};
pub use settings_repository::{RpcSettingsRepository, SettingsRepository};
