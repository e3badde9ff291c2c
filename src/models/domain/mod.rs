pub mod analysis;
pub mod analytics;
pub mod audit_log;
pub mod demographics;
pub mod quiz_question;
pub mod quiz_result;
pub mod settings;
pub mod user;
pub use analysis::GiftAnalysis;
pub use audit_log::{AuditAction, AuditLogEntry, NewAuditEntry};
pub use demographics::{DemographicsRecord, GeoLocation};
pub use quiz_question::{Answer, Gift, QuizQuestion};
pub use quiz_result::{QuizResult, QuizSession, RankedGift};
pub use settings::AppSettings;
pub use user::{UserProfile, UserRole};
