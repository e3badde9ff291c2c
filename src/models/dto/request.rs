use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct StartSessionRequest {
    #[validate(length(min = 2, max = 10))]
    pub locale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct AnswerInput {
    #[validate(length(min = 1, max = 64))]
    pub question_id: String,

    #[validate(range(min = 0, max = 5, message = "Answer value must be between 0 and 5"))]
    pub value: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAnswersRequest {
    #[validate(length(min = 1, max = 500), nested)]
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DemographicsRequest {
    /// ISO date, `YYYY-MM-DD`.
    pub birth_date: Option<String>,

    pub birth_year: Option<i32>,

    #[validate(length(max = 50))]
    pub gender: Option<String>,

    #[validate(length(max = 100))]
    pub denomination: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

impl DemographicsRequest {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AutoGeolocationRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    #[serde(default)]
    pub force: bool,
}

impl AutoGeolocationRequest {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RoleSyncRequest {
    #[validate(length(min = 1, max = 64))]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApprovalDecisionRequest {
    pub approved: bool,

    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_date_range"))]
pub struct AnalyticsQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

fn validate_date_range(query: &AnalyticsQuery) -> Result<(), ValidationError> {
    match (query.start, query.end) {
        (Some(start), Some(end)) if start > end => {
            let mut err = ValidationError::new("date_range");
            err.message = Some("start must not be after end".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaginationParams {
    #[validate(range(min = 0))]
    pub offset: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            offset: Some(0),
            limit: Some(20),
        }
    }
}

impl PaginationParams {
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AuditLogQuery {
    #[validate(range(min = 0))]
    pub offset: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,

    #[validate(length(min = 1, max = 64))]
    pub action: Option<String>,
}

impl AuditLogQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            offset: self.offset,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewSignup,
    PendingApproval,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdminNotificationRequest {
    pub kind: NotificationKind,

    #[validate(email)]
    pub email: String,

    #[validate(length(max = 200))]
    pub name: Option<String>,

    pub locale: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthCallbackParams {
    pub code: Option<String>,
    pub next: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn answer_values_are_bounded() {
        let ok = AnswerInput {
            question_id: "q1".to_string(),
            value: 5,
        };
        assert!(ok.validate().is_ok());

        let too_high = AnswerInput {
            question_id: "q1".to_string(),
            value: 6,
        };
        assert!(too_high.validate().is_err());
    }

    #[test]
    fn submit_requires_at_least_one_valid_answer() {
        let empty = SubmitAnswersRequest { answers: vec![] };
        assert!(empty.validate().is_err());

        let nested_invalid = SubmitAnswersRequest {
            answers: vec![AnswerInput {
                question_id: String::new(),
                value: 3,
            }],
        };
        assert!(nested_invalid.validate().is_err());
    }

    #[test]
    fn analytics_range_must_be_ordered() {
        let query = AnalyticsQuery {
            start: NaiveDate::from_ymd_opt(2024, 5, 1),
            end: NaiveDate::from_ymd_opt(2024, 4, 1),
        };
        assert!(query.validate().is_err());

        let open_ended = AnalyticsQuery {
            start: NaiveDate::from_ymd_opt(2024, 5, 1),
            end: None,
        };
        assert!(open_ended.validate().is_ok());
    }

    #[test]
    fn pagination_is_clamped() {
        let params = PaginationParams {
            offset: Some(-5),
            limit: Some(1000),
        };
        assert_eq!(params.offset(), 0);
        assert_eq!(params.limit(), 100);
        assert_eq!(PaginationParams::default().limit(), 20);
    }

    #[test]
    fn coordinates_need_both_axes() {
        let request = DemographicsRequest {
            latitude: Some(38.7),
            ..Default::default()
        };
        assert!(request.coordinates().is_none());

        let request = DemographicsRequest {
            latitude: Some(38.7),
            longitude: Some(-9.1),
            ..Default::default()
        };
        assert_eq!(request.coordinates(), Some((38.7, -9.1)));
    }
}
