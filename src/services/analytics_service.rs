use std::sync::Arc;

use validator::Validate;

use crate::{
    backend::Access,
    errors::AppResult,
    models::{domain::analytics::AnalyticsReport, dto::request::AnalyticsQuery},
    repositories::AnalyticsRepository,
};

pub struct AnalyticsService {
    repository: Arc<dyn AnalyticsRepository>,
}

impl AnalyticsService {
    pub fn new(repository: Arc<dyn AnalyticsRepository>) -> Self {
        Self { repository }
    }

    pub async fn report(&self, query: &AnalyticsQuery, access: &Access) -> AppResult<AnalyticsReport> {
        query.validate()?;

        let gift_distribution = self
            .repository
            .gift_distribution(query.start, query.end, access)
            .await?;
        let statistics = self
            .repository
            .quiz_statistics(query.start, query.end, access)
            .await?;
        let demographics = self.repository.demographics_summary(access).await?;

        Ok(AnalyticsReport {
            gift_distribution,
            completion_rate: statistics.completion_rate(),
            statistics,
            demographics,
        })
    }
}
